//! Device Module
//!
//! Structured model of the controllers exposed by the server, plus the
//! descriptor parser and the per-session directory that caches them.
//!
//! ## Model
//! ```text
//! Device ──┬── modes: [Mode]   (opaque, kept for UPDATEMODE)
//!          ├── zones: [Zone]   (contiguous, non-overlapping LED ranges)
//!          └── leds:  [Led]    (name + last known color)
//! ```
//!
//! Device ids are server indexes, valid for one connection only.

mod descriptor;
mod directory;

pub use descriptor::{encode_device, parse_device};
pub use directory::DeviceDirectory;

use std::ops::Range;

use serde::Serialize;

use crate::color::RgbColor;
use crate::error::ParseError;

/// Kind of controller, as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u32)]
pub enum DeviceType {
    Motherboard = 0,
    Dram = 1,
    Gpu = 2,
    Cooler = 3,
    LedStrip = 4,
    Keyboard = 5,
    Mouse = 6,
    MouseMat = 7,
    Headset = 8,
    HeadsetStand = 9,
    Gamepad = 10,
    Light = 11,
    Speaker = 12,
    Virtual = 13,
    Storage = 14,
    Case = 15,
    Microphone = 16,
    Accessory = 17,
    Keypad = 18,
    Unknown = 19,
}

impl DeviceType {
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for DeviceType {
    type Error = ParseError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        use DeviceType::*;

        const ALL: [DeviceType; 20] = [
            Motherboard, Dram, Gpu, Cooler, LedStrip, Keyboard, Mouse, MouseMat, Headset,
            HeadsetStand, Gamepad, Light, Speaker, Virtual, Storage, Case, Microphone, Accessory,
            Keypad, Unknown,
        ];

        ALL.get(code as usize)
            .copied()
            .ok_or(ParseError::InvalidDeviceType(code))
    }
}

/// Layout of a zone's LEDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u32)]
pub enum ZoneType {
    Single = 0,
    Linear = 1,
    Matrix = 2,
}

impl ZoneType {
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for ZoneType {
    type Error = ParseError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ZoneType::Single),
            1 => Ok(ZoneType::Linear),
            2 => Ok(ZoneType::Matrix),
            other => Err(ParseError::InvalidZoneType(other)),
        }
    }
}

/// A device mode, kept as the server sent it
///
/// Only the name is decoded; the remaining parameters are carried verbatim
/// so the record can be echoed back with UPDATEMODE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mode {
    pub name: String,

    /// Full record body (name prefix included)
    #[serde(skip)]
    raw: Vec<u8>,

    /// Offset of the parameters inside `raw`
    #[serde(skip)]
    params_offset: usize,
}

impl Mode {
    pub(crate) fn from_record(name: String, raw: Vec<u8>, params_offset: usize) -> Self {
        Self {
            name,
            raw,
            params_offset,
        }
    }

    /// Build a mode record from a name and opaque parameters
    pub fn new(name: impl Into<String>, params: &[u8]) -> crate::Result<Self> {
        let name = name.into();
        let name_len = descriptor::wire_len("mode name", name.len())?;

        let mut raw = Vec::with_capacity(2 + name.len() + params.len());
        raw.extend_from_slice(&name_len.to_le_bytes());
        raw.extend_from_slice(name.as_bytes());
        let params_offset = raw.len();
        raw.extend_from_slice(params);

        Ok(Self {
            name,
            raw,
            params_offset,
        })
    }

    /// Opaque mode parameters
    pub fn params(&self) -> &[u8] {
        &self.raw[self.params_offset..]
    }

    /// Record body exactly as received
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn is_direct(&self) -> bool {
        self.name.eq_ignore_ascii_case("direct")
    }
}

/// A named, contiguous range of a device's LEDs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Zone {
    pub name: String,
    pub zone_type: ZoneType,
    pub start_index: u32,
    pub led_count: u32,
    pub leds_min: u32,
    pub leds_max: u32,
}

impl Zone {
    /// Indexes into `Device::leds` covered by this zone
    pub fn led_range(&self) -> Range<usize> {
        let start = self.start_index as usize;
        start..start + self.led_count as usize
    }

    pub fn resizable(&self) -> bool {
        self.leds_min != self.leds_max
    }
}

/// A single addressable LED
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Led {
    pub name: String,

    /// Last acknowledged color (or the server-reported one after discovery)
    pub color: RgbColor,
}

/// One controller and everything decoded from its descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub id: u32,
    pub name: String,
    pub device_type: DeviceType,
    pub modes: Vec<Mode>,
    pub zones: Vec<Zone>,
    pub leds: Vec<Led>,
}

impl Device {
    /// Name given to devices whose descriptor could not be parsed
    pub const PLACEHOLDER_NAME: &'static str = "unknown";

    /// Stand-in for a device whose descriptor failed to parse
    pub fn placeholder(id: u32) -> Self {
        Self {
            id,
            name: Self::PLACEHOLDER_NAME.to_string(),
            device_type: DeviceType::Unknown,
            modes: Vec::new(),
            zones: Vec::new(),
            leds: Vec::new(),
        }
    }

    pub fn zone(&self, zone_id: u32) -> Option<&Zone> {
        self.zones.get(zone_id as usize)
    }

    /// Index of the "Direct" mode, if the device has one
    pub fn direct_mode(&self) -> Option<(u32, &Mode)> {
        self.modes
            .iter()
            .enumerate()
            .find(|(_, mode)| mode.is_direct())
            .map(|(index, mode)| (index as u32, mode))
    }

    /// Current color of every LED, in order
    pub fn colors(&self) -> Vec<RgbColor> {
        self.leds.iter().map(|led| led.color).collect()
    }

    pub fn summary(&self) -> DeviceSummary {
        DeviceSummary {
            id: self.id,
            name: self.name.clone(),
            device_type: self.device_type,
            zone_count: self.zones.len(),
            led_count: self.leds.len(),
        }
    }

    /// Check that zones lie inside `leds` and do not overlap
    pub fn validate_zones(&self) -> Result<(), ParseError> {
        let mut ranges: Vec<(Range<usize>, &str)> = Vec::with_capacity(self.zones.len());

        for zone in &self.zones {
            let range = zone.led_range();
            if range.end > self.leds.len() {
                return Err(ParseError::ZoneOutOfRange {
                    zone: zone.name.clone(),
                    start: zone.start_index,
                    end: range.end as u32,
                    led_count: self.leds.len(),
                });
            }
            ranges.push((range, &zone.name));
        }

        // Empty zones cannot overlap anything
        ranges.retain(|(range, _)| !range.is_empty());
        ranges.sort_by_key(|(range, _)| range.start);

        for pair in ranges.windows(2) {
            let (first, first_name) = &pair[0];
            let (second, second_name) = &pair[1];
            if second.start < first.end {
                return Err(ParseError::ZoneOverlap {
                    first: first_name.to_string(),
                    second: second_name.to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Compact view of a device for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub id: u32,
    pub name: String,
    pub device_type: DeviceType,
    pub zone_count: usize,
    pub led_count: usize,
}
