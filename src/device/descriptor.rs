//! Controller descriptor decoding
//!
//! ## Descriptor Layout (all integers little-endian)
//! ```text
//! name_len (2) | name
//! device_type (4)
//! mode_count (2) | mode_count × [ record_len (4) | name_len (2) | name | params ]
//! zone_count (2) | zone_count × [ name_len (2) | name | zone_type (4) |
//!                                 start (4) | led_count (4) | min (4) | max (4) ]
//! led_count (2)  | led_count  × [ name_len (2) | name | has_color (1) | rgbx (4)? ]
//! ```
//!
//! Every variable-length field is consumed by its own length prefix. Mode
//! records are skipped by `record_len` whatever their contents.

use bytes::{Buf, BufMut};

use crate::color::RgbColor;
use crate::error::{ChromaError, ParseError, Result};

use super::{Device, DeviceType, Led, Mode, Zone, ZoneType};

/// Sequential reader that reports truncation instead of panicking
struct FieldReader<'a> {
    buf: &'a [u8],
}

impl<'a> FieldReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn ensure(&self, field: &'static str, needed: usize) -> std::result::Result<(), ParseError> {
        if self.buf.remaining() < needed {
            return Err(ParseError::TruncatedField {
                field,
                needed,
                available: self.buf.remaining(),
            });
        }
        Ok(())
    }

    fn u8(&mut self, field: &'static str) -> std::result::Result<u8, ParseError> {
        self.ensure(field, 1)?;
        Ok(self.buf.get_u8())
    }

    fn u16(&mut self, field: &'static str) -> std::result::Result<u16, ParseError> {
        self.ensure(field, 2)?;
        Ok(self.buf.get_u16_le())
    }

    fn u32(&mut self, field: &'static str) -> std::result::Result<u32, ParseError> {
        self.ensure(field, 4)?;
        Ok(self.buf.get_u32_le())
    }

    fn bytes(&mut self, field: &'static str, len: usize) -> std::result::Result<&'a [u8], ParseError> {
        self.ensure(field, len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// u16 length prefix followed by that many bytes
    fn string(&mut self, field: &'static str) -> std::result::Result<String, ParseError> {
        let len = self.u16(field)? as usize;
        let raw = self.bytes(field, len)?;
        Ok(decode_name(raw))
    }

    fn remaining(&self) -> usize {
        self.buf.remaining()
    }
}

/// Names are NUL-terminated on some servers; tolerate both
fn decode_name(raw: &[u8]) -> String {
    let trimmed = match raw.iter().rposition(|&b| b != 0) {
        Some(last) => &raw[..=last],
        None => &[],
    };
    String::from_utf8_lossy(trimmed).into_owned()
}

// =============================================================================
// Decoding
// =============================================================================

/// Parse a REQUEST_CONTROLLER_DATA payload into a device
pub fn parse_device(id: u32, payload: &[u8]) -> Result<Device> {
    let mut reader = FieldReader::new(payload);

    let name = reader.string("device name")?;
    let device_type = DeviceType::try_from(reader.u32("device type")?)?;

    let mode_count = reader.u16("mode count")?;
    let mut modes = Vec::with_capacity(mode_count as usize);
    for _ in 0..mode_count {
        modes.push(parse_mode(&mut reader)?);
    }

    let zone_count = reader.u16("zone count")?;
    let mut zones = Vec::with_capacity(zone_count as usize);
    for _ in 0..zone_count {
        zones.push(parse_zone(&mut reader)?);
    }

    let led_count = reader.u16("led count")?;
    let mut leds = Vec::with_capacity(led_count as usize);
    for _ in 0..led_count {
        leds.push(parse_led(&mut reader)?);
    }

    if reader.remaining() > 0 {
        tracing::debug!(
            "Device {} descriptor has {} trailing bytes, ignored",
            id,
            reader.remaining()
        );
    }

    let device = Device {
        id,
        name,
        device_type,
        modes,
        zones,
        leds,
    };
    device.validate_zones()?;

    Ok(device)
}

fn parse_mode(reader: &mut FieldReader<'_>) -> std::result::Result<Mode, ParseError> {
    let record_len = reader.u32("mode record length")? as usize;
    let record = reader.bytes("mode record", record_len)?;

    // The name lives inside the record; a bad one cannot push us off the next record
    let mut inner = FieldReader::new(record);
    let name = inner.string("mode name")?;
    let params_offset = record_len - inner.remaining();

    Ok(Mode::from_record(name, record.to_vec(), params_offset))
}

fn parse_zone(reader: &mut FieldReader<'_>) -> std::result::Result<Zone, ParseError> {
    let name = reader.string("zone name")?;
    let zone_type = ZoneType::try_from(reader.u32("zone type")?)?;
    let start_index = reader.u32("zone start")?;
    let led_count = reader.u32("zone led count")?;
    let leds_min = reader.u32("zone leds min")?;
    let leds_max = reader.u32("zone leds max")?;

    Ok(Zone {
        name,
        zone_type,
        start_index,
        led_count,
        leds_min,
        leds_max,
    })
}

fn parse_led(reader: &mut FieldReader<'_>) -> std::result::Result<Led, ParseError> {
    let name = reader.string("led name")?;
    let color = if reader.u8("led color flag")? != 0 {
        let rgbx = reader.bytes("led color", 4)?;
        RgbColor::new(rgbx[0], rgbx[1], rgbx[2])
    } else {
        RgbColor::BLACK
    };

    Ok(Led { name, color })
}

// =============================================================================
// Encoding
// =============================================================================

/// Length of a u16-prefixed field, rejecting anything the prefix cannot hold
pub(crate) fn wire_len(field: &'static str, len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| ChromaError::FieldTooLong { field, len })
}

fn put_name(buf: &mut Vec<u8>, field: &'static str, name: &str) -> Result<()> {
    buf.put_u16_le(wire_len(field, name.len())?);
    buf.put_slice(name.as_bytes());
    Ok(())
}

/// Encode a device into descriptor bytes (inverse of [`parse_device`])
///
/// LED colors are always written with the color flag set. Names and lists
/// longer than a u16 prefix allows are rejected with `FieldTooLong`.
pub fn encode_device(device: &Device) -> Result<Vec<u8>> {
    let mut buf = Vec::new();

    put_name(&mut buf, "device name", &device.name)?;
    buf.put_u32_le(device.device_type.code());

    buf.put_u16_le(wire_len("mode count", device.modes.len())?);
    for mode in &device.modes {
        buf.put_u32_le(mode.raw().len() as u32);
        buf.put_slice(mode.raw());
    }

    buf.put_u16_le(wire_len("zone count", device.zones.len())?);
    for zone in &device.zones {
        put_name(&mut buf, "zone name", &zone.name)?;
        buf.put_u32_le(zone.zone_type.code());
        buf.put_u32_le(zone.start_index);
        buf.put_u32_le(zone.led_count);
        buf.put_u32_le(zone.leds_min);
        buf.put_u32_le(zone.leds_max);
    }

    buf.put_u16_le(wire_len("led count", device.leds.len())?);
    for led in &device.leds {
        put_name(&mut buf, "led name", &led.name)?;
        buf.put_u8(1);
        buf.put_slice(&[led.color.r, led.color.g, led.color.b, 0]);
    }

    Ok(buf)
}
