//! RGB colors
//!
//! The wire format carries no alpha; callers clamp component values before
//! a color reaches the encoder.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChromaError;

/// A single 24-bit color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const BLACK: RgbColor = RgbColor::new(0, 0, 0);
    pub const WHITE: RgbColor = RgbColor::new(255, 255, 255);
    pub const RED: RgbColor = RgbColor::new(255, 0, 0);
    pub const GREEN: RgbColor = RgbColor::new(0, 255, 0);
    pub const BLUE: RgbColor = RgbColor::new(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from unbounded components, clamping each to 0..=255
    pub fn clamped(r: i32, g: i32, b: i32) -> Self {
        Self {
            r: r.clamp(0, 255) as u8,
            g: g.clamp(0, 255) as u8,
            b: b.clamp(0, 255) as u8,
        }
    }

    /// `#rrggbb`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Look up one of the named presets
    pub fn preset(name: &str) -> Option<Self> {
        PRESETS
            .iter()
            .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
            .map(|(_, color)| *color)
    }

    /// Names accepted by [`RgbColor::preset`]
    pub fn preset_names() -> impl Iterator<Item = &'static str> {
        PRESETS.iter().map(|(name, _)| *name)
    }
}

/// Named colors accepted on the command line
const PRESETS: &[(&str, RgbColor)] = &[
    ("red", RgbColor::new(255, 0, 0)),
    ("green", RgbColor::new(0, 255, 0)),
    ("blue", RgbColor::new(0, 0, 255)),
    ("white", RgbColor::new(255, 255, 255)),
    ("purple", RgbColor::new(128, 0, 128)),
    ("cyan", RgbColor::new(0, 255, 255)),
    ("yellow", RgbColor::new(255, 255, 0)),
    ("orange", RgbColor::new(255, 165, 0)),
    ("off", RgbColor::new(0, 0, 0)),
];

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGB({}, {}, {})", self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for RgbColor {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

impl FromStr for RgbColor {
    type Err = ChromaError;

    /// Accepts a preset name, `#rrggbb` / `rrggbb`, or `r,g,b`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(color) = Self::preset(s) {
            return Ok(color);
        }

        if s.contains(',') {
            let parts: Vec<&str> = s.split(',').map(str::trim).collect();
            if parts.len() != 3 {
                return Err(ChromaError::InvalidColor(format!(
                    "expected three components in '{}'",
                    s
                )));
            }
            let mut components = [0i32; 3];
            for (slot, part) in components.iter_mut().zip(&parts) {
                *slot = part
                    .parse()
                    .map_err(|_| ChromaError::InvalidColor(format!("bad component '{}'", part)))?;
            }
            return Ok(Self::clamped(components[0], components[1], components[2]));
        }

        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let channel = |i: usize| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .map_err(|e| ChromaError::InvalidColor(e.to_string()))
            };
            return Ok(Self::new(channel(0)?, channel(2)?, channel(4)?));
        }

        Err(ChromaError::InvalidColor(format!("unrecognized color '{}'", s)))
    }
}
