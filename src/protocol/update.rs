//! Outbound update payloads
//!
//! Builders for the controller-mutating commands. None of these commands
//! gets a response from the server.
//!
//! ```text
//! UPDATELEDS:  device_id (4) | count (2) | count × [r, g, b, 0xFF]
//! RESIZEZONE:  device_id (4) | zone_id (4) | new_size (4)
//! UPDATEMODE:  device_id (4) | mode_index (4) | record_len (4) | record
//! ```

use bytes::BufMut;

use crate::color::RgbColor;
use crate::device::Mode;
use crate::error::{ChromaError, Result};

/// Brightness byte sent with every LED color
pub const LED_BRIGHTNESS: u8 = 0xFF;

/// Build an UPDATELEDS payload
///
/// Length is always `4 + 2 + 4 * colors.len()`. Components are written as
/// given; callers clamp beforehand.
pub fn build_update_leds(device_id: u32, colors: &[RgbColor]) -> Result<Vec<u8>> {
    let count = u16::try_from(colors.len()).map_err(|_| ChromaError::TooManyLeds(colors.len()))?;

    let mut payload = Vec::with_capacity(update_leds_len(colors.len()));
    payload.put_u32_le(device_id);
    payload.put_u16_le(count);
    for color in colors {
        payload.put_slice(&[color.r, color.g, color.b, LED_BRIGHTNESS]);
    }

    Ok(payload)
}

/// Payload length of an UPDATELEDS carrying `led_count` colors
pub fn update_leds_len(led_count: usize) -> usize {
    4 + 2 + 4 * led_count
}

/// Build a RESIZEZONE payload
pub fn build_resize_zone(device_id: u32, zone_id: u32, new_size: u32) -> Vec<u8> {
    let mut payload = Vec::with_capacity(12);
    payload.put_u32_le(device_id);
    payload.put_u32_le(zone_id);
    payload.put_u32_le(new_size);
    payload
}

/// Build an UPDATEMODE payload, echoing the mode record as the server sent it
pub fn build_update_mode(device_id: u32, mode_index: u32, mode: &Mode) -> Vec<u8> {
    let record = mode.raw();

    let mut payload = Vec::with_capacity(12 + record.len());
    payload.put_u32_le(device_id);
    payload.put_u32_le(mode_index);
    payload.put_u32_le(record.len() as u32);
    payload.put_slice(record);
    payload
}
