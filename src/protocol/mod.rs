//! Protocol Module
//!
//! Defines the OpenRGB SDK wire protocol as used by this client.
//!
//! ## Packet Format
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────┬──────────────────┐
//! │ Len (4)  │ Ver (4)  │ Cmd (4)  │ Rsvd (4) │     Payload      │
//! └──────────┴──────────┴──────────┴──────────┴──────────────────┘
//! ```
//!
//! ### Commands
//! - 0:    REQUEST_CONTROLLER_COUNT  - Response: u32 count
//! - 1:    REQUEST_CONTROLLER_DATA   - Payload: u32 id, Response: descriptor
//! - 40:   REQUEST_PROTOCOL_VERSION  - Response: u32 version
//! - 50:   SET_CLIENT_NAME           - Payload: name bytes
//! - 1000: RGBCONTROLLER_RESIZEZONE  - Payload: id, zone, size
//! - 1101: RGBCONTROLLER_UPDATELEDS  - Payload: id, count, colors
//! - 1102: RGBCONTROLLER_UPDATEMODE  - Payload: id, mode index, mode record

mod command;
mod codec;
mod update;

pub use command::CommandId;
pub use codec::{
    decode, decode_header, decode_u32, encode, read_exact_payload, read_packet, write_packet,
    Header, Packet, HEADER_SIZE, MAX_PAYLOAD_SIZE, PROTOCOL_VERSION,
};
pub use update::{
    build_resize_zone, build_update_leds, build_update_mode, update_leds_len, LED_BRIGHTNESS,
};
