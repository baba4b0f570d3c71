//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────┬──────────────────┐
//! │ Len (4)  │ Ver (4)  │ Cmd (4)  │ Rsvd (4) │     Payload      │
//! └──────────┴──────────┴──────────┴──────────┴──────────────────┘
//! ```
//! All integers little-endian. `Len` is the payload length only.

use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BufMut};

use crate::error::{ProtocolError, Result};

/// Header size: length + version + command + reserved
pub const HEADER_SIZE: usize = 16;

/// Protocol version written into every header
pub const PROTOCOL_VERSION: u32 = 1;

/// Maximum payload size accepted from the server (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Decoded packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub length: u32,
    pub protocol_version: u32,
    pub command_id: u32,
}

/// A complete packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub command_id: u32,
    pub payload: Vec<u8>,
}

// =============================================================================
// Packet Encoding/Decoding
// =============================================================================

/// Encode a packet to bytes
///
/// Format: header (16) + payload
pub fn encode(command_id: u32, payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.put_u32_le(payload.len() as u32);
    message.put_u32_le(PROTOCOL_VERSION);
    message.put_u32_le(command_id);
    message.put_bytes(0, 4);
    message.extend_from_slice(payload);
    message
}

/// Decode the first 16 bytes of `bytes` as a header
pub fn decode_header(bytes: &[u8]) -> Result<Header> {
    if bytes.len() < HEADER_SIZE {
        return Err(ProtocolError::ShortHeader {
            received: bytes.len(),
        }
        .into());
    }

    let mut buf = &bytes[..HEADER_SIZE];
    let header = Header {
        length: buf.get_u32_le(),
        protocol_version: buf.get_u32_le(),
        command_id: buf.get_u32_le(),
    };

    if header.protocol_version != PROTOCOL_VERSION {
        tracing::warn!(
            "Header carries protocol version {} (expected {})",
            header.protocol_version,
            PROTOCOL_VERSION
        );
    }

    Ok(header)
}

/// Decode a complete packet from bytes
///
/// The bytes after the header must match the declared length exactly.
pub fn decode(bytes: &[u8]) -> Result<Packet> {
    let header = decode_header(bytes)?;
    let payload = &bytes[HEADER_SIZE..];

    if payload.len() != header.length as usize {
        return Err(ProtocolError::LengthMismatch {
            expected: header.length as usize,
            actual: payload.len(),
        }
        .into());
    }

    Ok(Packet {
        command_id: header.command_id,
        payload: payload.to_vec(),
    })
}

/// Decode a response payload that must be exactly one u32
pub fn decode_u32(payload: &[u8]) -> Result<u32> {
    let bytes: [u8; 4] = payload
        .try_into()
        .map_err(|_| ProtocolError::LengthMismatch {
            expected: 4,
            actual: payload.len(),
        })?;
    Ok(u32::from_le_bytes(bytes))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Fill `buf` from the reader, returning how many bytes arrived before EOF
fn read_until_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Read exactly `length` payload bytes
///
/// Loops over short reads; EOF before `length` bytes is a `ShortRead`
/// carrying whatever did arrive.
pub fn read_exact_payload<R: Read>(reader: &mut R, length: usize) -> Result<Vec<u8>> {
    let mut payload = vec![0u8; length];
    let filled = read_until_full(reader, &mut payload)?;

    if filled < length {
        payload.truncate(filled);
        return Err(ProtocolError::ShortRead {
            expected: length,
            received: payload,
        }
        .into());
    }

    Ok(payload)
}

/// Read a complete packet from a stream
///
/// Blocks until a complete packet is received or an error occurs
pub fn read_packet<R: Read>(reader: &mut R) -> Result<Packet> {
    let mut header_bytes = [0u8; HEADER_SIZE];
    let filled = read_until_full(reader, &mut header_bytes)?;
    let header = decode_header(&header_bytes[..filled])?;

    // Validate payload length before allocating
    if header.length > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge(header.length).into());
    }

    let payload = read_exact_payload(reader, header.length as usize)?;

    tracing::trace!(
        "Read packet: command={} length={}",
        header.command_id,
        header.length
    );

    Ok(Packet {
        command_id: header.command_id,
        payload,
    })
}

/// Write a packet to a stream
pub fn write_packet<W: Write>(writer: &mut W, command_id: u32, payload: &[u8]) -> Result<()> {
    let bytes = encode(command_id, payload);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
