//! Error types for chromalink
//!
//! Provides a unified error type for all operations, with nested enums for
//! the connection, framing and descriptor-parsing layers.

use thiserror::Error;

/// Result type alias using ChromaError
pub type Result<T> = std::result::Result<T, ChromaError>;

/// Unified error type for chromalink operations
#[derive(Debug, Error)]
pub enum ChromaError {
    // -------------------------------------------------------------------------
    // Layered Errors
    // -------------------------------------------------------------------------
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Device {0} not found")]
    DeviceNotFound(u32),

    #[error("Zone {zone} not found on device {device}")]
    ZoneNotFound { device: u32, zone: u32 },

    #[error("Mode '{mode}' not found on device {device}")]
    ModeNotFound { device: u32, mode: String },

    // -------------------------------------------------------------------------
    // Request Validation Errors
    // -------------------------------------------------------------------------
    #[error("Device {device} has {expected} LEDs, got {actual} colors")]
    LedCountMismatch {
        device: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Too many LEDs for one update: {0} (max 65535)")]
    TooManyLeds(usize),

    #[error("Field '{field}' too long for a u16 length prefix: {len} (max 65535)")]
    FieldTooLong { field: &'static str, len: usize },

    #[error("Invalid size {requested} for zone {zone} (allowed {min}..={max})")]
    InvalidZoneSize {
        zone: u32,
        requested: u32,
        min: u32,
        max: u32,
    },

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    // -------------------------------------------------------------------------
    // Output Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Throttling
    // -------------------------------------------------------------------------
    /// A write to the same target is still in flight. Expected and non-fatal.
    #[error("Target busy: a previous update is still in flight")]
    Busy,
}

impl ChromaError {
    /// True for the throttle's `Busy` outcome
    pub fn is_busy(&self) -> bool {
        matches!(self, ChromaError::Busy)
    }

    /// True when the error means the session is gone and a reconnect is needed
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, ChromaError::Connection(_) | ChromaError::Protocol(_))
    }
}

impl From<std::io::Error> for ChromaError {
    fn from(err: std::io::Error) -> Self {
        ChromaError::Connection(ConnectionError::from(err))
    }
}

/// Socket-level failures
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Connection refused")]
    Refused,

    #[error("Connection timed out")]
    Timeout,

    #[error("Server at {endpoint} unreachable after {attempts} attempt(s)")]
    Unreachable {
        endpoint: String,
        attempts: u32,
        #[source]
        source: Box<ConnectionError>,
    },

    #[error("Not connected")]
    NotConnected,

    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),
}

impl From<std::io::Error> for ConnectionError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::ConnectionRefused => ConnectionError::Refused,
            // Unix reports read timeouts as WouldBlock, Windows as TimedOut
            ErrorKind::TimedOut | ErrorKind::WouldBlock => ConnectionError::Timeout,
            _ => ConnectionError::Io(err),
        }
    }
}

/// Framing failures
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Short header: expected 16 bytes, got {received}")]
    ShortHeader { received: usize },

    #[error("Short read: expected {expected} bytes, got {}", .received.len())]
    ShortRead { expected: usize, received: Vec<u8> },

    #[error("Length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Unknown command id: {0}")]
    UnknownCommand(u32),

    #[error("Unexpected response: expected command {expected}, got {actual}")]
    UnexpectedCommand { expected: u32, actual: u32 },

    #[error("Payload too large: {0} bytes")]
    PayloadTooLarge(u32),
}

/// Device descriptor decoding failures
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Truncated field '{field}': needed {needed} bytes, {available} available")]
    TruncatedField {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Invalid device type code: {0}")]
    InvalidDeviceType(u32),

    #[error("Invalid zone type code: {0}")]
    InvalidZoneType(u32),

    #[error("Zone '{zone}' covers LEDs {start}..{end} but device has {led_count}")]
    ZoneOutOfRange {
        zone: String,
        start: u32,
        end: u32,
        led_count: usize,
    },

    #[error("Zones '{first}' and '{second}' overlap")]
    ZoneOverlap { first: String, second: String },
}
