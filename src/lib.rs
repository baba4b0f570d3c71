//! # chromalink
//!
//! A minimal client for the OpenRGB SDK protocol:
//! - Length-prefixed binary framing over a single TCP connection
//! - Device discovery with strictly sequential descriptor decoding
//! - Color updates gated by a per-target single-flight throttle
//! - Cancellable animation loops driven from a worker thread
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Callers (GUI, CLI, effect loops)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Client                                │
//! │        (session owner, one socket, lock order conn → dir)    │
//! └──────┬──────────────────────┬───────────────────────┬───────┘
//!        │                      │                       │
//!        ▼                      ▼                       ▼
//! ┌─────────────┐      ┌────────────────┐      ┌────────────────┐
//! │  Throttle   │      │ DeviceDirectory│      │   Connection   │
//! │ (CAS/target)│      │   (RwLock)     │      │  (TcpStream)   │
//! └─────────────┘      └───────┬────────┘      └───────┬────────┘
//!                              │                       │
//!                              ▼                       ▼
//!                      ┌────────────────┐      ┌────────────────┐
//!                      │  Descriptor    │      │ Packet codec / │
//!                      │    parser      │      │ update encoder │
//!                      └────────────────┘      └────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod color;
pub mod protocol;
pub mod network;
pub mod device;
pub mod throttle;
pub mod client;
pub mod animation;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ChromaError, ConnectionError, ParseError, ProtocolError, Result};
pub use config::{ClientConfig, Endpoint};
pub use color::RgbColor;
pub use client::Client;
pub use device::{Device, DeviceSummary, DeviceType, Led, Mode, Zone, ZoneType};
pub use network::ConnectionState;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of chromalink
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
