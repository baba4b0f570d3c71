//! Network Module
//!
//! TCP connection handling.
//!
//! ## Architecture
//! - One socket per client, owned by `Connection`
//! - Strict request/response, never pipelined
//! - No reconnect behind the caller's back

mod connection;

pub use connection::{Connection, ConnectionState};
