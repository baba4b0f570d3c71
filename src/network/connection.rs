//! Connection Manager
//!
//! Owns the single TCP stream to the SDK server.
//!
//! ## State Machine
//! ```text
//! Disconnected ──connect──► Connecting ──ok──► Connected ──disconnect──► Disconnected
//!                               │                  │
//!                               └─retries spent    └─any I/O or framing error──► Broken
//! ```
//! A broken connection is never repaired in place; the owner reconnects,
//! which implies rediscovering every device.

use std::io::{BufReader, BufWriter};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

use crate::config::{ClientConfig, Endpoint};
use crate::error::{ConnectionError, ProtocolError, Result};
use crate::protocol::{decode_u32, read_packet, write_packet, CommandId, Packet};

/// Lifecycle state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Broken,
}

/// Buffered halves of the socket
struct Streams {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

/// A synchronous, strictly request/response connection
///
/// Taking `&mut self` for every exchange guarantees one outstanding request
/// at a time; the protocol has no correlation id.
pub struct Connection {
    config: ClientConfig,
    state: ConnectionState,
    streams: Option<Streams>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a disconnected connection for the configured endpoint
    pub fn new(config: ClientConfig) -> Self {
        let peer_addr = config.endpoint.to_string();
        Self {
            config,
            state: ConnectionState::Disconnected,
            streams: None,
            peer_addr,
        }
    }

    /// Create and connect in one step
    pub fn open(config: ClientConfig) -> Result<Self> {
        let mut conn = Self::new(config);
        conn.connect()?;
        Ok(conn)
    }

    /// Connect with bounded retries, then announce the client name
    ///
    /// Makes `max_retries` attempts in total, sleeping `retry_delay` between
    /// them. Running out of attempts is final for this call.
    pub fn connect(&mut self) -> Result<()> {
        if self.state == ConnectionState::Connected {
            return Ok(());
        }
        self.config.validate()?;

        let endpoint = self.config.endpoint.clone();
        let attempts = self.config.max_retries;
        let mut last_error = ConnectionError::NotConnected;

        for attempt in 1..=attempts {
            self.state = ConnectionState::Connecting;
            tracing::debug!("Connecting to {} (attempt {}/{})", endpoint, attempt, attempts);

            match open_stream(&endpoint, self.config.connect_timeout) {
                Ok(stream) => {
                    let attached = self.attach(stream);
                    self.track(attached)?;
                    tracing::info!("Connected to OpenRGB server at {}", self.peer_addr);

                    let name = self.config.client_name.clone();
                    self.send_command(CommandId::SetClientName, name.as_bytes())?;
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        "Connection attempt {}/{} to {} failed: {}",
                        attempt,
                        attempts,
                        endpoint,
                        e
                    );
                    last_error = e;
                    if attempt < attempts {
                        thread::sleep(self.config.retry_delay);
                    }
                }
            }
        }

        self.state = ConnectionState::Disconnected;
        Err(ConnectionError::Unreachable {
            endpoint: endpoint.to_string(),
            attempts,
            source: Box::new(last_error),
        }
        .into())
    }

    /// Set up buffered I/O and configure the socket
    fn attach(&mut self, stream: TcpStream) -> Result<()> {
        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;
        stream.set_read_timeout(non_zero(self.config.read_timeout))?;
        stream.set_write_timeout(non_zero(self.config.write_timeout))?;

        if let Ok(addr) = stream.peer_addr() {
            self.peer_addr = addr.to_string();
        }

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        self.streams = Some(Streams {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        });
        self.state = ConnectionState::Connected;
        Ok(())
    }

    // =========================================================================
    // Request / Response
    // =========================================================================

    /// Send one command
    pub fn send_command(&mut self, command: CommandId, payload: &[u8]) -> Result<()> {
        let streams = self.streams.as_mut().ok_or(ConnectionError::NotConnected)?;

        tracing::debug!(
            "-> {:?} ({} bytes) to {}",
            command,
            payload.len(),
            self.peer_addr
        );
        let result = write_packet(&mut streams.writer, command.id(), payload);
        self.track(result)
    }

    /// Receive the next packet from the server
    pub fn receive_response(&mut self) -> Result<Packet> {
        let streams = self.streams.as_mut().ok_or(ConnectionError::NotConnected)?;

        let result = read_packet(&mut streams.reader).and_then(|packet| {
            CommandId::try_from(packet.command_id)?;
            Ok(packet)
        });
        let packet = self.track(result)?;

        tracing::debug!(
            "<- command {} ({} bytes) from {}",
            packet.command_id,
            packet.payload.len(),
            self.peer_addr
        );
        Ok(packet)
    }

    /// Send a command and wait for its response
    pub fn request(&mut self, command: CommandId, payload: &[u8]) -> Result<Packet> {
        self.send_command(command, payload)?;
        let packet = self.receive_response()?;

        if packet.command_id != command.id() {
            let err = ProtocolError::UnexpectedCommand {
                expected: command.id(),
                actual: packet.command_id,
            };
            return self.track(Err(err.into()));
        }
        Ok(packet)
    }

    /// Send a command whose response is a single u32
    ///
    /// A response of any other length is a framing error like the rest and
    /// leaves the connection `Broken`.
    pub fn request_u32(&mut self, command: CommandId, payload: &[u8]) -> Result<u32> {
        let packet = self.request(command, payload)?;
        let value = decode_u32(&packet.payload);
        self.track(value)
    }

    /// Any failure on an established socket leaves it unusable
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            tracing::warn!("Connection to {} broken: {}", self.peer_addr, e);
            self.close_streams();
            self.state = ConnectionState::Broken;
        }
        result
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Close the socket (idempotent)
    pub fn disconnect(&mut self) {
        if self.close_streams() {
            tracing::info!("Disconnected from {}", self.peer_addr);
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Returns whether there was a socket to close
    fn close_streams(&mut self) -> bool {
        match self.streams.take() {
            Some(streams) => {
                // Peer may already be gone
                let _ = streams.writer.get_ref().shutdown(Shutdown::Both);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.config.endpoint
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// One connect attempt across every resolved address
fn open_stream(
    endpoint: &Endpoint,
    timeout: Duration,
) -> std::result::Result<TcpStream, ConnectionError> {
    let addrs: Vec<SocketAddr> = (endpoint.host.as_str(), endpoint.port)
        .to_socket_addrs()?
        .collect();

    let mut last_error = ConnectionError::NotConnected;
    for addr in addrs {
        let attempt = if timeout.is_zero() {
            TcpStream::connect(addr)
        } else {
            TcpStream::connect_timeout(&addr, timeout)
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = e.into(),
        }
    }
    Err(last_error)
}

fn non_zero(duration: Duration) -> Option<Duration> {
    (!duration.is_zero()).then_some(duration)
}
