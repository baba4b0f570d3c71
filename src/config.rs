//! Configuration for chromalink
//!
//! Centralized client configuration with sensible defaults.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ChromaError;

/// Default OpenRGB SDK server port
pub const DEFAULT_PORT: u16 = 6742;

/// Address of an OpenRGB SDK server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new("127.0.0.1", DEFAULT_PORT)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = ChromaError;

    /// Parse `host:port`, or a bare `host` using the default port
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ChromaError::Config("empty endpoint".to_string()));
        }

        match s.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => {
                let port = port
                    .parse::<u16>()
                    .map_err(|e| ChromaError::Config(format!("invalid port '{}': {}", port, e)))?;
                Ok(Self::new(host, port))
            }
            Some(_) => Err(ChromaError::Config(format!("missing host in '{}'", s))),
            None => Ok(Self::new(s, DEFAULT_PORT)),
        }
    }
}

/// Main configuration for a chromalink client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -------------------------------------------------------------------------
    // Session Configuration
    // -------------------------------------------------------------------------
    /// Server to connect to
    pub endpoint: Endpoint,

    /// Name announced with SET_CLIENT_NAME right after connecting
    pub client_name: String,

    // -------------------------------------------------------------------------
    // Connect Retry Configuration
    // -------------------------------------------------------------------------
    /// Total connect attempts before giving up (must be >= 1)
    pub max_retries: u32,

    /// Pause between failed connect attempts
    pub retry_delay: Duration,

    /// Upper bound for a single TCP connect attempt
    pub connect_timeout: Duration,

    // -------------------------------------------------------------------------
    // Socket Configuration
    // -------------------------------------------------------------------------
    /// Read timeout on the established socket (zero disables)
    pub read_timeout: Duration,

    /// Write timeout on the established socket (zero disables)
    pub write_timeout: Duration,

    // -------------------------------------------------------------------------
    // Throttle Configuration
    // -------------------------------------------------------------------------
    /// Minimum pause after each color write before the same target accepts another
    pub cooldown: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            client_name: "chromalink".to_string(),
            max_retries: 5,
            retry_delay: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(2),
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
            cooldown: Duration::from_millis(50), // device bus pacing
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Check values that would otherwise fail later in surprising ways
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_retries == 0 {
            return Err(ChromaError::Config(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.client_name.is_empty() {
            return Err(ChromaError::Config("client_name must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the server endpoint
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.config.endpoint = endpoint;
        self
    }

    /// Set the server host, keeping the current port
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.endpoint.host = host.into();
        self
    }

    /// Set the server port, keeping the current host
    pub fn port(mut self, port: u16) -> Self {
        self.config.endpoint.port = port;
        self
    }

    /// Set the client name sent on connect
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.config.client_name = name.into();
        self
    }

    /// Set the total number of connect attempts
    pub fn max_retries(mut self, attempts: u32) -> Self {
        self.config.max_retries = attempts;
        self
    }

    /// Set the delay between connect attempts
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    /// Set the per-attempt connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the socket read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set the socket write timeout
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    /// Set the per-target write cool-down
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.config.cooldown = cooldown;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
