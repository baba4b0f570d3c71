//! Device Directory
//!
//! Discovers controllers over a connection and caches them for the session.
//!
//! ## Responsibilities
//! - Request the controller count and each controller's descriptor
//! - Isolate descriptor parse failures to the one device
//! - Replace the cache wholesale on every refresh
//! - Record the last acknowledged LED colors

use parking_lot::RwLock;

use crate::color::RgbColor;
use crate::error::{ChromaError, Result};
use crate::network::Connection;
use crate::protocol::CommandId;

use super::{parse_device, Device, DeviceSummary};

/// Session cache of decoded devices
///
/// ## Concurrency:
/// - `devices`: Protected by RwLock, replaced under a single write
/// - `None` means nothing has been fetched on this connection yet
pub struct DeviceDirectory {
    devices: RwLock<Option<Vec<Device>>>,
}

impl DeviceDirectory {
    /// Create an empty (unloaded) directory
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(None),
        }
    }

    // =========================================================================
    // Server Requests
    // =========================================================================

    /// Ask the server how many controllers it exposes
    pub fn request_count(conn: &mut Connection) -> Result<u32> {
        conn.request_u32(CommandId::RequestControllerCount, &[])
    }

    /// Fetch and parse one controller's descriptor
    pub fn request_device(conn: &mut Connection, id: u32) -> Result<Device> {
        let packet = conn.request(CommandId::RequestControllerData, &id.to_le_bytes())?;
        parse_device(id, &packet.payload)
    }

    /// Re-enumerate every controller and replace the cache
    ///
    /// A descriptor that fails to parse becomes a placeholder; connection
    /// and framing errors abort the refresh and leave the cache empty.
    pub fn refresh(&self, conn: &mut Connection) -> Result<Vec<DeviceSummary>> {
        let result = Self::fetch_all(conn);

        let mut devices = self.devices.write();
        match result {
            Ok(fetched) => {
                let summaries = fetched.iter().map(Device::summary).collect();
                tracing::info!("Directory refreshed: {} device(s)", fetched.len());
                *devices = Some(fetched);
                Ok(summaries)
            }
            Err(e) => {
                *devices = None;
                Err(e)
            }
        }
    }

    fn fetch_all(conn: &mut Connection) -> Result<Vec<Device>> {
        let count = Self::request_count(conn)?;
        tracing::debug!("Server reports {} controller(s)", count);

        let mut fetched = Vec::with_capacity(count as usize);
        for id in 0..count {
            match Self::request_device(conn, id) {
                Ok(device) => {
                    tracing::debug!(
                        "Device {}: '{}' ({} zones, {} LEDs)",
                        id,
                        device.name,
                        device.zones.len(),
                        device.leds.len()
                    );
                    fetched.push(device);
                }
                Err(ChromaError::Parse(e)) => {
                    tracing::warn!("Device {} descriptor unreadable, using placeholder: {}", id, e);
                    fetched.push(Device::placeholder(id));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(fetched)
    }

    // =========================================================================
    // Cache Access
    // =========================================================================

    /// Replace the cached devices
    pub fn replace(&self, devices: Vec<Device>) {
        *self.devices.write() = Some(devices);
    }

    /// Drop everything (disconnect, reconnect, broken connection)
    pub fn clear(&self) {
        *self.devices.write() = None;
    }

    /// Whether a refresh has completed on the current connection
    pub fn is_loaded(&self) -> bool {
        self.devices.read().is_some()
    }

    /// Summaries of all cached devices (empty if unloaded)
    pub fn summaries(&self) -> Vec<DeviceSummary> {
        self.devices
            .read()
            .as_ref()
            .map(|devices| devices.iter().map(Device::summary).collect())
            .unwrap_or_default()
    }

    /// Clone of one cached device
    pub fn get(&self, id: u32) -> Result<Device> {
        self.with_device(id, Device::clone)
    }

    /// Run `f` against a cached device without cloning it
    pub fn with_device<R>(&self, id: u32, f: impl FnOnce(&Device) -> R) -> Result<R> {
        let devices = self.devices.read();
        devices
            .as_ref()
            .and_then(|devices| devices.iter().find(|device| device.id == id))
            .map(f)
            .ok_or(ChromaError::DeviceNotFound(id))
    }

    /// Record colors the server has accepted for a device
    pub fn commit_colors(&self, id: u32, colors: &[RgbColor]) -> Result<()> {
        let mut devices = self.devices.write();
        let device = devices
            .as_mut()
            .and_then(|devices| devices.iter_mut().find(|device| device.id == id))
            .ok_or(ChromaError::DeviceNotFound(id))?;

        if colors.len() != device.leds.len() {
            return Err(ChromaError::LedCountMismatch {
                device: id,
                expected: device.leds.len(),
                actual: colors.len(),
            });
        }

        for (led, color) in device.leds.iter_mut().zip(colors) {
            led.color = *color;
        }
        Ok(())
    }
}

impl Default for DeviceDirectory {
    fn default() -> Self {
        Self::new()
    }
}
