//! Client Module
//!
//! The session object that coordinates all components.
//!
//! ## Responsibilities
//! - Own the connection and the device directory for one session
//! - Gate color writes through the update throttle
//! - Drop every cached device when the connection is lost or replaced

use parking_lot::Mutex;

use crate::color::RgbColor;
use crate::config::ClientConfig;
use crate::device::{Device, DeviceDirectory, DeviceSummary};
use crate::error::{ChromaError, Result};
use crate::network::{Connection, ConnectionState};
use crate::protocol::{build_resize_zone, build_update_leds, build_update_mode, CommandId};
use crate::throttle::{Target, UpdateThrottle};

/// A connected OpenRGB SDK client
///
/// ## Concurrency Model
///
/// - **Socket**: `connection` mutex serializes every request/response pair
/// - **Directory**: internal RwLock, replaced wholesale on refresh
/// - **Color writes**: `throttle` admits one in-flight write per target;
///   the rest return `Busy` without touching the socket
///
/// Lock order is always connection → directory.
pub struct Client {
    /// Client configuration
    config: ClientConfig,

    /// The one socket of this session
    connection: Mutex<Connection>,

    /// Devices discovered on the current connection
    directory: DeviceDirectory,

    /// Per-target write gate
    throttle: UpdateThrottle,
}

impl Client {
    /// Connect and discover devices
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let connection = Connection::open(config.clone())?;
        let client = Self {
            throttle: UpdateThrottle::new(config.cooldown),
            config,
            connection: Mutex::new(connection),
            directory: DeviceDirectory::new(),
        };

        client.refresh_devices()?;
        Ok(client)
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    /// Cached device list, fetched first if nothing is cached
    pub fn list_devices(&self) -> Result<Vec<DeviceSummary>> {
        if !self.directory.is_loaded() {
            return self.refresh_devices();
        }
        Ok(self.directory.summaries())
    }

    /// Re-enumerate all devices from the server
    pub fn refresh_devices(&self) -> Result<Vec<DeviceSummary>> {
        let mut conn = self.connection.lock();
        self.directory.refresh(&mut conn)
    }

    /// Full record of one device
    pub fn get_device(&self, device_id: u32) -> Result<Device> {
        self.ensure_loaded()?;
        self.directory.get(device_id)
    }

    /// Server protocol version
    pub fn protocol_version(&self) -> Result<u32> {
        let mut conn = self.connection.lock();
        let result = conn.request_u32(CommandId::RequestProtocolVersion, &[]);
        self.watch(result)
    }

    fn ensure_loaded(&self) -> Result<()> {
        if !self.directory.is_loaded() {
            self.refresh_devices()?;
        }
        Ok(())
    }

    // =========================================================================
    // Color Control
    // =========================================================================

    /// Set every LED of one zone; other LEDs keep their last known color
    ///
    /// Returns `ChromaError::Busy` if a write to this zone is still in flight.
    pub fn set_zone_color(&self, device_id: u32, zone_id: u32, color: RgbColor) -> Result<()> {
        self.ensure_loaded()?;
        let zone_exists = self
            .directory
            .with_device(device_id, |device| device.zone(zone_id).is_some())?;
        if !zone_exists {
            return Err(ChromaError::ZoneNotFound {
                device: device_id,
                zone: zone_id,
            });
        }

        let target = Target::Zone {
            device: device_id,
            zone: zone_id,
        };
        self.throttle.try_apply(target, || {
            self.write_leds(device_id, |device| {
                let zone = device.zone(zone_id).ok_or(ChromaError::ZoneNotFound {
                    device: device_id,
                    zone: zone_id,
                })?;
                let mut colors = device.colors();
                colors[zone.led_range()].fill(color);
                Ok(colors)
            })
        })
    }

    /// Set every LED of a device to one color
    pub fn set_device_color(&self, device_id: u32, color: RgbColor) -> Result<()> {
        self.ensure_loaded()?;
        self.directory.with_device(device_id, |_| ())?;

        self.throttle.try_apply(Target::Device(device_id), || {
            self.write_leds(device_id, |device| Ok(vec![color; device.leds.len()]))
        })
    }

    /// Set each LED of a device individually
    pub fn set_led_colors(&self, device_id: u32, colors: &[RgbColor]) -> Result<()> {
        self.ensure_loaded()?;
        let led_count = self.directory.with_device(device_id, |device| device.leds.len())?;
        check_led_count(device_id, led_count, colors.len())?;

        self.throttle.try_apply(Target::Device(device_id), || {
            self.write_leds(device_id, |device| {
                check_led_count(device_id, device.leds.len(), colors.len())?;
                Ok(colors.to_vec())
            })
        })
    }

    /// Build the full LED buffer, send it, and record it as acknowledged
    ///
    /// Building happens under the connection lock so concurrent writes to
    /// different zones of one device never overwrite each other's colors.
    fn write_leds(
        &self,
        device_id: u32,
        build: impl FnOnce(&Device) -> Result<Vec<RgbColor>>,
    ) -> Result<()> {
        let mut conn = self.connection.lock();

        let colors = self.directory.with_device(device_id, build)??;
        let payload = build_update_leds(device_id, &colors)?;

        let sent = conn.send_command(CommandId::UpdateLeds, &payload);
        self.watch(sent)?;
        self.directory.commit_colors(device_id, &colors)
    }

    // =========================================================================
    // Zone / Mode Control
    // =========================================================================

    /// Change the LED count of a resizable zone, then rediscover devices
    pub fn resize_zone(&self, device_id: u32, zone_id: u32, new_size: u32) -> Result<()> {
        self.ensure_loaded()?;
        let zone = self
            .directory
            .with_device(device_id, |device| device.zone(zone_id).cloned())?
            .ok_or(ChromaError::ZoneNotFound {
                device: device_id,
                zone: zone_id,
            })?;

        if !zone.resizable() || !(zone.leds_min..=zone.leds_max).contains(&new_size) {
            return Err(ChromaError::InvalidZoneSize {
                zone: zone_id,
                requested: new_size,
                min: zone.leds_min,
                max: zone.leds_max,
            });
        }

        let mut conn = self.connection.lock();
        let payload = build_resize_zone(device_id, zone_id, new_size);
        let sent = conn.send_command(CommandId::ResizeZone, &payload);
        self.watch(sent)?;

        tracing::info!(
            "Resized zone '{}' of device {} to {} LEDs",
            zone.name,
            device_id,
            new_size
        );

        // LED indexes shifted; the old layout is no longer valid
        self.directory.refresh(&mut conn).map(|_| ())
    }

    /// Switch a device to its "Direct" mode so per-LED writes take effect
    pub fn set_direct_mode(&self, device_id: u32) -> Result<()> {
        self.ensure_loaded()?;
        let payload = self
            .directory
            .with_device(device_id, |device| {
                device
                    .direct_mode()
                    .map(|(index, mode)| build_update_mode(device_id, index, mode))
            })?
            .ok_or_else(|| ChromaError::ModeNotFound {
                device: device_id,
                mode: "Direct".to_string(),
            })?;

        let mut conn = self.connection.lock();
        let sent = conn.send_command(CommandId::UpdateMode, &payload);
        self.watch(sent)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Drop the session and start a new one with full rediscovery
    pub fn reconnect(&self) -> Result<Vec<DeviceSummary>> {
        let mut conn = self.connection.lock();
        conn.disconnect();
        self.directory.clear();
        self.throttle.reset();

        conn.connect()?;
        self.directory.refresh(&mut conn)
    }

    /// Close the connection (idempotent)
    pub fn disconnect(&self) {
        self.connection.lock().disconnect();
        self.directory.clear();
        self.throttle.reset();
    }

    /// Clear the directory when an error means the session is gone
    fn watch<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_connection_lost() {
                self.directory.clear();
            }
        }
        result
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> ConnectionState {
        self.connection.lock().state()
    }

    /// Get the configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn throttle(&self) -> &UpdateThrottle {
        &self.throttle
    }
}

fn check_led_count(device_id: u32, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(ChromaError::LedCountMismatch {
            device: device_id,
            expected,
            actual,
        });
    }
    Ok(())
}
