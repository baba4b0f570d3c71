//! Tests for Client
//!
//! These tests verify:
//! - Discovery on connect and on reconnect
//! - Zone/device/LED color writes on the wire
//! - Throttled writes under contention
//! - Resize and mode changes
//! - Cache invalidation when the session ends

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chromalink::protocol::{build_update_mode, encode, CommandId, Packet};
use chromalink::throttle::Target;
use chromalink::{
    ChromaError, Client, ClientConfig, ConnectionError, ConnectionState, ProtocolError, RgbColor,
};
use common::{sample_device, test_config, unused_addr, Fault, MockServer};

// =============================================================================
// Helper Functions
// =============================================================================

fn board_server() -> MockServer {
    MockServer::start(vec![
        sample_device("Motherboard", &[("Aura", 3), ("Header", 2)]),
        sample_device("DRAM", &[("DIMM", 4)]),
    ])
}

/// Round-trip a request so every earlier write has reached the server
fn sync(client: &Client) {
    client.protocol_version().unwrap();
}

/// Decode an UPDATELEDS payload into (device id, colors)
fn decode_update_leds(packet: &Packet) -> (u32, Vec<RgbColor>) {
    let p = &packet.payload;
    let device = u32::from_le_bytes(p[0..4].try_into().unwrap());
    let count = u16::from_le_bytes(p[4..6].try_into().unwrap()) as usize;
    assert_eq!(p.len(), 6 + 4 * count);

    let colors = p[6..]
        .chunks(4)
        .map(|c| {
            assert_eq!(c[3], 0xFF);
            RgbColor::new(c[0], c[1], c[2])
        })
        .collect();
    (device, colors)
}

// =============================================================================
// Discovery Tests
// =============================================================================

#[test]
fn test_connect_discovers_devices() {
    let server = board_server();
    let client = Client::connect(server.config()).unwrap();

    assert_eq!(client.state(), ConnectionState::Connected);
    let devices = client.list_devices().unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].name, "Motherboard");
    assert_eq!(devices[0].led_count, 5);
    assert_eq!(devices[1].id, 1);

    let device = client.get_device(1).unwrap();
    assert_eq!(device.zones[0].name, "DIMM");
}

#[test]
fn test_connect_unreachable() {
    let result = Client::connect(test_config(unused_addr()));

    assert!(matches!(
        result,
        Err(ChromaError::Connection(ConnectionError::Unreachable { attempts: 1, .. }))
    ));
}

#[test]
fn test_unknown_device() {
    let server = board_server();
    let client = Client::connect(server.config()).unwrap();

    assert!(matches!(client.get_device(7), Err(ChromaError::DeviceNotFound(7))));
    assert!(matches!(
        client.set_device_color(7, RgbColor::RED),
        Err(ChromaError::DeviceNotFound(7))
    ));
}

#[test]
fn test_protocol_version() {
    let server = board_server();
    server.set_protocol_version(3);
    let client = Client::connect(server.config()).unwrap();

    assert_eq!(client.protocol_version().unwrap(), 3);
}

// =============================================================================
// Color Write Tests
// =============================================================================

#[test]
fn test_zone_color_keeps_other_leds() {
    let server = board_server();
    let client = Client::connect(server.config()).unwrap();

    client.set_zone_color(0, 0, RgbColor::GREEN).unwrap();
    client.set_zone_color(0, 1, RgbColor::RED).unwrap();
    sync(&client);

    let writes = server.drain_command(CommandId::UpdateLeds);
    assert_eq!(writes.len(), 2);

    let (device, colors) = decode_update_leds(&writes[1]);
    assert_eq!(device, 0);
    assert_eq!(
        colors,
        vec![
            RgbColor::GREEN,
            RgbColor::GREEN,
            RgbColor::GREEN,
            RgbColor::RED,
            RgbColor::RED
        ]
    );
    assert_eq!(client.get_device(0).unwrap().colors(), colors);
}

#[test]
fn test_unknown_zone() {
    let server = board_server();
    let client = Client::connect(server.config()).unwrap();

    assert!(matches!(
        client.set_zone_color(1, 3, RgbColor::BLUE),
        Err(ChromaError::ZoneNotFound { device: 1, zone: 3 })
    ));
}

#[test]
fn test_device_color() {
    let server = board_server();
    let client = Client::connect(server.config()).unwrap();

    client.set_device_color(1, RgbColor::BLUE).unwrap();
    sync(&client);

    let writes = server.drain_command(CommandId::UpdateLeds);
    assert_eq!(writes.len(), 1);
    let (device, colors) = decode_update_leds(&writes[0]);
    assert_eq!(device, 1);
    assert_eq!(colors, vec![RgbColor::BLUE; 4]);
}

#[test]
fn test_led_colors() {
    let server = board_server();
    let client = Client::connect(server.config()).unwrap();
    let colors = [
        RgbColor::new(1, 2, 3),
        RgbColor::new(4, 5, 6),
        RgbColor::new(7, 8, 9),
        RgbColor::new(10, 11, 12),
    ];

    client.set_led_colors(1, &colors).unwrap();
    sync(&client);

    let writes = server.drain_command(CommandId::UpdateLeds);
    assert_eq!(decode_update_leds(&writes[0]).1, colors.to_vec());
}

#[test]
fn test_led_colors_count_mismatch() {
    let server = board_server();
    let client = Client::connect(server.config()).unwrap();

    assert!(matches!(
        client.set_led_colors(1, &[RgbColor::RED; 3]),
        Err(ChromaError::LedCountMismatch {
            device: 1,
            expected: 4,
            actual: 3
        })
    ));
    sync(&client);
    assert!(server.drain_command(CommandId::UpdateLeds).is_empty());
}

#[test]
fn test_concurrent_zone_writes_throttled() {
    let server = board_server();
    let config = ClientConfig {
        cooldown: Duration::from_millis(200),
        ..server.config()
    };
    let client = Arc::new(Client::connect(config).unwrap());

    let first = {
        let client = Arc::clone(&client);
        thread::spawn(move || client.set_zone_color(0, 0, RgbColor::RED))
    };
    thread::sleep(Duration::from_millis(50));

    let second = client.set_zone_color(0, 0, RgbColor::BLUE);
    assert!(matches!(second, Err(ChromaError::Busy)));

    first.join().unwrap().unwrap();
    sync(&client);

    let writes = server.drain_command(CommandId::UpdateLeds);
    assert_eq!(writes.len(), 1);
    assert_eq!(decode_update_leds(&writes[0]).1[0], RgbColor::RED);
}

#[test]
fn test_zone_write_within_default_cooldown_is_busy() {
    let server = board_server();
    let config = ClientConfig {
        cooldown: ClientConfig::default().cooldown,
        ..server.config()
    };
    let client = Arc::new(Client::connect(config).unwrap());

    let first = {
        let client = Arc::clone(&client);
        thread::spawn(move || client.set_zone_color(0, 0, RgbColor::RED))
    };
    thread::sleep(Duration::from_millis(10));

    assert!(matches!(
        client.set_zone_color(0, 0, RgbColor::BLUE),
        Err(ChromaError::Busy)
    ));
    first.join().unwrap().unwrap();
    sync(&client);

    let writes = server.drain_command(CommandId::UpdateLeds);
    assert_eq!(writes.len(), 1);
    assert_eq!(decode_update_leds(&writes[0]).1[0], RgbColor::RED);
    assert_eq!(client.get_device(0).unwrap().colors()[0], RgbColor::RED);
}

#[test]
fn test_zone_write_applies_after_cooldown() {
    let server = board_server();
    let client = Client::connect(server.config()).unwrap();

    client.set_zone_color(0, 0, RgbColor::RED).unwrap();
    client.set_zone_color(0, 0, RgbColor::BLUE).unwrap();
    sync(&client);

    assert_eq!(server.drain_command(CommandId::UpdateLeds).len(), 2);
    assert_eq!(client.get_device(0).unwrap().colors()[0], RgbColor::BLUE);
}

// =============================================================================
// Resize / Mode Tests
// =============================================================================

#[test]
fn test_resize_out_of_bounds() {
    let server = board_server();
    let client = Client::connect(server.config()).unwrap();

    assert!(matches!(
        client.resize_zone(0, 1, 500),
        Err(ChromaError::InvalidZoneSize {
            zone: 1,
            requested: 500,
            min: 0,
            max: 120
        })
    ));
    sync(&client);
    assert!(server.drain_command(CommandId::ResizeZone).is_empty());
}

#[test]
fn test_resize_fixed_zone() {
    let mut device = sample_device("GPU", &[("Logo", 1)]);
    device.zones[0].leds_min = 1;
    device.zones[0].leds_max = 1;
    let server = MockServer::start(vec![device]);
    let client = Client::connect(server.config()).unwrap();

    assert!(matches!(
        client.resize_zone(0, 0, 1),
        Err(ChromaError::InvalidZoneSize { min: 1, max: 1, .. })
    ));
}

#[test]
fn test_resize_rediscovers_devices() {
    let server = board_server();
    let client = Client::connect(server.config()).unwrap();

    // What the server reports once the resize has taken effect
    server.set_devices(vec![
        sample_device("Motherboard", &[("Aura", 3), ("Header", 30)]),
        sample_device("DRAM", &[("DIMM", 4)]),
    ]);
    client.resize_zone(0, 1, 30).unwrap();

    let resizes = server.drain_command(CommandId::ResizeZone);
    assert_eq!(resizes.len(), 1);
    let expected: Vec<u8> = [0u32, 1, 30].iter().flat_map(|v| v.to_le_bytes()).collect();
    assert_eq!(resizes[0].payload, expected);

    let device = client.get_device(0).unwrap();
    assert_eq!(device.leds.len(), 33);
    assert_eq!(device.zones[1].led_count, 30);
}

#[test]
fn test_set_direct_mode() {
    let server = board_server();
    let client = Client::connect(server.config()).unwrap();

    client.set_direct_mode(1).unwrap();
    sync(&client);

    let device = client.get_device(1).unwrap();
    let updates = server.drain_command(CommandId::UpdateMode);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].payload, build_update_mode(1, 0, &device.modes[0]));
}

#[test]
fn test_direct_mode_missing() {
    let mut device = sample_device("Fan", &[("Ring", 8)]);
    device.modes.retain(|m| m.name != "Direct");
    let server = MockServer::start(vec![device]);
    let client = Client::connect(server.config()).unwrap();

    assert!(matches!(
        client.set_direct_mode(0),
        Err(ChromaError::ModeNotFound { device: 0, .. })
    ));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_reconnect_rediscovers() {
    let server = board_server();
    let client = Client::connect(server.config()).unwrap();

    server.set_devices(vec![
        sample_device("Keyboard", &[("Keys", 104)]),
        sample_device("DRAM", &[("DIMM", 4)]),
        sample_device("Mouse", &[("Logo", 1)]),
    ]);
    let devices = client.reconnect().unwrap();

    let names: Vec<_> = devices.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["Keyboard", "DRAM", "Mouse"]);
    assert_eq!(client.get_device(0).unwrap().leds.len(), 104);
    assert_eq!(server.connections(), 2);
}

#[test]
fn test_disconnect_drops_cache() {
    let server = board_server();
    let client = Client::connect(server.config()).unwrap();

    client.disconnect();
    client.disconnect();

    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(matches!(
        client.list_devices(),
        Err(ChromaError::Connection(ConnectionError::NotConnected))
    ));
}

#[test]
fn test_lost_connection_drops_cache() {
    let server = board_server();
    let client = Client::connect(server.config()).unwrap();
    server.inject(Fault::RawThenClose(vec![0u8; 4]));

    assert!(client.protocol_version().is_err());
    assert_eq!(client.state(), ConnectionState::Broken);
    assert!(client.get_device(0).is_err());

    // A fresh session starts from scratch
    assert_eq!(client.reconnect().unwrap().len(), 2);
    assert_eq!(client.state(), ConnectionState::Connected);
}

#[test]
fn test_wrong_length_version_marks_broken() {
    let server = board_server();
    let client = Client::connect(server.config()).unwrap();
    server.inject(Fault::RawThenClose(encode(40, &[1, 0])));

    assert!(matches!(
        client.protocol_version(),
        Err(ChromaError::Protocol(ProtocolError::LengthMismatch { expected: 4, actual: 2 }))
    ));
    assert_eq!(client.state(), ConnectionState::Broken);
    assert!(client.get_device(0).is_err());
}

#[test]
fn test_wrong_length_count_marks_broken() {
    let server = board_server();
    let client = Client::connect(server.config()).unwrap();
    server.inject(Fault::RawThenClose(encode(0, &[2, 0])));

    assert!(matches!(
        client.refresh_devices(),
        Err(ChromaError::Protocol(ProtocolError::LengthMismatch { .. }))
    ));
    assert_eq!(client.state(), ConnectionState::Broken);
}

#[test]
fn test_session_end_forgets_throttle_targets() {
    let server = board_server();
    let client = Client::connect(server.config()).unwrap();

    client.set_zone_color(0, 1, RgbColor::RED).unwrap();
    client.set_device_color(1, RgbColor::BLUE).unwrap();
    assert_eq!(client.throttle().target_count(), 2);

    client.reconnect().unwrap();
    assert_eq!(client.throttle().target_count(), 0);

    client.set_device_color(0, RgbColor::GREEN).unwrap();
    assert_eq!(client.throttle().target_count(), 1);
    assert!(!client.throttle().is_in_flight(Target::Device(0)));

    client.disconnect();
    assert_eq!(client.throttle().target_count(), 0);
}
