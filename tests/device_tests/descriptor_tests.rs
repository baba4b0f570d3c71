//! Tests for descriptor parsing
//!
//! These tests verify:
//! - Sequential length-prefixed decoding of every section
//! - Mode records skipped by their declared length
//! - Truncation and invalid codes reported as parse errors
//! - Zone partition invariants

#[path = "../common/mod.rs"]
mod common;

use bytes::BufMut;
use chromalink::device::{encode_device, parse_device};
use chromalink::{ChromaError, DeviceType, Led, Mode, ParseError, RgbColor, ZoneType};
use common::sample_device;

// =============================================================================
// Helper Functions
// =============================================================================

fn put_name(buf: &mut Vec<u8>, name: &str) {
    buf.put_u16_le(name.len() as u16);
    buf.put_slice(name.as_bytes());
}

/// Hand-built descriptor: one odd-sized mode, one zone, two LEDs
fn handmade_descriptor() -> Vec<u8> {
    let mut buf = Vec::new();
    put_name(&mut buf, "ASUS TUF GAMING B760M-PLUS WIFI\0");
    buf.put_u32_le(0); // motherboard

    buf.put_u16_le(1);
    let mut record = Vec::new();
    put_name(&mut record, "Breathing");
    record.extend_from_slice(&[0xDE; 37]); // arbitrary mode parameters
    buf.put_u32_le(record.len() as u32);
    buf.put_slice(&record);

    buf.put_u16_le(1);
    put_name(&mut buf, "Addressable 1");
    buf.put_u32_le(1); // linear
    buf.put_u32_le(0); // start
    buf.put_u32_le(2); // count
    buf.put_u32_le(0); // min
    buf.put_u32_le(120); // max

    buf.put_u16_le(2);
    put_name(&mut buf, "LED 1");
    buf.put_u8(1);
    buf.put_slice(&[255, 0, 0, 0]);
    put_name(&mut buf, "LED 2");
    buf.put_u8(0);

    buf
}

fn expect_parse_error(result: chromalink::Result<chromalink::Device>) -> ParseError {
    match result {
        Err(ChromaError::Parse(e)) => e,
        other => panic!("Expected parse error, got {:?}", other),
    }
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_parse_handmade_descriptor() {
    let device = parse_device(4, &handmade_descriptor()).unwrap();

    assert_eq!(device.id, 4);
    assert_eq!(device.name, "ASUS TUF GAMING B760M-PLUS WIFI");
    assert_eq!(device.device_type, DeviceType::Motherboard);

    assert_eq!(device.modes.len(), 1);
    assert_eq!(device.modes[0].name, "Breathing");
    assert_eq!(device.modes[0].params(), &[0xDE; 37][..]);

    assert_eq!(device.zones.len(), 1);
    let zone = &device.zones[0];
    assert_eq!(zone.name, "Addressable 1");
    assert_eq!(zone.zone_type, ZoneType::Linear);
    assert_eq!(zone.led_range(), 0..2);
    assert!(zone.resizable());

    assert_eq!(device.leds.len(), 2);
    assert_eq!(device.leds[0].color, RgbColor::RED);
    assert_eq!(device.leds[1].color, RgbColor::BLACK);
}

#[test]
fn test_mode_records_skipped_by_declared_length() {
    // A mode record whose params are far longer than any fixed guess
    let mut device = sample_device("Strip", &[("Main", 3)]);
    device.modes.push(Mode::new("Custom", &[0x55; 500]).unwrap());

    let parsed = parse_device(0, &encode_device(&device).unwrap()).unwrap();

    assert_eq!(parsed.modes.len(), 3);
    assert_eq!(parsed.modes[2].params().len(), 500);
    assert_eq!(parsed.zones, device.zones);
    assert_eq!(parsed.leds.len(), 3);
}

#[test]
fn test_encode_parse_preserves_device() {
    let mut device = sample_device("RAM", &[("DIMM 1", 8), ("DIMM 2", 8)]);
    device.id = 2;
    device.device_type = DeviceType::Dram;
    device.leds[3].color = RgbColor::new(10, 20, 30);

    let parsed = parse_device(2, &encode_device(&device).unwrap()).unwrap();
    assert_eq!(parsed, device);
}

#[test]
fn test_trailing_bytes_ignored() {
    let mut bytes = handmade_descriptor();
    bytes.extend_from_slice(&[0, 0, 0, 0]);

    let device = parse_device(0, &bytes).unwrap();
    assert_eq!(device.leds.len(), 2);
}

#[test]
fn test_device_without_zones_or_leds() {
    let device = sample_device("Empty", &[]);
    let parsed = parse_device(0, &encode_device(&device).unwrap()).unwrap();

    assert!(parsed.zones.is_empty());
    assert!(parsed.leds.is_empty());
}

#[test]
fn test_encode_rejects_oversized_name() {
    let device = sample_device(&"x".repeat(70_000), &[("Z", 1)]);

    assert!(matches!(
        encode_device(&device),
        Err(ChromaError::FieldTooLong {
            field: "device name",
            len: 70_000
        })
    ));
}

#[test]
fn test_encode_rejects_oversized_led_count() {
    let mut device = sample_device("Strip", &[]);
    device.leds = vec![
        Led {
            name: String::new(),
            color: RgbColor::BLACK,
        };
        65_536
    ];

    assert!(matches!(
        encode_device(&device),
        Err(ChromaError::FieldTooLong {
            field: "led count",
            len: 65_536
        })
    ));
}

#[test]
fn test_mode_name_limit() {
    assert!(matches!(
        Mode::new("x".repeat(70_000), &[]),
        Err(ChromaError::FieldTooLong {
            field: "mode name",
            ..
        })
    ));
    assert!(Mode::new("x".repeat(65_535), &[]).is_ok());
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_every_truncation_is_reported() {
    let bytes = handmade_descriptor();

    for len in 0..bytes.len() {
        match parse_device(0, &bytes[..len]) {
            Err(ChromaError::Parse(ParseError::TruncatedField { .. })) => {}
            other => panic!("Truncation at {} not reported: {:?}", len, other),
        }
    }
}

#[test]
fn test_truncated_name_field() {
    let mut bytes = Vec::new();
    bytes.put_u16_le(20);
    bytes.put_slice(b"short");

    match expect_parse_error(parse_device(0, &bytes)) {
        ParseError::TruncatedField {
            field,
            needed,
            available,
        } => {
            assert_eq!(field, "device name");
            assert_eq!(needed, 20);
            assert_eq!(available, 5);
        }
        other => panic!("Expected TruncatedField, got {:?}", other),
    }
}

#[test]
fn test_mode_record_longer_than_payload() {
    let mut bytes = Vec::new();
    put_name(&mut bytes, "Dev");
    bytes.put_u32_le(0);
    bytes.put_u16_le(1);
    bytes.put_u32_le(1000);
    bytes.put_slice(&[0; 10]);

    assert!(matches!(
        expect_parse_error(parse_device(0, &bytes)),
        ParseError::TruncatedField { field: "mode record", .. }
    ));
}

#[test]
fn test_invalid_device_type() {
    let mut bytes = Vec::new();
    put_name(&mut bytes, "Dev");
    bytes.put_u32_le(99);

    assert!(matches!(
        expect_parse_error(parse_device(0, &bytes)),
        ParseError::InvalidDeviceType(99)
    ));
}

#[test]
fn test_invalid_zone_type() {
    let mut device = sample_device("Dev", &[("Z", 1)]);
    device.zones[0].zone_type = ZoneType::Matrix;
    let mut bytes = encode_device(&device).unwrap();

    // Patch the zone type code in place: it follows the zone name
    let needle = b"Z";
    let pos = bytes
        .windows(needle.len() + 2)
        .position(|w| w[..2] == 1u16.to_le_bytes() && &w[2..] == needle)
        .unwrap();
    let type_at = pos + 2 + needle.len();
    bytes[type_at..type_at + 4].copy_from_slice(&7u32.to_le_bytes());

    assert!(matches!(
        expect_parse_error(parse_device(0, &bytes)),
        ParseError::InvalidZoneType(7)
    ));
}

// =============================================================================
// Zone Invariant Tests
// =============================================================================

#[test]
fn test_zones_partition_leds() {
    let device = sample_device("Board", &[("A", 4), ("B", 6), ("C", 0), ("D", 2)]);
    let parsed = parse_device(0, &encode_device(&device).unwrap()).unwrap();

    let total: u32 = parsed.zones.iter().map(|z| z.led_count).sum();
    assert!(total as usize <= parsed.leds.len());

    for (i, a) in parsed.zones.iter().enumerate() {
        for b in parsed.zones.iter().skip(i + 1) {
            let (ra, rb) = (a.led_range(), b.led_range());
            let disjoint = ra.is_empty() || rb.is_empty() || ra.end <= rb.start || rb.end <= ra.start;
            assert!(disjoint, "{} and {} overlap", a.name, b.name);
        }
    }
}

#[test]
fn test_zone_out_of_range_rejected() {
    let mut device = sample_device("Board", &[("A", 4)]);
    device.zones[0].led_count = 5;

    assert!(matches!(
        expect_parse_error(parse_device(0, &encode_device(&device).unwrap())),
        ParseError::ZoneOutOfRange { .. }
    ));
}

#[test]
fn test_overlapping_zones_rejected() {
    let mut device = sample_device("Board", &[("A", 4), ("B", 4)]);
    device.zones[1].start_index = 2;
    device.zones[1].led_count = 4;

    match expect_parse_error(parse_device(0, &encode_device(&device).unwrap())) {
        ParseError::ZoneOverlap { first, second } => {
            assert_eq!(first, "A");
            assert_eq!(second, "B");
        }
        other => panic!("Expected ZoneOverlap, got {:?}", other),
    }
}

#[test]
fn test_trailing_unassigned_leds_allowed() {
    let mut device = sample_device("Board", &[("A", 4)]);
    device.zones[0].led_count = 2;

    let parsed = parse_device(0, &encode_device(&device).unwrap()).unwrap();
    assert_eq!(parsed.leds.len(), 4);
    assert_eq!(parsed.zones[0].led_range(), 0..2);
}
