//! Packet decoding against hand-built byte buffers

mod common;

use pretty_assertions::assert_eq;
use puflab_core::model::{Board, BoardSpecifier, Uid};
use puflab_core::protocol::{check, decode, encode, PacketBuilder, PacketError, MIN_PACKET_SIZE};

/// Header + 0x400 bytes of fingerprint + terminator, as the F401RE firmware sends it
fn firmware_packet() -> Vec<u8> {
    let mut buf = vec![0xE5, 0x55, 0x01, 0xEB];
    buf.extend_from_slice(&[0u8; 12]); // uid
    buf.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]); // specifier
    buf.extend_from_slice(&[0x00, 0x50, 0x00, 0x20]); // start 0x20005000
    buf.extend_from_slice(&[0x00, 0x54, 0x00, 0x20]); // end 0x20005400
    buf.extend_from_slice(&[0xA8, 0x61, 0x00, 0x00]); // 25000 m°C
    buf.extend((0..0x400).map(|i| (i % 251) as u8));
    buf.extend_from_slice(&[0x00, 0x00]);
    buf
}

#[test]
fn test_decode_firmware_packet() {
    let packet = firmware_packet();
    let (board, reading) = decode(&packet).unwrap();

    assert_eq!(board.specifier(), BoardSpecifier::NucleoF401RE);
    assert_eq!(board.uid(), Uid::new(0, 0, 0));
    assert_eq!(reading.puf_start(), 0x2000_5000);
    assert_eq!(reading.puf_end(), 0x2000_5400);
    assert_eq!(reading.temperature(), 25.0);
    assert_eq!(reading.fingerprint().len(), 1024);
    assert_eq!(reading.fingerprint()[251], 0);
    assert_eq!(reading.fingerprint()[1023], (1023 % 251) as u8);
}

#[test]
fn test_bad_start() {
    let mut packet = firmware_packet();
    packet[0] = 0xE4;
    assert_eq!(decode(&packet).unwrap_err(), PacketError::Protocol("bad start"));
}

#[test]
fn test_bad_end() {
    let mut packet = firmware_packet();
    let len = packet.len();
    packet[len - 2] = 0x01;
    assert_eq!(decode(&packet).unwrap_err(), PacketError::Protocol("bad end"));
    assert!(check(&packet).is_err());
}

#[test]
fn test_too_short() {
    let packet = firmware_packet();
    for len in [0, 1, 31, MIN_PACKET_SIZE - 1] {
        assert_eq!(
            decode(&packet[..len]).unwrap_err(),
            PacketError::Size {
                expected: MIN_PACKET_SIZE,
                actual: len
            }
        );
    }
}

#[test]
fn test_truncated_fingerprint() {
    let packet = firmware_packet();
    let err = decode(&packet[..100]).unwrap_err();
    assert_eq!(
        err,
        PacketError::Size {
            expected: packet.len(),
            actual: 100
        }
    );
}

#[test]
fn test_trailing_bytes_ignored() {
    let packet = firmware_packet();
    let mut padded = packet.clone();
    padded.extend_from_slice(&[0xE5, 0x55, 0x01, 0xEB, 0xFF, 0xFF]);

    let (board_a, reading_a) = decode(&packet).unwrap();
    let (board_b, reading_b) = decode(&padded).unwrap();
    assert_eq!(board_a, board_b);
    assert!(reading_a.same_measurement(&reading_b));
}

#[test]
fn test_decode_is_deterministic() {
    let packet = firmware_packet();
    let (_, first) = decode(&packet).unwrap();
    let (_, second) = decode(&packet).unwrap();
    assert!(first.same_measurement(&second));
}

#[test]
fn test_range_errors_name_the_field() {
    let board = Board::new(BoardSpecifier::Default, Uid::new(1, 2, 3));
    let base = || PacketBuilder::new(&board).addresses(0x100, 0x108).fingerprint(&[0; 8]);

    let cases = [
        (base().addresses_raw(-8, 0).build(), "puf_start"),
        (base().addresses_raw(0x100, -1).build(), "puf_end"),
        (base().addresses_raw(0x108, 0x100).build(), "puf_end"),
        (base().specifier_raw(3).build(), "board_specifier"),
        (base().temperature(-300.0).build(), "temperature"),
        (base().temperature(250.5).build(), "temperature"),
    ];
    for (packet, field) in cases {
        let err = decode(&packet).unwrap_err();
        assert!(matches!(err, PacketError::Range(_)), "{:?}", err);
        assert_eq!(err.field(), Some(field));
    }
}

#[test]
fn test_temperature_boundaries() {
    let board = Board::new(BoardSpecifier::NucleoF446RE, Uid::new(9, 9, 9));
    let packet = |celsius: f64| {
        PacketBuilder::new(&board)
            .addresses(0, 8)
            .temperature(celsius)
            .fingerprint(&[0xFF; 8])
            .build()
    };
    assert_eq!(decode(&packet(250.0)).unwrap().1.temperature(), 250.0);
    assert_eq!(decode(&packet(-272.999)).unwrap().1.temperature(), -272.999);
    assert!(decode(&packet(-273.0)).is_err());
}

#[test]
fn test_encode_decode() {
    let board = common::test_board();
    let reading = common::reading(vec![0x5A; 64]);
    let (decoded_board, decoded) = decode(&encode(&board, &reading)).unwrap();
    assert_eq!(decoded_board, board);
    assert!(decoded.same_measurement(&reading));
}
