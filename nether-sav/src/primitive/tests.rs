//! Tests for the leaf value codec

use super::*;
use crate::error::SavError;

fn reader(bytes: &[u8]) -> ByteReader<&[u8]> {
    ByteReader::new(bytes)
}

#[test]
fn test_empty_string_is_zero_length() {
    let mut w = ByteWriter::new();
    w.write_string("");
    assert_eq!(w.as_slice(), &[0, 0, 0, 0]);
}

#[test]
fn test_ascii_string_single_byte_path() {
    let mut w = ByteWriter::new();
    w.write_string("None");
    assert_eq!(w.as_slice(), &[5, 0, 0, 0, b'N', b'o', b'n', b'e', 0]);

    let mut r = reader(w.as_slice());
    assert_eq!(r.read_string().unwrap(), "None");
    assert_eq!(r.position(), 9);
}

#[test]
fn test_non_ascii_string_utf16_path() {
    let mut w = ByteWriter::new();
    w.write_string("Été");
    // 3 UTF-16 units -> prefix -(3 + 1)
    assert_eq!(&w.as_slice()[0..4], &(-4i32).to_le_bytes());
    assert_eq!(&w.as_slice()[4..6], &0x00C9u16.to_le_bytes());
    assert_eq!(&w.as_slice()[w.len() - 2..], &[0, 0]);
    assert_eq!(w.len(), 4 + 3 * 2 + 2);

    let mut r = reader(w.as_slice());
    assert_eq!(r.read_string().unwrap(), "Été");
}

#[test]
fn test_surrogate_pair_roundtrip() {
    let mut w = ByteWriter::new();
    w.write_string("ore 🪨");
    let mut r = reader(w.as_slice());
    assert_eq!(r.read_string().unwrap(), "ore 🪨");
}

#[test]
fn test_string_missing_terminator() {
    let bytes = [3, 0, 0, 0, b'a', b'b', b'c'];
    let err = reader(&bytes).read_string().unwrap_err();
    assert!(matches!(err, SavError::CorruptData(_)));
}

#[test]
fn test_single_byte_string_must_be_ascii() {
    let bytes = [5, 0, 0, 0, b'c', b'a', b'f', 0xE9, 0];
    let err = reader(&bytes).read_string().unwrap_err();
    assert!(matches!(err, SavError::CorruptData(_)));
}

#[test]
fn test_string_length_out_of_range() {
    let bytes = i32::MIN.to_le_bytes();
    let err = reader(&bytes).read_string().unwrap_err();
    assert!(matches!(err, SavError::CorruptData(_)));
}

#[test]
fn test_i64_low_word_first() {
    let mut w = ByteWriter::new();
    w.write_i64(0x0000_0001_0000_0002);
    assert_eq!(w.as_slice(), &[2, 0, 0, 0, 1, 0, 0, 0]);

    let mut r = reader(w.as_slice());
    assert_eq!(r.read_i64().unwrap(), 0x0000_0001_0000_0002);
}

#[test]
fn test_position_survives_drain() {
    let mut w = ByteWriter::new();
    w.write_i32(1);
    w.write_i32(2);
    let start = w.span_start();
    let drained = w.drain_front(6);
    assert_eq!(drained.len(), 6);
    assert_eq!(w.len(), 2);
    assert_eq!(w.position(), 8);

    w.write_f32(1.5);
    assert_eq!(w.span_len(start), 4);
    assert_eq!(w.position(), 12);
}

#[test]
fn test_patch_span() {
    let mut w = ByteWriter::new();
    let slot = w.reserve_i32();
    let start = w.span_start();
    w.write_string("Hello");
    let len = w.patch_span(slot, start).unwrap();
    assert_eq!(len, 10);
    assert_eq!(&w.as_slice()[0..4], &10i32.to_le_bytes());
}

#[test]
fn test_read_bytes_short_input() {
    let err = reader(&[1, 2]).read_bytes(4).unwrap_err();
    assert!(matches!(err, SavError::Io(_)));
}

#[test]
fn test_read_count_negative() {
    let bytes = (-1i32).to_le_bytes();
    let err = reader(&bytes).read_count("object").unwrap_err();
    assert!(matches!(err, SavError::CorruptData(_)));
}

#[test]
fn test_floats_roundtrip() {
    let mut w = ByteWriter::new();
    w.write_f32(-2.5);
    w.write_f64(1.0e300);
    w.write_u8(7);
    let mut r = reader(w.as_slice());
    assert_eq!(r.read_f32().unwrap(), -2.5);
    assert_eq!(r.read_f64().unwrap(), 1.0e300);
    assert_eq!(r.read_u8().unwrap(), 7);
    assert_eq!(r.position(), 13);
}
