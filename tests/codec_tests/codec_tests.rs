//! Tests for Encoder / Decoder and RowSpec
//!
//! These tests verify:
//! - Little-endian fixed-width encoding
//! - String and byte padding / truncation
//! - Overrun detection instead of panics
//! - Schema JSON shape and validation

use serialtable::{Column, ColumnType, Decoder, Encoder, RowSpec, TableError};

// =============================================================================
// Encoder Tests
// =============================================================================

#[test]
fn test_integers_are_little_endian() {
    let mut buf = [0u8; 14];
    let mut enc = Encoder::new(&mut buf);
    enc.encode_u16(0x0102).unwrap();
    enc.encode_u32(0x0304_0506).unwrap();
    enc.encode_i64(-2).unwrap();
    assert_eq!(enc.remaining(), 0);

    assert_eq!(&buf[..2], &[0x02, 0x01]);
    assert_eq!(&buf[2..6], &[0x06, 0x05, 0x04, 0x03]);
    assert_eq!(&buf[6..], &[0xfe, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
}

#[test]
fn test_string_is_zero_padded() {
    let mut buf = [0xAAu8; 8];
    Encoder::new(&mut buf).encode_string_padded("AAPL", 8).unwrap();
    assert_eq!(&buf, b"AAPL\0\0\0\0");
}

#[test]
fn test_string_is_truncated() {
    let mut buf = [0u8; 4];
    Encoder::new(&mut buf).encode_string_padded("ABCDEFGH", 4).unwrap();
    assert_eq!(&buf, b"ABCD");
}

#[test]
fn test_string_truncation_keeps_utf8_boundary() {
    // "é" is two bytes; cutting at 2 would split it
    let mut buf = [0u8; 2];
    Encoder::new(&mut buf).encode_string_padded("aé", 2).unwrap();
    assert_eq!(&buf, b"a\0");

    let decoded = Decoder::new(&buf).decode_string_padded(2).unwrap();
    assert_eq!(decoded, "a");
}

#[test]
fn test_bytes_padded_and_truncated() {
    let mut buf = [0xFFu8; 6];
    let mut enc = Encoder::new(&mut buf);
    enc.encode_bytes_padded(&[1, 2], 3).unwrap();
    enc.encode_bytes_padded(&[7, 8, 9, 10], 3).unwrap();
    assert_eq!(buf, [1, 2, 0, 7, 8, 9]);
}

#[test]
fn test_encoder_overrun_is_error() {
    let mut buf = [0u8; 3];
    let mut enc = Encoder::new(&mut buf);
    let err = enc.encode_u32(1).unwrap_err();
    assert!(matches!(err, TableError::Schema(_)));
    // Cursor did not move
    assert_eq!(enc.position(), 0);
}

// =============================================================================
// Decoder Tests
// =============================================================================

#[test]
fn test_decode_sequence() {
    let mut buf = [0u8; 8 + 4 + 1 + 8];
    {
        let mut enc = Encoder::new(&mut buf);
        enc.encode_string_padded("MSFT", 8).unwrap();
        enc.encode_u32(1200).unwrap();
        enc.encode_bool(true).unwrap();
        enc.encode_f64(-1.5).unwrap();
    }

    let mut dec = Decoder::new(&buf);
    assert_eq!(dec.decode_string_padded(8).unwrap(), "MSFT");
    assert_eq!(dec.decode_u32().unwrap(), 1200);
    assert!(dec.decode_bool().unwrap());
    assert_eq!(dec.decode_f64().unwrap(), -1.5);
    assert_eq!(dec.remaining(), 0);
}

#[test]
fn test_decode_bool_nonzero_is_true() {
    let buf = [0u8, 7u8];
    let mut dec = Decoder::new(&buf);
    assert!(!dec.decode_bool().unwrap());
    assert!(dec.decode_bool().unwrap());
}

#[test]
fn test_decode_invalid_utf8_is_error() {
    let buf = [0xC3u8, 0x28, 0, 0];
    let err = Decoder::new(&buf).decode_string_padded(4).unwrap_err();
    assert!(matches!(err, TableError::Schema(_)));
}

#[test]
fn test_decoder_overrun_is_error() {
    let buf = [0u8; 2];
    let err = Decoder::new(&buf).decode_u64().unwrap_err();
    assert!(matches!(err, TableError::Schema(_)));
}

// =============================================================================
// RowSpec Tests
// =============================================================================

#[test]
fn test_row_size_sums_columns() {
    let spec = RowSpec::new([
        ColumnType::Str.column_sized("symbol", 8),
        ColumnType::U32.column("price"),
        ColumnType::Bool.column("flag"),
    ]);
    assert_eq!(spec.row_size(), 13);
    assert_eq!(spec.offsets(), vec![0, 8, 12]);
}

#[test]
fn test_default_sizes() {
    assert_eq!(ColumnType::U8.default_size(), 1);
    assert_eq!(ColumnType::I16.default_size(), 2);
    assert_eq!(ColumnType::F32.default_size(), 4);
    assert_eq!(ColumnType::U64.default_size(), 8);
    assert_eq!(ColumnType::Bool.default_size(), 1);
}

#[test]
fn test_schema_json_round_trip() {
    let spec = RowSpec::new([
        ColumnType::Str.column_sized("symbol", 8),
        ColumnType::U32.column("price"),
    ]);
    let bytes = spec.to_header_bytes().unwrap();
    let json = String::from_utf8(bytes.clone()).unwrap();
    assert_eq!(
        json,
        r#"[{"name":"symbol","type":"str","size":8},{"name":"price","type":"u32","size":4}]"#
    );
    assert_eq!(RowSpec::from_header_bytes(&bytes).unwrap(), spec);
}

#[test]
fn test_validate_rejects_bad_columns() {
    assert!(RowSpec::new([]).validate().is_err());
    assert!(RowSpec::new([Column::with_size("s", ColumnType::Str, 0)])
        .validate()
        .is_err());
    assert!(RowSpec::new([Column::with_size("n", ColumnType::U32, 3)])
        .validate()
        .is_err());
    assert!(RowSpec::new([ColumnType::Bin.column_sized("blob", 16)])
        .validate()
        .is_ok());
}

#[test]
fn test_column_type_from_str() {
    assert_eq!("u32".parse::<ColumnType>().unwrap(), ColumnType::U32);
    assert_eq!("str".parse::<ColumnType>().unwrap(), ColumnType::Str);
    assert!("u128".parse::<ColumnType>().is_err());
}
