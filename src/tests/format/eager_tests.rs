//! Tests for the whole-blob decoder.

use std::io::Cursor;

use crate::error::BlobError;
use crate::format::decode_eager;

#[test]
fn eager_decode_keeps_blob_order_and_payloads() {
    let entries = decode_eager(Cursor::new(r#"{"b": {"x": 1}, "a": [true], "c": null}"#))
        .expect("valid blob");

    let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["b", "a", "c"]);
    assert_eq!(entries[0].1.get(), r#"{"x":1}"#);
    assert_eq!(entries[1].1.get(), "[true]");
    assert_eq!(entries[2].1.get(), "null");
}

#[test]
fn eager_decode_keeps_last_duplicate() {
    let entries = decode_eager(Cursor::new(r#"{"a": 1, "b": 2, "a": 3}"#)).expect("valid blob");

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0, "a");
    assert_eq!(entries[0].1.get(), "3");
}

#[test]
fn eager_decode_rejects_non_mapping_root() {
    let err = decode_eager(Cursor::new("[1, 2]")).expect_err("list root");
    assert!(matches!(err, BlobError::NotAMapping));
}

#[test]
fn eager_decode_rejects_malformed_input() {
    let err = decode_eager(Cursor::new(r#"{"a": 1"#)).expect_err("truncated");
    assert!(matches!(err, BlobError::Malformed { .. }), "{err:?}");

    let err = decode_eager(Cursor::new(r#"{"a": 1} 2"#)).expect_err("trailing data");
    assert!(matches!(err, BlobError::Malformed { .. }), "{err:?}");
}
