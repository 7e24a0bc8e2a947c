//! Tests for the error taxonomy.

use std::io;

use crate::error::{BlobError, StopSignal, bare_message};

#[test]
fn display_messages() {
    assert_eq!(
        BlobError::NotAMapping.to_string(),
        "blob does not contain a single top-level associative container"
    );
    assert_eq!(
        BlobError::Configuration("bad".into()).to_string(),
        "Configuration error: bad"
    );
    assert_eq!(
        BlobError::payload("h1", &"boom").to_string(),
        "failed to decode entry 'h1': boom"
    );
    assert_eq!(BlobError::WorkerPanicked.to_string(), "decode worker panicked");
}

#[test]
fn format_errors_are_classified() {
    assert!(BlobError::NotAMapping.is_format_error());
    assert!(
        BlobError::Malformed {
            line: 1,
            column: 2,
            message: "x".into()
        }
        .is_format_error()
    );
    assert!(!BlobError::payload("k", &"x").is_format_error());
    assert!(!BlobError::Configuration("x".into()).is_format_error());
}

#[test]
fn decoder_errors_map_onto_the_taxonomy() {
    let data = serde_json::from_str::<Vec<i32>>("{}").expect_err("type mismatch");
    assert!(matches!(BlobError::from_json(data, false), BlobError::NotAMapping));

    let data = serde_json::from_str::<Vec<i32>>("{}").expect_err("type mismatch");
    assert!(matches!(BlobError::from_json(data, true), BlobError::Malformed { .. }));

    let eof = serde_json::from_str::<serde_json::Value>("{\"a\":").expect_err("eof");
    match BlobError::from_json(eof, false) {
        BlobError::Malformed { line, column, .. } => assert!(line == 1 && column > 0),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn io_errors_keep_their_kind() {
    let err: BlobError = io::Error::new(io::ErrorKind::PermissionDenied, "nope").into();
    match err {
        BlobError::Io(io) => assert_eq!(io.kind(), io::ErrorKind::PermissionDenied),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn stop_signal_round_trips_through_io_error() {
    let err = StopSignal.into_io_error();
    assert!(StopSignal::is_stop(&err));
    assert_ne!(err.kind(), io::ErrorKind::Interrupted);

    let other = io::Error::other("unrelated");
    assert!(!StopSignal::is_stop(&other));
    assert!(!StopSignal::is_stop(&io::Error::from(io::ErrorKind::UnexpectedEof)));
}

#[test]
fn cancellation_is_recognised() {
    assert!(BlobError::cancelled().is_cancellation());
    assert!(!BlobError::Io(io::Error::other("x")).is_cancellation());
    assert!(!BlobError::NotAMapping.is_cancellation());
}

#[test]
fn bare_message_drops_the_position() {
    let err = serde_json::from_str::<i64>("\"x\"").expect_err("type mismatch");
    assert!(err.to_string().contains(" at line 1 column "), "{err}");
    assert_eq!(bare_message(&err), "invalid type: string \"x\", expected i64");
}

#[cfg(feature = "miette")]
#[test]
fn diagnostics_carry_help() {
    use crate::error::BlobDiagnostic;

    let diag = BlobDiagnostic::from(BlobError::NotAMapping);
    assert!(diag.help.is_some());
    assert_eq!(diag.message, BlobError::NotAMapping.to_string());

    let diag = BlobDiagnostic::from(BlobError::WorkerPanicked);
    assert!(diag.help.is_none());
}
