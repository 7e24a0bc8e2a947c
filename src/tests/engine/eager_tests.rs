//! Tests for the eager backend and the path-based entry points.

use std::io::{Cursor, Write};

use tempfile::NamedTempFile;

use crate::config::ReadOptions;
use crate::engine::{
    Materialized, iterate_lazy, iterate_lazy_from_reader, iterate_lazy_with,
    iterate_or_materialize, iterate_or_materialize_from_reader,
};
use crate::error::BlobError;
use crate::io::{InMemorySource, compressed_writer};
use crate::tests::support::{FailingReader, Hist, abc_blob, eager, instrumented_hist};

fn reader(json: &str) -> Cursor<Vec<u8>> {
    Cursor::new(json.as_bytes().to_vec())
}

fn blob_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(json.as_bytes()).expect("write blob");
    file
}

#[test]
fn eager_backend_yields_every_entry_in_order() {
    let entries = iterate_lazy_from_reader::<_, String, Hist>(reader(&abc_blob()), &eager())
        .expect("blob decodes");
    assert!(!entries.is_streaming());
    assert_eq!(entries.session_state(), None);
    assert_eq!(entries.size_hint(), (3, Some(3)));

    let keys: Vec<String> = entries
        .map(|entry| entry.map(|(key, _)| key))
        .collect::<Result<_, _>>()
        .expect("entries");
    assert_eq!(keys, vec!["a", "b", "c"]);
}

#[test]
fn eager_backend_filters_empty_entries() {
    let options = eager().with_allow_empty(false);
    let keys: Vec<String> =
        iterate_lazy_from_reader::<_, String, Hist>(reader(&abc_blob()), &options)
            .expect("blob decodes")
            .map(|entry| entry.map(|(key, _)| key))
            .collect::<Result<_, _>>()
            .expect("entries");

    assert_eq!(keys, vec!["a", "c"]);
}

#[test]
fn eager_lazy_proxies_defer_decoding() {
    instrumented_hist!(Probe);

    let entries: Vec<_> =
        iterate_lazy_from_reader::<_, String, Probe>(reader(&abc_blob()), &eager())
            .expect("blob decodes")
            .collect::<Result<_, _>>()
            .expect("entries");
    assert_eq!(DECODES.load(std::sync::atomic::Ordering::SeqCst), 0);

    let (_, c) = &entries[2];
    assert_eq!(c.get().expect("decodes").payload, 2);
    assert_eq!(DECODES.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[test]
fn eager_errors_are_raised_at_call_time() {
    let err = iterate_lazy_from_reader::<_, String, Hist>(reader("[1, 2]"), &eager())
        .expect_err("list root");
    assert!(matches!(err, BlobError::NotAMapping));

    let err = iterate_lazy_from_reader::<_, String, Hist>(reader(r#"{"a": "#), &eager())
        .expect_err("truncated");
    assert!(err.is_format_error());

    let err = iterate_lazy_from_reader::<_, String, Hist>(
        FailingReader::new(r#"{"a": {"payload": 1}, "#),
        &eager(),
    )
    .expect_err("source fails");
    assert!(matches!(err, BlobError::Io(_)), "{err:?}");
}

#[test]
fn materialize_eager_returns_an_ordered_map() {
    let options = eager().with_allow_empty(false).with_materialize("EAGER");
    let result =
        iterate_or_materialize_from_reader::<_, String, Hist>(reader(&abc_blob()), &options)
            .expect("blob decodes");

    let map = result.as_map().expect("eager mode returns a map");
    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["a", "c"]);
    assert_eq!(map["c"], Hist::new(2, false));
}

#[test]
fn materialize_keeps_the_last_duplicate() {
    let json = r#"{"a": {"payload": 1}, "b": {"payload": 2}, "a": {"payload": 3}}"#;
    let options = ReadOptions::default().with_materialize(true);
    let map = iterate_or_materialize_from_reader::<_, String, Hist>(reader(json), &options)
        .expect("blob decodes")
        .into_map()
        .expect("map");

    assert_eq!(map.len(), 2);
    assert_eq!(map.get_index(0).map(|(k, v)| (k.as_str(), v.payload)), Some(("a", 3)));
}

#[test]
fn materialize_lazy_returns_entries() {
    let options = eager().with_materialize(false);
    let result =
        iterate_or_materialize_from_reader::<_, String, Hist>(reader(&abc_blob()), &options)
            .expect("blob decodes");

    assert!(result.as_map().is_none());
    let map = result.into_map().expect("drains entries");
    assert_eq!(map.len(), 3);
}

#[test]
fn invalid_materialize_mode_fails_before_opening_the_file() {
    let err = iterate_or_materialize::<String, Hist>(
        "/definitely/not/here.json.gz",
        true,
        "sometimes",
    )
    .expect_err("bad mode");

    match err {
        BlobError::Configuration(msg) => assert!(msg.contains("sometimes"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let err = iterate_lazy::<String, Hist>("/definitely/not/here.json.gz", true)
        .expect_err("missing file");
    match err {
        BlobError::Io(io) => assert_eq!(io.kind(), std::io::ErrorKind::NotFound),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn path_entry_points_read_plain_and_gzip_files() {
    let plain = blob_file(&abc_blob());
    let map = iterate_or_materialize::<String, Hist>(plain.path(), false, true)
        .expect("plain blob")
        .into_map()
        .expect("map");
    assert_eq!(map.len(), 2);

    let mut gz = NamedTempFile::new().expect("temp file");
    {
        let mut writer = compressed_writer(gz.as_file_mut());
        writer.write_all(abc_blob().as_bytes()).expect("compress");
        writer.finish().expect("finish gzip");
    }
    let count = iterate_lazy::<String, Hist>(gz.path(), true)
        .expect("gzip blob")
        .count();
    assert_eq!(count, 3);
}

#[test]
fn sources_can_be_reopened() {
    let source = InMemorySource::from_string("abc", abc_blob());
    let options = eager();

    for _ in 0..2 {
        let entries = iterate_lazy_with::<_, String, Hist>(&source, &options).expect("opens");
        assert_eq!(entries.count(), 3);
    }
}

#[test]
fn close_discards_remaining_eager_entries() {
    let mut entries = iterate_lazy_from_reader::<_, String, Hist>(reader(&abc_blob()), &eager())
        .expect("blob decodes");
    entries.next().expect("first").expect("decodes");
    entries.close();
    assert!(entries.next().is_none());
}

#[test]
fn materialized_map_is_matchable() {
    let options = eager().with_materialize(true);
    match iterate_or_materialize_from_reader::<_, String, Hist>(reader("{}"), &options) {
        Ok(Materialized::Map(map)) => assert!(map.is_empty()),
        other => panic!("unexpected result: {other:?}"),
    }
}
