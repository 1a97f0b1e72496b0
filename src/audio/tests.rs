use std::fs;

use super::sink::open_decoder;
use super::types::EngineError;

#[test]
fn missing_file_is_an_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.mp3");

    let err = open_decoder(&path).err().unwrap();
    match &err {
        EngineError::Open { path: p, .. } => assert_eq!(p, &path),
        other => panic!("expected Open, got {other:?}"),
    }
    assert!(err.to_string().contains("gone.mp3"));
}

#[test]
fn garbage_file_is_a_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise.mp3");
    fs::write(&path, b"definitely not audio").unwrap();

    assert!(matches!(
        open_decoder(&path),
        Err(EngineError::Decode { .. })
    ));
}
