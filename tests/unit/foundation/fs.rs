use super::*;
use std::io::Write as _;

#[test]
fn write_atomic_creates_missing_dirs() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("a").join("b").join("out.bin");
    write_atomic(&target, b"hello").unwrap();
    assert_eq!(std::fs::read(&target).unwrap(), b"hello");
}

#[test]
fn write_atomic_replaces_existing_file() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("book.json");
    std::fs::write(&target, b"old").unwrap();
    write_atomic(&target, b"new").unwrap();
    assert_eq!(std::fs::read(&target).unwrap(), b"new");
}

#[test]
fn failed_fill_leaves_target_and_no_temp_files() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("book.pdf");
    std::fs::write(&target, b"previous").unwrap();

    let err = write_atomic_with(&target, |f| {
        f.write_all(b"partial")?;
        Err(std::io::Error::other("encoder died"))
    })
    .unwrap_err();
    assert_eq!(err.kind(), "io_failure");

    assert_eq!(std::fs::read(&target).unwrap(), b"previous");
    let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
