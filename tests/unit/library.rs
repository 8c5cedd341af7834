use super::*;

#[test]
fn outcome_shapes() {
    let ok = serde_json::to_value(ApiOutcome::success(&vec![1, 2])).unwrap();
    assert_eq!(ok, serde_json::json!({"ok": true, "data": [1, 2]}));

    let err = BookError::not_found("book 'x'");
    let failed = serde_json::to_value(ApiOutcome::failure(&err)).unwrap();
    assert_eq!(
        failed,
        serde_json::json!({"ok": false, "error": "not found: book 'x'", "kind": "not_found"})
    );
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = LibraryConfig::default();
    config.limits.max_text_edits = 0;
    assert_eq!(Library::new(config).unwrap_err().kind(), "invalid_input");
}

#[test]
fn bad_ids_fail_before_io() {
    let tmp = tempfile::tempdir().unwrap();
    let lib = Library::new(LibraryConfig::rooted_at(tmp.path())).unwrap();
    let err = lib.load_book(None, "../etc").unwrap_err();
    assert_eq!(err.kind(), "invalid_input");
    let err = lib.load_book(Some("a/b"), "b1").unwrap_err();
    assert_eq!(err.kind(), "invalid_input");
    assert!(lib.list_books(None).unwrap().is_empty());
}
