use super::*;

#[test]
fn accepts_plain_ids() {
    validate_id("book id", "b-123_x").unwrap();
    validate_id("user id", "U9").unwrap();
}

#[test]
fn rejects_traversal_and_separators() {
    for bad in ["", "..", "a/b", "a\\b", "a.b", "espaço", &"x".repeat(129)] {
        let err = validate_id("book id", bad).unwrap_err();
        assert_eq!(err.kind(), "invalid_input", "{bad:?}");
    }
}

#[test]
fn normalize_path_cross_platform() {
    assert_eq!(normalize_rel_path("edited/page_03.png").unwrap(), "edited/page_03.png");
    assert_eq!(normalize_rel_path("edited\\cover.png").unwrap(), "edited/cover.png");
    assert_eq!(normalize_rel_path("/./cover.png").unwrap(), "cover.png");
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("//").is_err());
}
