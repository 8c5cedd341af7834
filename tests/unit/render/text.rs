use super::*;

#[test]
fn escapes_markup() {
    assert_eq!(
        escape_xml(r#"<b>Tom & "Jerry"</b>'s"#),
        "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;&apos;s"
    );
    assert_eq!(escape_xml("a\u{0007}b"), "ab");
}

#[test]
fn chars_per_line_uses_glyph_estimate() {
    // 132 / (22 * 0.6) = 10
    assert_eq!(max_chars_per_line(132.0, 22.0), 10);
    assert_eq!(max_chars_per_line(10.0, 0.0), 1);
}

#[test]
fn chars_per_line_is_exact_on_boundaries() {
    for (chars, size) in [(10usize, 22.0f64), (12, 20.0), (25, 40.0), (5, 30.0)] {
        let width = chars as f64 * size * 6.0 / 10.0;
        assert_eq!(max_chars_per_line(width, size), chars, "size {size}");
        assert_eq!(max_chars_per_line(width - 0.5, size), chars - 1, "size {size}");
    }
}

#[test]
fn wraps_greedily() {
    let lines = wrap_lines("era uma vez um dragão muito simpático", 12, 5);
    assert_eq!(lines, vec!["era uma vez", "um dragão", "muito", "simpático"]);
    assert!(lines.iter().all(|l| l.chars().count() <= 12));
}

#[test]
fn splits_overlong_words() {
    let lines = wrap_lines("abcdefghijkl xy", 5, 5);
    assert_eq!(lines, vec!["abcde", "fghij", "kl xy"]);
}

#[test]
fn overflow_truncates_last_line_with_ellipsis() {
    let text = "one two three four five six seven eight nine ten eleven twelve";
    let lines = wrap_lines(text, 9, 3);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "one two");
    assert_eq!(lines[1], "three");
    assert!(lines[2].ends_with('…'));
    assert!(lines[2].chars().count() <= 9);
}

#[test]
fn exactly_fitting_text_has_no_ellipsis() {
    let lines = wrap_lines("aa bb cc dd ee", 2, 5);
    assert_eq!(lines, vec!["aa", "bb", "cc", "dd", "ee"]);
}

#[test]
fn blank_text_wraps_to_nothing() {
    assert!(wrap_lines("   \n ", 10, 5).is_empty());
}
