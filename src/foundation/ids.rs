use crate::foundation::error::{BookError, BookResult};

const MAX_ID_LEN: usize = 128;

/// Validate a book or user identifier before it is joined onto a filesystem path.
///
/// Accepted: 1..=128 ASCII letters, digits, `_` or `-`.
pub fn validate_id(what: &str, id: &str) -> BookResult<()> {
    if id.is_empty() {
        return Err(BookError::invalid_input(format!("{what} must be non-empty")));
    }
    if id.len() > MAX_ID_LEN {
        return Err(BookError::invalid_input(format!(
            "{what} must be at most {MAX_ID_LEN} characters"
        )));
    }
    if let Some(bad) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(BookError::invalid_input(format!(
            "{what} '{id}' contains invalid character {bad:?}"
        )));
    }
    Ok(())
}

/// Normalize and validate a book-relative file path taken from a URL.
///
/// The result uses `/` separators, drops `.` and empty segments, and rejects parent traversals.
pub fn normalize_rel_path(source: &str) -> BookResult<String> {
    let s = source.replace('\\', "/");
    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(BookError::invalid_input("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(BookError::invalid_input(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/ids.rs"]
mod tests;
