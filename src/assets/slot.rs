use std::fmt;

use crate::foundation::error::{BookError, BookResult};
use crate::manifest::model::EditTarget;

/// The cover or one numbered page of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetSlot {
    /// Book cover (page 0 in legacy callers).
    Cover,
    /// 1-based page.
    Page(u32),
}

impl AssetSlot {
    /// Slot for a legacy page number where `0` means the cover.
    pub fn from_page_number(page: u32) -> Self {
        if page == 0 { Self::Cover } else { Self::Page(page) }
    }

    /// Slot named by an edit `target` plus optional `page`.
    pub fn from_target(target: EditTarget, page: Option<u32>) -> BookResult<Self> {
        match (target, page) {
            (EditTarget::Cover, _) => Ok(Self::Cover),
            (EditTarget::Page, Some(p)) if p >= 1 => Ok(Self::Page(p)),
            (EditTarget::Page, Some(p)) => Err(BookError::invalid_input(format!(
                "page number must be >= 1, got {p}"
            ))),
            (EditTarget::Page, None) => Err(BookError::invalid_input(
                "page edits must name a page number",
            )),
        }
    }

    /// File stem used by the generator: `cover` or `page_NN`.
    pub fn stem(self) -> String {
        match self {
            Self::Cover => "cover".to_string(),
            Self::Page(n) => format!("page_{n:02}"),
        }
    }
}

impl fmt::Display for AssetSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cover => f.write_str("cover"),
            Self::Page(n) => write!(f, "page {n}"),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/slot.rs"]
mod tests;
