use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{BookError, BookResult};
use crate::foundation::ids;

/// Generation lifecycle of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    /// Manifest written, generation not started.
    #[default]
    Created,
    /// The external generator is producing images.
    Generating,
    /// All base images exist.
    Done,
    /// Generation failed; see `error`.
    Failed,
}

/// One immutable base page image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    /// 1-based page number.
    pub page: u32,
    /// Public URL of the generated image.
    pub url: String,
}

/// User edits layered over the base images. Never mutates `images`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overrides {
    /// Replacement cover image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// Text burned onto the current cover override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_text: Option<String>,
    /// Page text edits keyed by page number.
    #[serde(default, deserialize_with = "page_keys::deserialize")]
    pub pages_text: BTreeMap<u32, String>,
    /// Replacement page image URLs keyed by page number.
    #[serde(default, deserialize_with = "page_keys::deserialize")]
    pub pages_image_url: BTreeMap<u32, String>,
    /// Explicit per-page card titles.
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "page_keys::deserialize"
    )]
    pub pages_title: BTreeMap<u32, String>,
}

/// Audit record appended for every committed edit batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditLogEntry {
    /// Commit time (RFC 3339).
    pub at: String,
    /// Editing user, `anonymous` when unknown.
    pub user_id: String,
    /// Edit counts and targets. Never the raw text.
    pub summary: String,
}

/// Target of an edit or image-replacement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditTarget {
    /// The book cover.
    Cover,
    /// A numbered page; the page number travels next to the target.
    Page,
}

/// Fulfilment state of a queued image-replacement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Waiting for the external fulfiller.
    #[default]
    Pending,
    /// Replacement produced and applied.
    Fulfilled,
    /// Declined by the fulfiller.
    Rejected,
}

/// Externally fulfilled image-replacement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEditRequest {
    /// Request identifier.
    pub id: String,
    /// Creation time (RFC 3339).
    pub at: String,
    /// Cover or page.
    pub target: EditTarget,
    /// Page number when `target` is `page`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Free-form instruction for the fulfiller.
    pub instruction: String,
    /// Image the instruction refers to.
    pub image_url: String,
    /// Fulfilment state.
    #[serde(default)]
    pub status: RequestStatus,
}

/// Per-page entry of the structured story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryPage {
    /// 1-based page number.
    pub page: u32,
    /// Page title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Page text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Structured story produced by the generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    /// Story title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Per-page entries.
    #[serde(default)]
    pub pages: Vec<StoryPage>,
}

/// A book's JSON state document (`book.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Stable book identifier.
    pub id: String,
    /// Folder name on disk; may differ from `id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir_id: Option<String>,
    /// Generation status.
    #[serde(default)]
    pub status: BookStatus,
    /// Free-text generation step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    /// Free-text generation error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Story theme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Illustration style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Name of the child the book is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_name: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last save time, stamped by [`crate::ManifestStore::save`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Immutable base page list.
    #[serde(default)]
    pub images: Vec<PageImage>,
    /// User edits layered over `images`.
    #[serde(default)]
    pub overrides: Overrides,
    /// Append-only audit trail.
    #[serde(default)]
    pub edits_log: Vec<EditLogEntry>,
    /// Queue of externally fulfilled image-replacement requests.
    #[serde(default)]
    pub image_edit_requests: Vec<ImageEditRequest>,
    /// Book title chosen by the generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Structured story.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<Story>,
    /// Fields owned by other writers, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Manifest {
    /// Check the identifiers and that page numbers are unique and positive.
    ///
    /// `id` and `dirId` end up in file names, so both must be plain ids.
    pub fn validate(&self) -> BookResult<()> {
        ids::validate_id("book id", &self.id)
            .map_err(|e| BookError::corrupt(format!("manifest id: {e}")))?;
        if let Some(dir_id) = &self.dir_id {
            ids::validate_id("book folder", dir_id)
                .map_err(|e| BookError::corrupt(format!("manifest dirId: {e}")))?;
        }
        let mut seen = BTreeSet::new();
        for img in &self.images {
            if img.page == 0 {
                return Err(BookError::corrupt(format!(
                    "book '{}' lists an image with page 0",
                    self.id
                )));
            }
            if !seen.insert(img.page) {
                return Err(BookError::corrupt(format!(
                    "book '{}' lists page {} more than once",
                    self.id, img.page
                )));
            }
        }
        if self.overrides.pages_text.contains_key(&0)
            || self.overrides.pages_image_url.contains_key(&0)
        {
            return Err(BookError::corrupt(format!(
                "book '{}' has overrides for page 0",
                self.id
            )));
        }
        Ok(())
    }

    /// Base image URL for `page`.
    pub fn base_page_url(&self, page: u32) -> Option<&str> {
        self.images
            .iter()
            .find(|img| img.page == page)
            .map(|img| img.url.as_str())
    }

    /// Ascending union of page numbers from `images`, `pagesText` and `pagesImageUrl`.
    pub fn page_numbers(&self) -> Vec<u32> {
        let mut pages: BTreeSet<u32> = self.images.iter().map(|img| img.page).collect();
        pages.extend(self.overrides.pages_text.keys().copied());
        pages.extend(self.overrides.pages_image_url.keys().copied());
        pages.into_iter().collect()
    }

    /// Effective URL for `page`: override first, base second.
    pub fn effective_page_url(&self, page: u32) -> Option<&str> {
        self.overrides
            .pages_image_url
            .get(&page)
            .map(String::as_str)
            .or_else(|| self.base_page_url(page))
    }

    /// Title used for the cover card.
    pub fn book_title(&self) -> String {
        non_blank(self.title.as_deref())
            .or_else(|| self.story.as_ref().and_then(|s| non_blank(s.title.as_deref())))
            .map(str::to_string)
            .unwrap_or_else(|| match non_blank(self.child_name.as_deref()) {
                Some(name) => format!("A Aventura de {name}"),
                None => "A Aventura".to_string(),
            })
    }

    /// Title used for the card on `page`.
    pub fn page_title(&self, page: u32) -> String {
        let explicit = self.overrides.pages_title.get(&page).map(String::as_str);
        let story = self.story.as_ref().and_then(|s| {
            s.pages
                .iter()
                .find(|p| p.page == page)
                .and_then(|p| p.title.as_deref())
        });
        non_blank(explicit)
            .or_else(|| non_blank(story))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Página {page}"))
    }
}

// JSON object keys are strings; parse them here because the flattened manifest is buffered
// before `Overrides` sees it, and buffered content does not coerce string keys to integers.
mod page_keys {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, de::Error as _};

    pub(super) fn deserialize<'de, D>(d: D) -> Result<BTreeMap<u32, String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        BTreeMap::<String, String>::deserialize(d)?
            .into_iter()
            .map(|(k, v)| {
                k.trim()
                    .parse::<u32>()
                    .map(|page| (page, v))
                    .map_err(|_| D::Error::custom(format!("invalid page key '{k}'")))
            })
            .collect()
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "../../tests/unit/manifest/model.rs"]
mod tests;
