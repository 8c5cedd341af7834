//! Validating, staging and committing a batch of user edits.
//!
//! A batch is all-or-nothing: every check that needs no IO runs first, every base image is
//! resolved before anything is rendered, rendered images are staged under fresh names, and the
//! manifest is written exactly once. Any failure removes the staged images and leaves the
//! manifest untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assets::probe::DiskProbe;
use crate::assets::resolver;
use crate::assets::slot::AssetSlot;
use crate::assets::storage::BookLocation;
use crate::foundation::config::EditLimits;
use crate::foundation::error::{BookError, BookResult};
use crate::foundation::time;
use crate::manifest::model::{
    EditLogEntry, EditTarget, ImageEditRequest, Manifest, Overrides, RequestStatus,
};
use crate::manifest::store::ManifestStore;
use crate::render::overlay::OverlayRenderer;
use crate::render::pdf;

/// User id recorded for callers without one.
pub const ANONYMOUS_USER: &str = "anonymous";

/// New text for the cover or a page, burned onto a fresh copy of its clean base image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    /// Cover or page.
    pub target: EditTarget,
    /// Page number when `target` is `page`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Card body text.
    pub text: String,
}

/// Replacement image URL for the cover or a page. Stored as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEdit {
    /// Cover or page.
    pub target: EditTarget,
    /// Page number when `target` is `page`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Replacement image URL.
    pub new_url: String,
}

/// One edit call: text edits and image edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditBatch {
    /// Text edits, applied in order (a later edit of the same slot wins).
    pub text_edits: Vec<TextEdit>,
    /// Image edits, applied after text edits.
    pub image_edits: Vec<ImageEdit>,
}

/// A validated batch: one entry per slot, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPlan {
    /// Slots that get a regenerated card, with the trimmed body text.
    pub texts: Vec<(AssetSlot, String)>,
    /// Slots that get a replacement URL.
    pub images: Vec<(AssetSlot, String)>,
    /// Audit summary of what the caller asked for.
    pub summary: String,
}

/// Check quotas, targets, blank text and blank URLs, and collapse the batch into an [`EditPlan`].
///
/// Performs no IO. A slot that receives both kinds of edit keeps only the image edit, since the
/// replacement image supersedes any card rendered onto the old one.
pub fn validate_batch(batch: &EditBatch, limits: &EditLimits) -> BookResult<EditPlan> {
    if batch.text_edits.is_empty() && batch.image_edits.is_empty() {
        return Err(BookError::invalid_input("edit batch is empty"));
    }
    if batch.text_edits.len() > limits.max_text_edits {
        return Err(BookError::invalid_input(format!(
            "{} text edits requested, at most {} allowed per call",
            batch.text_edits.len(),
            limits.max_text_edits
        )));
    }
    if batch.image_edits.len() > limits.max_image_edits {
        return Err(BookError::invalid_input(format!(
            "{} image edits requested, at most {} allowed per call",
            batch.image_edits.len(),
            limits.max_image_edits
        )));
    }

    let mut text_slots = Vec::with_capacity(batch.text_edits.len());
    for (i, edit) in batch.text_edits.iter().enumerate() {
        let slot = AssetSlot::from_target(edit.target, edit.page)?;
        let text = edit.text.trim();
        if text.is_empty() {
            return Err(BookError::invalid_input(format!(
                "text edit #{} ({slot}) has blank text",
                i + 1
            )));
        }
        text_slots.push((slot, text.to_string()));
    }

    let mut image_slots = Vec::with_capacity(batch.image_edits.len());
    for (i, edit) in batch.image_edits.iter().enumerate() {
        let slot = AssetSlot::from_target(edit.target, edit.page)?;
        let url = edit.new_url.trim();
        if url.is_empty() {
            return Err(BookError::invalid_input(format!(
                "image edit #{} ({slot}) has no URL",
                i + 1
            )));
        }
        image_slots.push((slot, url.to_string()));
    }

    let summary = summarize(&text_slots, &image_slots);
    let images = last_per_slot(image_slots);
    let texts = last_per_slot(text_slots)
        .into_iter()
        .filter(|(slot, _)| !images.iter().any(|(s, _)| s == slot))
        .collect();

    Ok(EditPlan {
        texts,
        images,
        summary,
    })
}

fn last_per_slot(entries: Vec<(AssetSlot, String)>) -> Vec<(AssetSlot, String)> {
    let mut out: Vec<(AssetSlot, String)> = Vec::with_capacity(entries.len());
    for (slot, value) in entries {
        match out.iter_mut().find(|(s, _)| *s == slot) {
            Some(existing) => existing.1 = value,
            None => out.push((slot, value)),
        }
    }
    out
}

/// `2 text edit(s) [cover, page 3]; 1 image edit(s) [page 5]`. Counts and targets only.
fn summarize(texts: &[(AssetSlot, String)], images: &[(AssetSlot, String)]) -> String {
    fn part(label: &str, entries: &[(AssetSlot, String)]) -> Option<String> {
        if entries.is_empty() {
            return None;
        }
        let mut targets: Vec<AssetSlot> = Vec::new();
        for (slot, _) in entries {
            if !targets.contains(slot) {
                targets.push(*slot);
            }
        }
        let targets = targets
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!("{} {label} edit(s) [{targets}]", entries.len()))
    }

    [part("text", texts), part("image", images)]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("; ")
}

/// Override changes computed for one batch, merged into the manifest in a single step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestPatch {
    /// New cover image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// New cover text. `Some(None)` clears it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_text: Option<Option<String>>,
    /// New page image URLs.
    pub pages_image_url: BTreeMap<u32, String>,
    /// New page texts. `None` clears a page's text.
    pub pages_text: BTreeMap<u32, Option<String>>,
    /// Audit summary appended to `editsLog`.
    pub summary: String,
}

impl ManifestPatch {
    /// Record a regenerated card for `slot`.
    pub fn set_text_card(&mut self, slot: AssetSlot, url: String, text: String) {
        match slot {
            AssetSlot::Cover => {
                self.cover_url = Some(url);
                self.cover_text = Some(Some(text));
            }
            AssetSlot::Page(n) => {
                self.pages_image_url.insert(n, url);
                self.pages_text.insert(n, Some(text));
            }
        }
    }

    /// Record a replacement image for `slot`. Text burned onto the previous image no longer
    /// describes it, so the slot's text is cleared.
    pub fn set_image(&mut self, slot: AssetSlot, url: String) {
        match slot {
            AssetSlot::Cover => {
                self.cover_url = Some(url);
                self.cover_text = Some(None);
            }
            AssetSlot::Page(n) => {
                self.pages_image_url.insert(n, url);
                self.pages_text.insert(n, None);
            }
        }
    }

    /// Merge into `manifest` and append one `editsLog` record. `updatedAt` is stamped by the
    /// save that follows.
    pub fn apply(&self, manifest: &mut Manifest, user_id: &str, at: &str) {
        let o: &mut Overrides = &mut manifest.overrides;
        if let Some(url) = &self.cover_url {
            o.cover_url = Some(url.clone());
        }
        if let Some(text) = &self.cover_text {
            o.cover_text = text.clone();
        }
        for (page, url) in &self.pages_image_url {
            o.pages_image_url.insert(*page, url.clone());
        }
        for (page, text) in &self.pages_text {
            match text {
                Some(text) => o.pages_text.insert(*page, text.clone()),
                None => o.pages_text.remove(page),
            };
        }
        manifest.edits_log.push(EditLogEntry {
            at: at.to_string(),
            user_id: user_id.to_string(),
            summary: self.summary.clone(),
        });
    }
}

/// A regenerated image produced by an edit call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedImage {
    /// `cover` or `page N`.
    pub target: String,
    /// Public URL of the new image.
    pub url: String,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

/// Result of a committed edit call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditReport {
    /// Book id.
    pub book_id: String,
    /// Changes that were committed.
    pub patch: ManifestPatch,
    /// Images regenerated for text edits.
    pub derived: Vec<DerivedImage>,
    /// Overrides after the commit.
    pub overrides: Overrides,
    /// Whether the document was rebuilt after the commit.
    pub pdf_rebuilt: bool,
}

struct Staged {
    slot: AssetSlot,
    path: PathBuf,
    derived: DerivedImage,
    text: String,
}

/// Apply a validated plan to the book at `location`. The caller holds the book's lock.
///
/// Base images are resolved for every text edit before any rendering; a missing base fails the
/// whole call with `NotFound` naming the expected file. The manifest is saved once, then the
/// document is rebuilt; a rebuild failure is logged and reported, not returned.
#[tracing::instrument(skip_all, fields(book = %location.dir_id, scope = location.scope.label()))]
pub fn apply_plan(
    location: &BookLocation,
    plan: &EditPlan,
    user_id: Option<&str>,
    renderer: &OverlayRenderer,
    probe: &impl DiskProbe,
) -> BookResult<EditReport> {
    let manifest_path = location.manifest_path();
    let mut manifest = ManifestStore::load(&manifest_path)?;

    let mut sources = Vec::with_capacity(plan.texts.len());
    for (slot, text) in &plan.texts {
        let Some(source) = resolver::resolve_edit_source(&location.dir, *slot, probe) else {
            return Err(BookError::not_found(format!(
                "no base image for {slot} of book '{}' (expected {})",
                manifest.id,
                resolver::expected_pattern(*slot)
            )));
        };
        let title = match slot {
            AssetSlot::Cover => manifest.book_title(),
            AssetSlot::Page(n) => manifest.page_title(*n),
        };
        sources.push((*slot, source, title, text.clone()));
    }

    let at = chrono::Utc::now();
    let mut staged: Vec<Staged> = Vec::with_capacity(sources.len());
    for (slot, source, title, text) in sources {
        match stage_card(location, slot, &source, &title, &text, at, renderer, probe) {
            Ok(s) => staged.push(s),
            Err(e) => {
                discard(&staged);
                return Err(e);
            }
        }
    }

    let mut patch = ManifestPatch {
        summary: plan.summary.clone(),
        ..Default::default()
    };
    for s in &staged {
        patch.set_text_card(s.slot, s.derived.url.clone(), s.text.clone());
    }
    for (slot, url) in &plan.images {
        patch.set_image(*slot, url.clone());
    }

    let at_str = at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    patch.apply(&mut manifest, user_id.unwrap_or(ANONYMOUS_USER), &at_str);
    if let Err(e) = ManifestStore::save(&manifest_path, &mut manifest) {
        discard(&staged);
        return Err(e);
    }
    tracing::info!(
        regenerated = staged.len(),
        replaced = plan.images.len(),
        summary = %patch.summary,
        "edits committed"
    );

    let pdf_rebuilt = match pdf::build(location, &manifest, probe) {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "document rebuild failed after commit");
            false
        }
    };

    Ok(EditReport {
        book_id: manifest.id.clone(),
        patch,
        derived: staged.into_iter().map(|s| s.derived).collect(),
        overrides: manifest.overrides,
        pdf_rebuilt,
    })
}

#[allow(clippy::too_many_arguments)]
fn stage_card(
    location: &BookLocation,
    slot: AssetSlot,
    source: &Path,
    title: &str,
    text: &str,
    at: chrono::DateTime<chrono::Utc>,
    renderer: &OverlayRenderer,
    probe: &impl DiskProbe,
) -> BookResult<Staged> {
    let artifact = location.derived_artifact(slot, at, probe);
    let size = renderer.render_card(source, &artifact.path, title, text)?;
    tracing::debug!(%slot, source = %source.display(), out = %artifact.path.display(), "card staged");
    Ok(Staged {
        slot,
        path: artifact.path,
        derived: DerivedImage {
            target: slot.to_string(),
            url: artifact.url,
            width: size.width,
            height: size.height,
        },
        text: text.to_string(),
    })
}

fn discard(staged: &[Staged]) {
    for s in staged {
        if let Err(e) = std::fs::remove_file(&s.path) {
            tracing::warn!(path = %s.path.display(), error = %e, "failed to remove staged image");
        }
    }
}

/// An image-replacement request to record for external fulfilment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewImageEditRequest {
    /// Cover or page.
    pub target: EditTarget,
    /// Page number when `target` is `page`.
    #[serde(default)]
    pub page: Option<u32>,
    /// What the fulfiller should change.
    pub instruction: String,
    /// Image the instruction refers to.
    pub image_url: String,
}

impl NewImageEditRequest {
    /// Reject unknown targets and blank fields. Performs no IO.
    pub fn validate(&self) -> BookResult<AssetSlot> {
        let slot = AssetSlot::from_target(self.target, self.page)?;
        if self.instruction.trim().is_empty() {
            return Err(BookError::invalid_input("image edit request has a blank instruction"));
        }
        if self.image_url.trim().is_empty() {
            return Err(BookError::invalid_input("image edit request has no image URL"));
        }
        Ok(slot)
    }
}

/// Append a `pending` request to the book's queue and return its id. The caller holds the
/// book's lock.
#[tracing::instrument(skip_all, fields(book = %location.dir_id))]
pub fn queue_request(location: &BookLocation, request: &NewImageEditRequest) -> BookResult<String> {
    let slot = request.validate()?;
    let manifest_path = location.manifest_path();
    let mut manifest = ManifestStore::load(&manifest_path)?;

    let now = chrono::Utc::now();
    let id = format!(
        "ier-{}-{}",
        time::file_stamp(now),
        manifest.image_edit_requests.len() + 1
    );
    manifest.image_edit_requests.push(ImageEditRequest {
        id: id.clone(),
        at: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        target: request.target,
        page: match slot {
            AssetSlot::Cover => None,
            AssetSlot::Page(n) => Some(n),
        },
        instruction: request.instruction.trim().to_string(),
        image_url: request.image_url.trim().to_string(),
        status: RequestStatus::Pending,
    });
    ManifestStore::save(&manifest_path, &mut manifest)?;
    tracing::info!(request = %id, %slot, "image edit request queued");
    Ok(id)
}

#[cfg(test)]
#[path = "../../tests/unit/edit/engine.rs"]
mod tests;
