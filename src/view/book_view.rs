use serde::Serialize;

use crate::assets::probe::DiskProbe;
use crate::assets::resolver;
use crate::assets::slot::AssetSlot;
use crate::assets::storage::BookLocation;
use crate::foundation::time;
use crate::manifest::model::{BookStatus, Manifest, RequestStatus};

/// One page as listing and detail screens show it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    /// 1-based page number.
    pub page: u32,
    /// Card title.
    pub title: String,
    /// Effective image URL: override over base.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Edited text, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Whether an override replaces the base image.
    pub edited: bool,
}

/// Read model of one book: base values merged with overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    /// Book id.
    pub id: String,
    /// Folder name.
    pub dir_id: String,
    /// `user` or `global`.
    pub scope: &'static str,
    /// Generation status.
    pub status: BookStatus,
    /// Generator progress note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    /// Generator failure note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Theme.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Illustration style.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Child's name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_name: Option<String>,
    /// Book title.
    pub title: String,
    /// Effective cover URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// Cover text override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_text: Option<String>,
    /// Pages in ascending order.
    pub pages: Vec<PageView>,
    /// Document is available: status `done` and a document file on disk.
    pub has_pdf: bool,
    /// Document URL, only when `has_pdf`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    /// Raw creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Raw last-update time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Creation time for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_display: Option<String>,
    /// Last update for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at_display: Option<String>,
    /// Number of committed edit batches.
    pub edit_count: usize,
    /// Queued image requests still pending.
    pub pending_image_requests: usize,
    /// Listing order key: `updatedAt`, else `createdAt`, in epoch millis (0 if unparseable).
    #[serde(skip)]
    pub sort_key: i64,
}

impl BookView {
    /// Build the view of `manifest` stored at `location`.
    ///
    /// Deterministic for a given manifest and probe. Every read path goes through here.
    pub fn resolve(manifest: &Manifest, location: &BookLocation, probe: &impl DiskProbe) -> Self {
        let overrides = &manifest.overrides;

        let cover_url = overrides.cover_url.clone().or_else(|| {
            resolver::resolve_base(&location.dir, AssetSlot::Cover, probe)
                .and_then(|p| location.url_for_path(&p))
        });

        let pages = manifest
            .page_numbers()
            .into_iter()
            .map(|page| PageView {
                page,
                title: manifest.page_title(page),
                url: manifest.effective_page_url(page).map(str::to_string),
                text: overrides.pages_text.get(&page).cloned(),
                edited: overrides.pages_image_url.contains_key(&page),
            })
            .collect();

        let pdf_path = if manifest.status == BookStatus::Done {
            location
                .pdf_candidates(&manifest.id)
                .into_iter()
                .find(|p| probe.is_file(p))
        } else {
            None
        };
        let pdf_url = pdf_path.as_deref().and_then(|p| location.pdf_url(p));

        let sort_key = match time::sort_millis(manifest.updated_at.as_deref()) {
            0 => time::sort_millis(manifest.created_at.as_deref()),
            ms => ms,
        };

        Self {
            id: manifest.id.clone(),
            dir_id: location.dir_id.clone(),
            scope: location.scope.label(),
            status: manifest.status,
            step: manifest.step.clone(),
            error: manifest.error.clone(),
            theme: manifest.theme.clone(),
            style: manifest.style.clone(),
            child_name: manifest.child_name.clone(),
            title: manifest.book_title(),
            cover_url,
            cover_text: overrides.cover_text.clone(),
            pages,
            has_pdf: pdf_url.is_some(),
            pdf_url,
            created_at: manifest.created_at.clone(),
            updated_at: manifest.updated_at.clone(),
            created_at_display: time::human(manifest.created_at.as_deref()),
            updated_at_display: time::human(manifest.updated_at.as_deref()),
            edit_count: manifest.edits_log.len(),
            pending_image_requests: manifest
                .image_edit_requests
                .iter()
                .filter(|r| r.status == RequestStatus::Pending)
                .count(),
            sort_key,
        }
    }
}

/// Newest first by [`BookView::sort_key`]; ties keep folder-name order.
pub fn sort_views(views: &mut [BookView]) {
    views.sort_by(|a, b| {
        b.sort_key
            .cmp(&a.sort_key)
            .then_with(|| a.dir_id.cmp(&b.dir_id))
    });
}

#[cfg(test)]
#[path = "../../tests/unit/view/book_view.rs"]
mod tests;
