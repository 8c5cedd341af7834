use std::path::PathBuf;

use serde::Serialize;

use crate::assets::probe::FsProbe;
use crate::assets::storage::BookStorage;
use crate::edit::engine::{self, EditBatch, EditReport, NewImageEditRequest};
use crate::edit::lock::BookLocks;
use crate::foundation::config::LibraryConfig;
use crate::foundation::error::{BookError, BookResult};
use crate::manifest::store::ManifestStore;
use crate::render::overlay::OverlayRenderer;
use crate::render::pdf;
use crate::view::book_view::{self, BookView};

/// Entry point for the surrounding application: every operation on books goes through here.
///
/// Book directories are always found through [`BookStorage::locate`], so the user-first scope
/// rule holds on every path. Write operations run under the book's lock.
#[derive(Debug)]
pub struct Library {
    config: LibraryConfig,
    storage: BookStorage,
    locks: BookLocks,
    renderer: OverlayRenderer,
}

impl Library {
    /// Validate `config` and build a library over it.
    pub fn new(config: LibraryConfig) -> BookResult<Self> {
        config.validate()?;
        let storage = BookStorage::new(&config);
        let renderer = OverlayRenderer::new(config.overlay.clone());
        Ok(Self {
            config,
            storage,
            locks: BookLocks::new(),
            renderer,
        })
    }

    /// Storage layout in use.
    pub fn storage(&self) -> &BookStorage {
        &self.storage
    }

    /// Every book visible to `user`, newest first. Books whose manifest fails to load are
    /// skipped with a warning.
    #[tracing::instrument(skip(self))]
    pub fn list_books(&self, user: Option<&str>) -> BookResult<Vec<BookView>> {
        let mut views = Vec::new();
        for location in self.storage.list(user)? {
            match ManifestStore::load(&location.manifest_path()) {
                Ok(manifest) => views.push(BookView::resolve(&manifest, &location, &FsProbe)),
                Err(e) => {
                    tracing::warn!(dir = %location.dir.display(), error = %e, "skipping unreadable book");
                }
            }
        }
        book_view::sort_views(&mut views);
        Ok(views)
    }

    /// View of one book.
    #[tracing::instrument(skip(self))]
    pub fn load_book(&self, user: Option<&str>, book_id: &str) -> BookResult<BookView> {
        let location = self.storage.locate(user, book_id)?;
        let manifest = ManifestStore::load(&location.manifest_path())?;
        Ok(BookView::resolve(&manifest, &location, &FsProbe))
    }

    /// Validate, render and commit `batch`, then rebuild the document.
    ///
    /// Input problems are reported before any file is touched. The call returns only after all
    /// images are rendered and the manifest is committed.
    #[tracing::instrument(skip(self, batch), fields(text = batch.text_edits.len(), image = batch.image_edits.len()))]
    pub fn apply_edits(
        &self,
        user: Option<&str>,
        book_id: &str,
        batch: &EditBatch,
    ) -> BookResult<EditReport> {
        let plan = engine::validate_batch(batch, &self.config.limits)?;
        let location = self.storage.locate(user, book_id)?;
        let key = (location.scope.clone(), location.dir_id.clone());
        self.locks.with_lock(&key, || {
            engine::apply_plan(&location, &plan, user, &self.renderer, &FsProbe)
        })
    }

    /// Record an image-replacement request for external fulfilment. Returns the request id.
    #[tracing::instrument(skip(self, request))]
    pub fn queue_image_edit(
        &self,
        user: Option<&str>,
        book_id: &str,
        request: &NewImageEditRequest,
    ) -> BookResult<String> {
        request.validate()?;
        let location = self.storage.locate(user, book_id)?;
        let key = (location.scope.clone(), location.dir_id.clone());
        self.locks
            .with_lock(&key, || engine::queue_request(&location, request))
    }

    /// Rebuild the book's document from its current images.
    #[tracing::instrument(skip(self))]
    pub fn rebuild_pdf(&self, user: Option<&str>, book_id: &str) -> BookResult<PathBuf> {
        let location = self.storage.locate(user, book_id)?;
        let key = (location.scope.clone(), location.dir_id.clone());
        self.locks.with_lock(&key, || {
            let manifest = ManifestStore::load(&location.manifest_path())?;
            pdf::build(&location, &manifest, &FsProbe)
        })
    }
}

/// Structured result handed to the surrounding application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiOutcome {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Human-readable failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stable failure tag, see [`BookError::kind`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    /// Operation payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ApiOutcome {
    /// Successful outcome carrying `data`.
    pub fn success<T: Serialize>(data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                ok: true,
                error: None,
                kind: None,
                data: Some(data),
            },
            Err(e) => Self::failure(&BookError::Other(
                anyhow::Error::new(e).context("serialize outcome"),
            )),
        }
    }

    /// Failed outcome for `err`.
    pub fn failure(err: &BookError) -> Self {
        Self {
            ok: false,
            error: Some(err.to_string()),
            kind: Some(err.kind()),
            data: None,
        }
    }

    /// Outcome for any library result.
    pub fn from_result<T: Serialize>(res: &BookResult<T>) -> Self {
        match res {
            Ok(data) => Self::success(data),
            Err(e) => Self::failure(e),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/library.rs"]
mod tests;
