use std::path::{Path, PathBuf};

use crate::foundation::error::{BookError, BookResult};
use crate::foundation::{fs, time};
use crate::manifest::model::Manifest;

/// Canonical manifest file name inside a book directory.
pub const MANIFEST_FILE: &str = "book.json";

/// Atomic load/save of a book's JSON state document.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestStore;

impl ManifestStore {
    /// Locate the manifest inside `book_dir`: `book.json`, then `book-<dirId>.json`.
    pub fn find(book_dir: &Path) -> Option<PathBuf> {
        let primary = book_dir.join(MANIFEST_FILE);
        if primary.is_file() {
            return Some(primary);
        }
        let dir_id = book_dir.file_name()?.to_str()?;
        let legacy = book_dir.join(format!("book-{dir_id}.json"));
        legacy.is_file().then_some(legacy)
    }

    /// Read and validate the manifest at `path`.
    #[tracing::instrument(level = "debug")]
    pub fn load(path: &Path) -> BookResult<Manifest> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BookError::not_found(format!(
                    "manifest '{}' (expected {MANIFEST_FILE} or book-<id>.json)",
                    path.display()
                )));
            }
            Err(e) => return Err(BookError::io(path, e)),
        };

        let manifest: Manifest = serde_json::from_slice(&bytes).map_err(|e| {
            BookError::corrupt(format!("manifest '{}' does not parse: {e}", path.display()))
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Stamp `updatedAt` and write `manifest` to `path` via temp file + rename.
    #[tracing::instrument(level = "debug", skip(manifest), fields(book = %manifest.id))]
    pub fn save(path: &Path, manifest: &mut Manifest) -> BookResult<()> {
        manifest.updated_at = Some(time::now_rfc3339());
        let json = serde_json::to_vec_pretty(manifest)
            .map_err(|e| BookError::Other(anyhow::Error::new(e).context("serialize manifest")))?;
        fs::write_atomic(path, &json)?;
        tracing::debug!(path = %path.display(), bytes = json.len(), "manifest saved");
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/manifest/store.rs"]
mod tests;
