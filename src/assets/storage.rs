use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::assets::probe::DiskProbe;
use crate::assets::slot::AssetSlot;
use crate::foundation::config::LibraryConfig;
use crate::foundation::error::{BookError, BookResult};
use crate::foundation::{ids, time};
use crate::manifest::store::{MANIFEST_FILE, ManifestStore};

/// Directory holding regenerated images inside a book directory.
pub const EDITED_DIR: &str = "edited";

/// Where a book's files live.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// Under the named user's storage area.
    User(String),
    /// Under the shared area.
    Global,
}

impl Scope {
    /// `user` or `global`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Global => "global",
        }
    }
}

/// A regenerated image reserved under `edited/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedArtifact {
    /// Absolute (or root-relative) file path.
    pub path: PathBuf,
    /// Public URL for `path`.
    pub url: String,
}

/// A resolved book directory together with its public URL base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookLocation {
    /// Storage scope the book was found in.
    pub scope: Scope,
    /// Folder name (`dirId`).
    pub dir_id: String,
    /// Book directory.
    pub dir: PathBuf,
    /// Public URL of `dir`, without trailing slash.
    pub url_base: String,
}

impl BookLocation {
    /// Existing manifest file, or `book.json` for a new one.
    pub fn manifest_path(&self) -> PathBuf {
        ManifestStore::find(&self.dir).unwrap_or_else(|| self.dir.join(MANIFEST_FILE))
    }

    /// Public URL for a book-relative path.
    pub fn url_for(&self, rel: &str) -> String {
        format!("{}/{}", self.url_base, rel.trim_start_matches('/'))
    }

    /// Public URL for a file inside the book directory.
    pub fn url_for_path(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.dir).ok()?;
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Some(self.url_for(&rel))
    }

    /// Map a public URL back to a file in this book directory.
    ///
    /// Only URLs under this book's URL base map; external URLs and traversal attempts give `None`.
    pub fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let url = url.split(['?', '#']).next().unwrap_or(url);
        let rest = url.strip_prefix(&self.url_base)?;
        if !rest.starts_with('/') {
            return None;
        }
        let rel = ids::normalize_rel_path(rest).ok()?;
        Some(self.dir.join(rel))
    }

    /// The `edited/` directory for regenerated images.
    pub fn edited_dir(&self) -> PathBuf {
        self.dir.join(EDITED_DIR)
    }

    /// Reserve a fresh, timestamp-qualified path for a regenerated `slot` image.
    ///
    /// Names are `edited/cover-<stamp>.png` and `edited/page_NN-<stamp>.png`; a numeric suffix is
    /// appended when the stamped name is already taken, so earlier versions are never replaced.
    pub fn derived_artifact(
        &self,
        slot: AssetSlot,
        at: DateTime<Utc>,
        probe: &impl DiskProbe,
    ) -> DerivedArtifact {
        let stem = format!("{}-{}", slot.stem(), time::file_stamp(at));
        let mut name = format!("{stem}.png");
        let mut n = 2u32;
        while probe.is_file(&self.edited_dir().join(&name)) {
            name = format!("{stem}-{n}.png");
            n += 1;
        }
        let rel = format!("{EDITED_DIR}/{name}");
        DerivedArtifact {
            path: self.dir.join(&rel),
            url: self.url_for(&rel),
        }
    }

    /// Path the document is (re)built at: `<dir>/book-<id>.pdf`.
    pub fn pdf_output_path(&self, book_id: &str) -> PathBuf {
        self.dir.join(format!("book-{book_id}.pdf"))
    }

    /// Every recognized document location, in lookup order.
    ///
    /// `book-<id>.pdf` and legacy `<id>.pdf`, first in the book directory, then in its parent.
    pub fn pdf_candidates(&self, book_id: &str) -> Vec<PathBuf> {
        let mut names = vec![format!("book-{book_id}.pdf"), format!("{book_id}.pdf")];
        if self.dir_id != book_id {
            names.push(format!("book-{}.pdf", self.dir_id));
            names.push(format!("{}.pdf", self.dir_id));
        }

        let mut out: Vec<PathBuf> = names.iter().map(|n| self.dir.join(n)).collect();
        if let Some(parent) = self.dir.parent() {
            out.extend(names.iter().map(|n| parent.join(n)));
        }
        out
    }

    /// Public URL for a document path returned by [`Self::pdf_candidates`].
    pub fn pdf_url(&self, path: &Path) -> Option<String> {
        if let Some(url) = self.url_for_path(path) {
            return Some(url);
        }
        let name = path.file_name()?.to_string_lossy();
        let parent_base = self.url_base.rsplit_once('/')?.0;
        Some(format!("{parent_base}/{name}"))
    }
}

/// Maps `(user, book id)` to a book directory, applying one scope precedence everywhere:
/// the requesting user's area first, the shared area second.
#[derive(Debug, Clone)]
pub struct BookStorage {
    users_root: PathBuf,
    global_root: PathBuf,
    users_url_prefix: String,
    global_url_prefix: String,
}

impl BookStorage {
    /// Build from the library configuration.
    pub fn new(config: &LibraryConfig) -> Self {
        Self {
            users_root: config.users_root.clone(),
            global_root: config.global_root.clone(),
            users_url_prefix: config.users_url_prefix.trim_end_matches('/').to_string(),
            global_url_prefix: config.global_url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Location of `dir_id` in `scope`, whether or not it exists.
    pub fn location(&self, scope: &Scope, dir_id: &str) -> BookLocation {
        match scope {
            Scope::User(user) => BookLocation {
                scope: scope.clone(),
                dir_id: dir_id.to_string(),
                dir: self.users_books_root(user).join(dir_id),
                url_base: format!("{}/{user}/books/{dir_id}", self.users_url_prefix),
            },
            Scope::Global => BookLocation {
                scope: Scope::Global,
                dir_id: dir_id.to_string(),
                dir: self.global_root.join(dir_id),
                url_base: format!("{}/{dir_id}", self.global_url_prefix),
            },
        }
    }

    /// Resolve the book `book_id` for an optional requesting user.
    ///
    /// Within each scope a folder named `book_id` wins over a folder whose manifest carries
    /// `id == book_id`. The user's scope is searched completely before the shared one.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn locate(&self, user: Option<&str>, book_id: &str) -> BookResult<BookLocation> {
        ids::validate_id("book id", book_id)?;
        let mut scopes = Vec::with_capacity(2);
        if let Some(user) = user {
            ids::validate_id("user id", user)?;
            scopes.push(Scope::User(user.to_string()));
        }
        scopes.push(Scope::Global);

        for scope in &scopes {
            if let Some(loc) = self.find_in_scope(scope, book_id)? {
                return Ok(loc);
            }
        }

        Err(BookError::not_found(format!(
            "book '{book_id}' (no {MANIFEST_FILE} in user or shared storage)"
        )))
    }

    fn find_in_scope(&self, scope: &Scope, book_id: &str) -> BookResult<Option<BookLocation>> {
        let loc = self.location(scope, book_id);
        if ManifestStore::find(&loc.dir).is_some() {
            return Ok(Some(loc));
        }

        for dir_id in book_dirs(&self.scope_root(scope))? {
            let candidate = self.location(scope, &dir_id);
            let Some(path) = ManifestStore::find(&candidate.dir) else {
                continue;
            };
            match ManifestStore::load(&path) {
                Ok(manifest) if manifest.id == book_id => {
                    tracing::debug!(dir_id = %dir_id, "book found by manifest id");
                    return Ok(Some(candidate));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(dir = %candidate.dir.display(), error = %e, "skipping unreadable book");
                }
            }
        }
        Ok(None)
    }

    /// Every book directory visible to `user`: the user's own first, then shared books whose
    /// folder name the user does not shadow.
    pub fn list(&self, user: Option<&str>) -> BookResult<Vec<BookLocation>> {
        let mut out = Vec::new();
        if let Some(user) = user {
            ids::validate_id("user id", user)?;
            let scope = Scope::User(user.to_string());
            for dir_id in book_dirs(&self.users_books_root(user))? {
                out.push(self.location(&scope, &dir_id));
            }
        }
        for dir_id in book_dirs(&self.global_root)? {
            if out.iter().any(|loc| loc.dir_id == dir_id) {
                continue;
            }
            out.push(self.location(&Scope::Global, &dir_id));
        }
        Ok(out)
    }

    fn users_books_root(&self, user: &str) -> PathBuf {
        self.users_root.join(user).join("books")
    }

    fn scope_root(&self, scope: &Scope) -> PathBuf {
        match scope {
            Scope::User(user) => self.users_books_root(user),
            Scope::Global => self.global_root.clone(),
        }
    }
}

/// Sub-directories of `root` with a valid id and a manifest, sorted by name.
fn book_dirs(root: &Path) -> BookResult<Vec<String>> {
    let rd = match std::fs::read_dir(root) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(BookError::io(root, e)),
    };

    let mut out = Vec::new();
    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if ids::validate_id("book id", name).is_err() {
            tracing::debug!(dir = %path.display(), "skipping directory with invalid book id");
            continue;
        }
        if ManifestStore::find(&path).is_some() {
            out.push(name.to_string());
        }
    }
    out.sort();
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/storage.rs"]
mod tests;
