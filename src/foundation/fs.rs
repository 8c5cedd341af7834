use std::io::Write as _;
use std::path::Path;

use crate::foundation::error::{BookError, BookResult};

/// Create the parent directory of `path` if it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> BookResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| BookError::io(parent, e))?;
    }
    Ok(())
}

/// Write `bytes` to `path` so that readers never observe a partial file.
///
/// The data goes to a temporary file in the destination directory which is then renamed over
/// `path`. On failure the temporary file is removed and `path` is left untouched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> BookResult<()> {
    write_atomic_with(path, |file| file.write_all(bytes))
}

/// Like [`write_atomic`], but lets `fill` stream the content into the temporary file.
pub fn write_atomic_with<F>(path: &Path, fill: F) -> BookResult<()>
where
    F: FnOnce(&mut std::fs::File) -> std::io::Result<()>,
{
    ensure_parent_dir(path)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".picbook-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| BookError::io(dir, e))?;

    fill(tmp.as_file_mut()).map_err(|e| BookError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| BookError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| BookError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/fs.rs"]
mod tests;
