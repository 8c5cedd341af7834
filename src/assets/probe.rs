use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Answers "does this file exist?" for asset resolution and read models.
///
/// Production code uses [`FsProbe`]; a set of paths works as an in-memory probe.
pub trait DiskProbe {
    /// Whether a regular file exists at `path`.
    fn is_file(&self, path: &Path) -> bool;
}

/// Probe backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl DiskProbe for FsProbe {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

impl DiskProbe for BTreeSet<PathBuf> {
    fn is_file(&self, path: &Path) -> bool {
        self.contains(path)
    }
}

impl<P: DiskProbe + ?Sized> DiskProbe for &P {
    fn is_file(&self, path: &Path) -> bool {
        (**self).is_file(path)
    }
}
