//! Locating the canonical image for a cover or page among the naming conventions the generator
//! has used over time.
//!
//! Base lookup order is a contract: the cleanest available source comes first, so a new text
//! card is never composited on top of an earlier one.

use std::path::{Path, PathBuf};

use crate::assets::probe::DiskProbe;
use crate::assets::slot::AssetSlot;
use crate::assets::storage::{BookLocation, EDITED_DIR};
use crate::manifest::model::Manifest;

/// One named way of guessing file names for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `cover.png`, `capa.png`, `edit_base.png`, `cover_base.png`, `capa_base.png`.
    CleanCover,
    /// `cover_final.png`, `capa_final.png`.
    LegacyFinalCover,
    /// Page 1's base image standing in for a missing cover.
    FirstPageFallback,
    /// `page_NN.png`.
    PaddedPage,
    /// `page_NN_final.png`, `page_N_final.png`.
    LegacyFinalPage,
    /// `page_N.png`.
    UnpaddedPage,
    /// Fixed-name derived images: `edited/cover.png`, `edited/page_NN.png`.
    LegacyEdited,
}

const COVER_BASE: &[Strategy] = &[
    Strategy::CleanCover,
    Strategy::LegacyFinalCover,
    Strategy::FirstPageFallback,
];

const PAGE_BASE: &[Strategy] = &[
    Strategy::PaddedPage,
    Strategy::LegacyFinalPage,
    Strategy::UnpaddedPage,
];

impl Strategy {
    /// Short name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::CleanCover => "clean-cover",
            Self::LegacyFinalCover => "legacy-final-cover",
            Self::FirstPageFallback => "first-page-fallback",
            Self::PaddedPage => "padded-page",
            Self::LegacyFinalPage => "legacy-final-page",
            Self::UnpaddedPage => "unpadded-page",
            Self::LegacyEdited => "legacy-edited",
        }
    }

    /// Book-relative candidate names this strategy proposes for `slot`, in order.
    ///
    /// Cover strategies yield nothing for pages and vice versa.
    pub fn candidates(self, slot: AssetSlot) -> Vec<String> {
        match (self, slot) {
            (Self::CleanCover, AssetSlot::Cover) => {
                ["cover", "capa", "edit_base", "cover_base", "capa_base"]
                    .iter()
                    .map(|s| format!("{s}.png"))
                    .collect()
            }
            (Self::LegacyFinalCover, AssetSlot::Cover) => {
                vec!["cover_final.png".to_string(), "capa_final.png".to_string()]
            }
            (Self::FirstPageFallback, AssetSlot::Cover) => PAGE_BASE
                .iter()
                .flat_map(|s| s.candidates(AssetSlot::Page(1)))
                .collect(),
            (Self::PaddedPage, AssetSlot::Page(n)) => vec![format!("page_{n:02}.png")],
            (Self::LegacyFinalPage, AssetSlot::Page(n)) => {
                let mut out = vec![format!("page_{n:02}_final.png")];
                let unpadded = format!("page_{n}_final.png");
                if !out.contains(&unpadded) {
                    out.push(unpadded);
                }
                out
            }
            (Self::UnpaddedPage, AssetSlot::Page(n)) => {
                let unpadded = format!("page_{n}.png");
                if unpadded == format!("page_{n:02}.png") {
                    Vec::new()
                } else {
                    vec![unpadded]
                }
            }
            (Self::LegacyEdited, slot) => vec![format!("{EDITED_DIR}/{}.png", slot.stem())],
            _ => Vec::new(),
        }
    }
}

/// Base lookup strategies for `slot`, cleanest first.
pub fn base_strategies(slot: AssetSlot) -> &'static [Strategy] {
    match slot {
        AssetSlot::Cover => COVER_BASE,
        AssetSlot::Page(_) => PAGE_BASE,
    }
}

/// All base candidate paths for `slot` under `book_dir`, in contract order.
pub fn base_candidates(book_dir: &Path, slot: AssetSlot) -> Vec<(Strategy, PathBuf)> {
    base_strategies(slot)
        .iter()
        .flat_map(|&s| {
            s.candidates(slot)
                .into_iter()
                .map(move |name| (s, book_dir.join(name)))
        })
        .collect()
}

/// File name a caller should expect for `slot`, used in `NotFound` messages.
pub fn expected_pattern(slot: AssetSlot) -> String {
    format!("{}.png", slot.stem())
}

/// First existing base image for `slot`. Absence is a normal outcome, not an error.
pub fn resolve_base(book_dir: &Path, slot: AssetSlot, probe: &impl DiskProbe) -> Option<PathBuf> {
    base_candidates(book_dir, slot)
        .into_iter()
        .find(|(_, p)| probe.is_file(p))
        .map(|(strategy, path)| {
            tracing::debug!(%slot, strategy = strategy.name(), path = %path.display(), "resolved base");
            path
        })
}

/// Source image for a new text edit: the first existing candidate that is neither derived nor
/// legacy-burned, else whatever [`resolve_base`] finds.
pub fn resolve_edit_source(
    book_dir: &Path,
    slot: AssetSlot,
    probe: &impl DiskProbe,
) -> Option<PathBuf> {
    let existing: Vec<PathBuf> = base_candidates(book_dir, slot)
        .into_iter()
        .map(|(_, p)| p)
        .filter(|p| probe.is_file(p))
        .collect();

    let clean = existing
        .iter()
        .find(|p| !is_derived_or_final(&p.to_string_lossy()));
    match clean {
        Some(p) => Some(p.clone()),
        None => existing.into_iter().next(),
    }
}

/// Whether a path or URL points at an already edited or legacy-burned image.
///
/// True for anything under an `edited/` segment and for file stems carrying a `_final` or
/// `-edited` marker.
pub fn is_derived_or_final(path_or_url: &str) -> bool {
    let trimmed = path_or_url.split(['?', '#']).next().unwrap_or(path_or_url);
    let segments: Vec<&str> = trimmed
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect();
    let Some((file, dirs)) = segments.split_last() else {
        return false;
    };

    if dirs.iter().any(|d| d.eq_ignore_ascii_case(EDITED_DIR)) {
        return true;
    }

    let stem = file
        .rsplit_once('.')
        .map_or(*file, |(stem, _)| stem)
        .to_ascii_lowercase();
    stem.ends_with("_final")
        || stem.contains("_final_")
        || stem.ends_with("-edited")
        || stem.ends_with("_edited")
}

/// Which rule picked a print image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintSource {
    /// The slot's override URL mapped to a local file.
    Override,
    /// A fixed-name file under `edited/`.
    LegacyEdited,
    /// A legacy `_final` file.
    LegacyFinal,
    /// A clean base file.
    Base,
    /// The base URL listed in `images`, mapped to a local file.
    BaseUrl,
}

/// A resolved print image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintAsset {
    /// Image file.
    pub path: PathBuf,
    /// Rule that selected it.
    pub source: PrintSource,
}

/// Image to print for `slot`: derived first, legacy final next, clean base last.
pub fn resolve_for_print(
    location: &BookLocation,
    manifest: &Manifest,
    slot: AssetSlot,
    probe: &impl DiskProbe,
) -> Option<PrintAsset> {
    let override_url = match slot {
        AssetSlot::Cover => manifest.overrides.cover_url.as_deref(),
        AssetSlot::Page(n) => manifest.overrides.pages_image_url.get(&n).map(String::as_str),
    };
    let base_url = match slot {
        AssetSlot::Cover => None,
        AssetSlot::Page(n) => manifest.base_page_url(n),
    };

    let mut candidates: Vec<(PrintSource, PathBuf)> = Vec::new();
    if let Some(path) = override_url.and_then(|u| location.path_for_url(u)) {
        candidates.push((PrintSource::Override, path));
    }
    for name in Strategy::LegacyEdited.candidates(slot) {
        candidates.push((PrintSource::LegacyEdited, location.dir.join(name)));
    }
    let (finals, clean): (Vec<_>, Vec<_>) = base_candidates(&location.dir, slot)
        .into_iter()
        .partition(|(s, _)| matches!(s, Strategy::LegacyFinalCover | Strategy::LegacyFinalPage));
    candidates.extend(finals.into_iter().map(|(_, p)| (PrintSource::LegacyFinal, p)));
    candidates.extend(clean.into_iter().map(|(_, p)| (PrintSource::Base, p)));
    if let Some(path) = base_url.and_then(|u| location.path_for_url(u)) {
        candidates.push((PrintSource::BaseUrl, path));
    }

    candidates
        .into_iter()
        .find(|(_, p)| probe.is_file(p))
        .map(|(source, path)| PrintAsset { path, source })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/resolver.rs"]
mod tests;
