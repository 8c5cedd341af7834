//! picbook manages the assets of personalized picture books.
//!
//! Each book is a directory holding generated images (one cover and numbered pages) plus a JSON
//! manifest. Users edit books by replacing page text or whole images; edits are layered over the
//! originals as overrides and never destroy them.
//!
//! # Pipeline overview
//!
//! 1. **Locate**: `(user, book id) -> BookLocation`, user storage first, shared storage second
//! 2. **Resolve**: find the cleanest base image for the cover or a page across legacy names
//! 3. **Edit**: validate a batch, composite text cards onto fresh copies, commit the manifest once
//! 4. **Assemble**: stream cover + pages into a PDF, one page per image at its exact pixel size
//! 5. **View**: merge base and overrides into the read model used by listings and detail screens
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Atomic writes**: manifests, edited images and documents are written to a temporary file
//!   and renamed, so readers never observe partial files.
//! - **All-or-nothing edits**: a failing batch leaves the manifest untouched.
//! - **One lock per book**: concurrent edits of the same book are serialized.
//!
//! Start with [`Library`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod edit;
mod foundation;
mod library;
mod manifest;
mod render;
mod view;

pub use assets::probe::{DiskProbe, FsProbe};
pub use assets::resolver::{
    PrintAsset, PrintSource, Strategy, base_candidates, base_strategies, expected_pattern,
    is_derived_or_final, resolve_base, resolve_edit_source, resolve_for_print,
};
pub use assets::slot::AssetSlot;
pub use assets::storage::{BookLocation, BookStorage, DerivedArtifact, EDITED_DIR, Scope};
pub use edit::engine::{
    ANONYMOUS_USER, DerivedImage, EditBatch, EditPlan, EditReport, ImageEdit, ManifestPatch,
    NewImageEditRequest, TextEdit, apply_plan, queue_request, validate_batch,
};
pub use edit::lock::{BookKey, BookLocks};
pub use foundation::config::{EditLimits, LibraryConfig, OverlayStyle, PanelScheme};
pub use foundation::error::{BookError, BookResult};
pub use foundation::fs::{ensure_parent_dir, write_atomic, write_atomic_with};
pub use foundation::ids::{normalize_rel_path, validate_id};
pub use foundation::time::{file_stamp, human, now_rfc3339, parse_timestamp, sort_millis};
pub use library::{ApiOutcome, Library};
pub use manifest::model::{
    BookStatus, EditLogEntry, EditTarget, ImageEditRequest, Manifest, Overrides, PageImage,
    RequestStatus, Story, StoryPage,
};
pub use manifest::store::{MANIFEST_FILE, ManifestStore};
pub use render::composite::{PremulRgba8, flatten_on_white, over, over_straight_in_place};
pub use render::overlay::{
    CardLayout, OverlayRenderer, REFERENCE_HEIGHT, REFERENCE_WIDTH, RenderedSize, decode_oriented,
};
pub use render::pdf::{PdfSink, assemble_into, build as build_pdf, plan_pages};
pub use render::sink::{InMemorySink, PageSink, RasterPage};
pub use render::text::{MAX_BODY_LINES, escape_xml, max_chars_per_line, wrap_lines};
pub use view::book_view::{BookView, PageView, sort_views};
