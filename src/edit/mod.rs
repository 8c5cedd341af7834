//! Applying user edits: batch validation, staging, the single manifest commit, and per-book
//! mutual exclusion.

/// Edit batches, patches and the commit pipeline.
pub mod engine;
/// Keyed per-book locks.
pub mod lock;
