//! Book manifest model and its on-disk store.

/// Manifest types.
pub mod model;
/// Atomic load/save.
pub mod store;
