/// Library configuration.
pub mod config;
/// Error taxonomy.
pub mod error;
/// Atomic file writes.
pub mod fs;
/// Identifier and relative path validation.
pub mod ids;
/// Timestamp helpers.
pub mod time;
