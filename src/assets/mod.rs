//! Book storage layout, file probing and base/derived image resolution.

/// Filesystem existence probing.
pub mod probe;
/// Base, edit-source and print image resolution.
pub mod resolver;
/// Cover/page slot identifiers.
pub mod slot;
/// Book directory and URL mapping with scope precedence.
pub mod storage;
