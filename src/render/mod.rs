//! Image output: text cards composited onto page images, and the printable document.

/// Premultiplied alpha compositing helpers.
pub mod composite;
/// Text card layout and rasterization.
pub mod overlay;
/// Document assembly from print images.
pub mod pdf;
/// Page sink contract shared by document writers.
pub mod sink;
/// Escaping and line wrapping for card text.
pub mod text;
