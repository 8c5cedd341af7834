use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{BookError, BookResult};

/// Storage roots, public URL prefixes, quotas and overlay styling for a book library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryConfig {
    /// Per-user storage root. User books live at `<usersRoot>/<userId>/books/<dirId>/`.
    pub users_root: PathBuf,
    /// Shared storage root. Global books live at `<globalRoot>/<dirId>/`.
    pub global_root: PathBuf,
    /// Public URL prefix mirroring `users_root`.
    pub users_url_prefix: String,
    /// Public URL prefix mirroring `global_root`.
    pub global_url_prefix: String,
    /// Per-call edit quotas.
    pub limits: EditLimits,
    /// Text card styling.
    pub overlay: OverlayStyle,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            users_root: PathBuf::from("data/users"),
            global_root: PathBuf::from("data/books"),
            users_url_prefix: "/files/users".to_string(),
            global_url_prefix: "/files/books".to_string(),
            limits: EditLimits::default(),
            overlay: OverlayStyle::default(),
        }
    }
}

/// Upper bounds on the work a single edit call may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditLimits {
    /// Maximum text edits per call.
    pub max_text_edits: usize,
    /// Maximum image edits per call.
    pub max_image_edits: usize,
}

impl Default for EditLimits {
    fn default() -> Self {
        Self {
            max_text_edits: 10,
            max_image_edits: 5,
        }
    }
}

/// Panel sizing scheme. One scheme is used for every render of a library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelScheme {
    /// Fixed-height band covering 28% of the image height.
    Band,
    /// Height follows the number of wrapped body lines.
    #[default]
    Card,
}

/// Styling for the text card burned onto edited images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayStyle {
    /// Panel sizing scheme.
    pub scheme: PanelScheme,
    /// CSS-style font family list used in the card markup.
    pub font_family: String,
    /// Extra font directory loaded next to the system fonts.
    pub fonts_dir: Option<PathBuf>,
    /// Title fill color.
    pub title_color: String,
    /// Body fill color.
    pub body_color: String,
    /// Panel fill color.
    pub panel_color: String,
    /// Panel opacity in `0..=1`.
    pub panel_opacity: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            scheme: PanelScheme::default(),
            font_family: "DejaVu Sans, Arial, sans-serif".to_string(),
            fonts_dir: None,
            title_color: "#1f2937".to_string(),
            body_color: "#374151".to_string(),
            panel_color: "#ffffff".to_string(),
            panel_opacity: 0.92,
        }
    }
}

impl LibraryConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> BookResult<Self> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BookError::not_found(format!(
                    "config file '{}'",
                    path.display()
                )));
            }
            Err(e) => return Err(BookError::io(path, e)),
        };
        let cfg: Self = serde_json::from_slice(&bytes).map_err(|e| {
            BookError::corrupt(format!("config '{}' is not valid: {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> BookResult<()> {
        if self.limits.max_text_edits == 0 || self.limits.max_image_edits == 0 {
            return Err(BookError::invalid_input("edit limits must be non-zero"));
        }
        if self.users_url_prefix.trim().is_empty() || self.global_url_prefix.trim().is_empty() {
            return Err(BookError::invalid_input("url prefixes must be non-empty"));
        }
        let op = self.overlay.panel_opacity;
        if !op.is_finite() || !(0.0..=1.0).contains(&op) {
            return Err(BookError::invalid_input(
                "overlay panelOpacity must be within 0..=1",
            ));
        }
        Ok(())
    }

    /// Config rooted at `base`, with `users/` and `books/` beneath it.
    pub fn rooted_at(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            users_root: base.join("users"),
            global_root: base.join("books"),
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
