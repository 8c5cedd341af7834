use std::fmt::Write as _;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::ImageDecoder as _;
use kurbo::Shape as _;

use crate::foundation::config::{OverlayStyle, PanelScheme};
use crate::foundation::error::{BookError, BookResult};
use crate::foundation::fs;
use crate::render::composite;
use crate::render::text::{self, MAX_BODY_LINES};

/// Layout reference size; all card metrics scale with `width / REFERENCE_WIDTH`.
pub const REFERENCE_WIDTH: u32 = 1020;
/// Layout reference height, used when an image reports no size.
pub const REFERENCE_HEIGHT: u32 = 797;

const MARGIN_FRAC: f64 = 0.035;
const PADDING_FRAC: f64 = 0.025;
const RADIUS_FRAC: f64 = 0.02;
const BAND_HEIGHT_FRAC: f64 = 0.28;
const TITLE_PX: f64 = 30.0;
const BODY_PX: f64 = 22.0;
const LINE_HEIGHT: f64 = 1.35;

/// Pixel size of a rendered card image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RenderedSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Geometry of a text card for a given image size.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    /// Image width the layout was computed for.
    pub width: u32,
    /// Image height the layout was computed for.
    pub height: u32,
    /// Rounded panel, bottom-anchored.
    pub panel: kurbo::RoundedRect,
    /// Left edge of the text column.
    pub text_x: f64,
    /// Title font size in px.
    pub title_size: f64,
    /// Body font size in px.
    pub body_size: f64,
    /// Title baseline.
    pub title_baseline: f64,
    /// Wrapped body lines with their baselines.
    pub lines: Vec<(f64, String)>,
}

impl CardLayout {
    /// Lay out `body` on a `width`×`height` image. Zero sizes fall back to the reference size.
    pub fn compute(width: u32, height: u32, scheme: PanelScheme, body: &str) -> Self {
        let (width, height) = if width == 0 || height == 0 {
            (REFERENCE_WIDTH, REFERENCE_HEIGHT)
        } else {
            (width, height)
        };
        let w = f64::from(width);
        let h = f64::from(height);
        let scale = w / f64::from(REFERENCE_WIDTH);

        let margin = (w * MARGIN_FRAC).round();
        let padding = (w * PADDING_FRAC).round();
        let title_size = (TITLE_PX * scale).max(1.0);
        let body_size = (BODY_PX * scale).max(1.0);

        let panel_w = (w - 2.0 * margin).max(1.0);
        let inner_w = (panel_w - 2.0 * padding).max(1.0);
        let max_chars = text::max_chars_per_line(inner_w, body_size);
        let wrapped = text::wrap_lines(body, max_chars, MAX_BODY_LINES);

        let panel_h = match scheme {
            PanelScheme::Band => h * BAND_HEIGHT_FRAC,
            PanelScheme::Card => {
                2.0 * padding
                    + title_size * LINE_HEIGHT
                    + wrapped.len() as f64 * body_size * LINE_HEIGHT
            }
        }
        .min(h - 2.0 * margin)
        .max(1.0);

        let x0 = margin;
        let x1 = w - margin;
        let y1 = h - margin;
        let y0 = y1 - panel_h;
        let panel = kurbo::RoundedRect::new(x0, y0, x1, y1, (w * RADIUS_FRAC).round());

        let title_baseline = y0 + padding + title_size * 0.9;
        let lines = wrapped
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let baseline = title_baseline
                    + title_size * 0.35
                    + (i as f64 + 1.0) * body_size * LINE_HEIGHT
                    - body_size * 0.35;
                (baseline, line)
            })
            .collect();

        Self {
            width,
            height,
            panel,
            text_x: x0 + padding,
            title_size,
            body_size,
            title_baseline,
            lines,
        }
    }

    /// SVG markup for the card. Title and body are escaped.
    pub fn to_svg(&self, title: &str, style: &OverlayStyle) -> String {
        let font = text::escape_xml(&style.font_family);
        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height,
        );
        let _ = write!(
            svg,
            r#"<path d="{}" fill="{}" fill-opacity="{:.3}"/>"#,
            self.panel.to_path(0.1).to_svg(),
            text::escape_xml(&style.panel_color),
            style.panel_opacity,
        );
        let _ = write!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" font-family="{font}" font-size="{:.2}" font-weight="bold" fill="{}">{}</text>"#,
            self.text_x,
            self.title_baseline,
            self.title_size,
            text::escape_xml(&style.title_color),
            text::escape_xml(title.trim()),
        );
        for (baseline, line) in &self.lines {
            let _ = write!(
                svg,
                r#"<text x="{:.2}" y="{:.2}" font-family="{font}" font-size="{:.2}" fill="{}">{}</text>"#,
                self.text_x,
                baseline,
                self.body_size,
                text::escape_xml(&style.body_color),
                text::escape_xml(line),
            );
        }
        svg.push_str("</svg>");
        svg
    }
}

/// Composites wrapped title+body cards onto images.
///
/// Holds the font database so system fonts are scanned once per library, not per render.
pub struct OverlayRenderer {
    style: OverlayStyle,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for OverlayRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayRenderer")
            .field("style", &self.style)
            .field("font_faces", &self.fontdb.len())
            .finish()
    }
}

impl OverlayRenderer {
    /// Build a renderer with system fonts plus `style.fonts_dir`.
    pub fn new(style: OverlayStyle) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        if let Some(dir) = &style.fonts_dir {
            load_fonts_from_dir(&mut db, dir);
        }
        tracing::debug!(faces = db.len(), "overlay font database ready");
        Self {
            style,
            fontdb: Arc::new(db),
        }
    }

    /// Composite a card with `title` and `body` onto `base_path` and write a PNG to `out_path`.
    ///
    /// Missing output directories are created. The PNG is written to a temporary file and
    /// renamed, so a failure never leaves a partial file at `out_path`.
    #[tracing::instrument(skip(self, title, body), fields(base = %base_path.display(), out = %out_path.display()))]
    pub fn render_card(
        &self,
        base_path: &Path,
        out_path: &Path,
        title: &str,
        body: &str,
    ) -> BookResult<RenderedSize> {
        let base = decode_oriented(base_path)?;
        let mut rgba = base.to_rgba8();
        let (width, height) = rgba.dimensions();

        let layout = CardLayout::compute(width, height, self.style.scheme, body);
        let overlay = self.rasterize(&layout.to_svg(title, &self.style), width, height)?;
        let pixels: &mut [u8] = &mut rgba;
        composite::over_straight_in_place(pixels, &overlay)?;

        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(rgba)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| BookError::io_other(out_path, e))?;
        fs::write_atomic(out_path, &png)?;

        tracing::debug!(width, height, lines = layout.lines.len(), "card rendered");
        Ok(RenderedSize { width, height })
    }

    fn rasterize(&self, svg: &str, width: u32, height: u32) -> BookResult<Vec<u8>> {
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            font_resolver: font_resolver(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(svg, &opts)
            .map_err(|e| BookError::Other(anyhow::anyhow!("parse card svg: {e}")))?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
            BookError::Other(anyhow::anyhow!(
                "failed to allocate {width}x{height} overlay pixmap"
            ))
        })?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::default(),
            &mut pixmap.as_mut(),
        );
        Ok(pixmap.take())
    }
}

/// Decode an image and apply its EXIF orientation.
pub fn decode_oriented(path: &Path) -> BookResult<image::DynamicImage> {
    let reader = image::ImageReader::open(path)
        .map_err(|e| BookError::io(path, e))?
        .with_guessed_format()
        .map_err(|e| BookError::io(path, e))?;
    let mut decoder = reader
        .into_decoder()
        .map_err(|e| BookError::io_other(path, e))?;
    let orientation = decoder
        .orientation()
        .unwrap_or(image::metadata::Orientation::NoTransforms);
    let mut img =
        image::DynamicImage::from_decoder(decoder).map_err(|e| BookError::io_other(path, e))?;
    img.apply_orientation(orientation);
    Ok(img)
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "fonts dir not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        if !matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc") {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable font");
        }
    }
}

// Any installed face beats dropping the text when the requested families are missing.
fn font_resolver() -> usvg::FontResolver<'static> {
    let select = usvg::FontResolver::default_font_selector();
    usvg::FontResolver {
        select_font: Box::new(move |font, fontdb| {
            select(font, fontdb).or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: usvg::FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/overlay.rs"]
mod tests;
