use super::*;

fn write_png(path: &Path, w: u32, h: u32) {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([40, 90, 160, 255]));
    img.save(path).unwrap();
}

#[test]
fn layout_scales_with_width() {
    let small = CardLayout::compute(510, 400, PanelScheme::Card, "hello world");
    let big = CardLayout::compute(1020, 800, PanelScheme::Card, "hello world");
    assert!((big.title_size - 30.0).abs() < 1e-9);
    assert!((small.title_size - 15.0).abs() < 1e-9);
    assert!(big.panel.rect().x0 >= 1020.0 * 0.014 && big.panel.rect().x0 <= 1020.0 * 0.055);
}

#[test]
fn zero_size_uses_reference_dimensions() {
    let layout = CardLayout::compute(0, 0, PanelScheme::Card, "x");
    assert_eq!((layout.width, layout.height), (REFERENCE_WIDTH, REFERENCE_HEIGHT));
}

#[test]
fn band_height_is_fixed_fraction() {
    let a = CardLayout::compute(1000, 1000, PanelScheme::Band, "short");
    let b = CardLayout::compute(1000, 1000, PanelScheme::Band, &"long text ".repeat(40));
    assert!((a.panel.height() - 280.0).abs() < 1e-6);
    assert!((b.panel.height() - 280.0).abs() < 1e-6);
}

#[test]
fn card_height_follows_line_count() {
    let one = CardLayout::compute(1020, 797, PanelScheme::Card, "curto");
    let many = CardLayout::compute(1020, 797, PanelScheme::Card, &"palavra ".repeat(200));
    assert_eq!(one.lines.len(), 1);
    assert_eq!(many.lines.len(), MAX_BODY_LINES);
    assert!(many.panel.height() > one.panel.height());
    assert!(many.lines.last().unwrap().1.ends_with('…'));
    let panel_bottom = many.panel.rect().y1;
    assert!(many.lines.iter().all(|(y, _)| *y < panel_bottom));
}

#[test]
fn svg_escapes_title_and_body() {
    let layout = CardLayout::compute(400, 300, PanelScheme::Card, "a < b & c");
    let svg = layout.to_svg("<Tom & Jerry>", &OverlayStyle::default());
    assert!(svg.contains("&lt;Tom &amp; Jerry&gt;"));
    assert!(svg.contains("a &lt; b &amp; c"));
    assert!(!svg.contains("<Tom"));
    usvg::Tree::from_str(&svg, &usvg::Options::default()).unwrap();
}

#[test]
fn render_card_keeps_size_and_creates_dirs() {
    let tmp = tempfile::tempdir().unwrap();
    let base = tmp.path().join("page_01.png");
    write_png(&base, 160, 120);
    let out = tmp.path().join("edited").join("nested").join("page_01-1.png");

    let renderer = OverlayRenderer::new(OverlayStyle::default());
    let size = renderer.render_card(&base, &out, "Página 1", "Olá mundo").unwrap();
    assert_eq!(size, RenderedSize { width: 160, height: 120 });

    let rendered = image::open(&out).unwrap().to_rgba8();
    assert_eq!(rendered.dimensions(), (160, 120));
    // The top-left corner is outside the panel.
    assert_eq!(rendered.get_pixel(0, 0).0, [40, 90, 160, 255]);
    // The panel is lighter than the base near the bottom middle.
    let p = rendered.get_pixel(80, 112).0;
    assert!(p[0] > 40);
}

#[test]
fn unreadable_base_fails_without_output() {
    let tmp = tempfile::tempdir().unwrap();
    let base = tmp.path().join("broken.png");
    std::fs::write(&base, b"definitely not a png").unwrap();
    let out = tmp.path().join("out.png");

    let renderer = OverlayRenderer::new(OverlayStyle::default());
    let err = renderer.render_card(&base, &out, "t", "b").unwrap_err();
    assert_eq!(err.kind(), "io_failure");
    assert!(!out.exists());

    let missing = renderer
        .render_card(&tmp.path().join("nope.png"), &out, "t", "b")
        .unwrap_err();
    assert_eq!(missing.kind(), "io_failure");
    assert!(!out.exists());
}
