//! Raster stage of image export.
//!
//! The layout is written out as an SVG scene and rasterized with resvg onto a
//! tiny-skia pixmap of exactly the requested size. Output depends only on the
//! snapshot, the options and the loaded font database.

use super::layout::{ExportLayout, PlacedEdge, PlacedNode};
use super::{ExportError, ExportOptions, ImageFormat, Result};
use crate::types::MindMapSnapshot;
use eframe::egui::Color32;
use log::debug;
use std::fmt::Write as _;
use std::sync::Arc;
use tiny_skia::Pixmap;

/// Font family requested for labels.
const LABEL_FONT_FAMILY: &str = "Arial, Helvetica, sans-serif";

/// Renders snapshots into bitmaps.
///
/// Holds the font database so repeated exports do not rescan system fonts.
/// The editor creates one renderer and hands it to whatever triggers exports.
#[derive(Clone)]
pub struct ExportRenderer {
    fontdb: Arc<fontdb::Database>,
}

impl Default for ExportRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportRenderer {
    /// Creates a renderer using the system fonts.
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        debug!("export renderer loaded {} font faces", db.len());
        Self::with_fonts(db)
    }

    /// Creates a renderer with an explicit font database.
    pub fn with_fonts(db: fontdb::Database) -> Self {
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Renders `snapshot` into a pixmap of `options.width` x `options.height`.
    pub fn render(&self, snapshot: &MindMapSnapshot, options: &ExportOptions) -> Result<Pixmap> {
        let (width, height) = (options.width, options.height);
        let mut pixmap = Pixmap::new(width, height)
            .ok_or(ExportError::InvalidSize { width, height })?;

        let background = parse_color(&options.background)?;
        let [r, g, b, a] = background.to_srgba_unmultiplied();
        pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));

        let layout = ExportLayout::compute(snapshot, width, height);
        let svg = build_svg(&layout);

        let mut opt = usvg::Options::default();
        opt.fontdb = self.fontdb.clone();
        let tree = usvg::Tree::from_data(svg.as_bytes(), &opt)
            .map_err(|e| ExportError::Scene(e.to_string()))?;

        resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
        Ok(pixmap)
    }

    /// Renders and encodes `snapshot` in the format selected by `options`.
    pub fn export_image(&self, snapshot: &MindMapSnapshot, options: &ExportOptions) -> Result<Vec<u8>> {
        if options.format == ImageFormat::Jpeg {
            let [_, _, _, a] = parse_color(&options.background)?.to_srgba_unmultiplied();
            if a != 255 {
                return Err(ExportError::JpegOpaqueBackgroundRequired);
            }
        }
        let pixmap = self.render(snapshot, options)?;
        encode(&pixmap, options.format, options.jpeg_quality)
    }
}

/// Encodes a rendered pixmap.
pub fn encode(pixmap: &Pixmap, format: ImageFormat, jpeg_quality: u8) -> Result<Vec<u8>> {
    match format {
        ImageFormat::Png => pixmap
            .encode_png()
            .map_err(|e| ExportError::PngEncode(e.to_string())),
        ImageFormat::Jpeg => encode_jpeg(pixmap, jpeg_quality),
    }
}

fn encode_jpeg(pixmap: &Pixmap, quality: u8) -> Result<Vec<u8>> {
    let (w, h) = (pixmap.width(), pixmap.height());

    // The background fill is opaque, so premultiplied RGBA equals straight RGB.
    let mut rgb = Vec::with_capacity((w as usize) * (h as usize) * 3);
    for px in pixmap.data().chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }

    let mut out = Vec::new();
    let mut enc =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    enc.encode(&rgb, w, h, image::ExtendedColorType::Rgb8)?;
    Ok(out)
}

/// Parses a `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa` color.
pub fn parse_color(text: &str) -> Result<Color32> {
    let trimmed = text.trim();
    let hex = if trimmed.starts_with('#') {
        trimmed.to_string()
    } else {
        format!("#{trimmed}")
    };
    Color32::from_hex(&hex).map_err(|_| ExportError::InvalidColor(text.to_string()))
}

/// Parses a style color, falling back to `fallback` when it is malformed.
fn style_color(text: &str, fallback: Color32) -> Color32 {
    parse_color(text).unwrap_or(fallback)
}

/// SVG `fill`/`stroke` attribute pair for a color.
fn paint(kind: &str, color: Color32) -> String {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    format!(
        "{kind}=\"#{:02x}{:02x}{:02x}\" {kind}-opacity=\"{}\"",
        r,
        g,
        b,
        (a as f32) / 255.0
    )
}

/// Build an SVG document for `layout`. Nodes are painted first, edges on top.
pub fn build_svg(layout: &ExportLayout<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        w = layout.width,
        h = layout.height
    );

    for placed in &layout.nodes {
        write_node(&mut out, placed);
    }
    for placed in &layout.edges {
        write_edge(&mut out, placed);
    }

    let _ = writeln!(out, "</svg>");
    out
}

fn write_node(out: &mut String, placed: &PlacedNode<'_>) {
    let style = &placed.node.style;
    let fill = style_color(style.background_or_default(), Color32::WHITE);
    let border = style_color(style.border_or_default(), Color32::BLACK);
    let text = style_color(style.text_color_or_default(), Color32::BLACK);

    let _ = writeln!(
        out,
        "<rect x=\"{:.3}\" y=\"{:.3}\" width=\"{:.3}\" height=\"{:.3}\" rx=\"{r:.3}\" ry=\"{r:.3}\" {} {} stroke-width=\"{:.3}\" />",
        placed.x,
        placed.y,
        placed.width,
        placed.height,
        paint("fill", fill),
        paint("stroke", border),
        placed.border_width,
        r = placed.corner_radius,
    );

    if let Some(((x1, y1), (x2, y2))) = placed.underline {
        let _ = writeln!(
            out,
            "<line x1=\"{x1:.3}\" y1=\"{y1:.3}\" x2=\"{x2:.3}\" y2=\"{y2:.3}\" {} stroke-width=\"{:.3}\" />",
            paint("stroke", text),
            placed.underline_width
        );
    }

    let _ = writeln!(
        out,
        "<text x=\"{:.3}\" y=\"{:.3}\" font-family=\"{}\" font-size=\"{:.3}\" font-weight=\"{}\" font-style=\"{}\" {} text-anchor=\"middle\" dominant-baseline=\"central\">{}</text>",
        placed.text_anchor.0,
        placed.text_anchor.1,
        LABEL_FONT_FAMILY,
        placed.font_size,
        if style.is_bold() { "bold" } else { "normal" },
        if style.is_italic() { "italic" } else { "normal" },
        paint("fill", text),
        escape_xml(&placed.node.label)
    );
}

fn write_edge(out: &mut String, placed: &PlacedEdge<'_>) {
    let stroke = style_color(placed.edge.style.stroke_or_default(), Color32::BLACK);
    let (sx, sy) = placed.start;
    let (tx, ty) = placed.end;
    let [(ax1, ay1), (ax2, ay2)] = placed.arrow;

    // Line plus the two arrowhead strokes as one open path.
    let _ = writeln!(
        out,
        "<path d=\"M{sx:.3},{sy:.3} L{tx:.3},{ty:.3} M{tx:.3},{ty:.3} L{ax1:.3},{ay1:.3} M{tx:.3},{ty:.3} L{ax2:.3},{ay2:.3}\" fill=\"none\" {} stroke-width=\"{:.3}\" />",
        paint("stroke", stroke),
        placed.stroke_width
    );
}

/// Escapes markup characters and drops characters XML 1.0 does not allow.
fn escape_xml(input: &str) -> String {
    let mut s = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\t' | '\n' | '\r' => s.push(ch),
            '\u{0}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => {}
            '&' => s.push_str("&amp;"),
            '<' => s.push_str("&lt;"),
            '>' => s.push_str("&gt;"),
            '"' => s.push_str("&quot;"),
            '\'' => s.push_str("&apos;"),
            _ => s.push(ch),
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeRecord, NodeRecord, NodeStyle, Position, TextDecoration};

    fn renderer() -> ExportRenderer {
        // No fonts: shapes still render, labels are skipped.
        ExportRenderer::with_fonts(fontdb::Database::new())
    }

    fn two_node_snapshot() -> MindMapSnapshot {
        let mut a = NodeRecord::new("a".into(), "A & <B>", Position::new(0.0, 0.0));
        a.style.background_color = Some("#ff0000".into());
        a.style.text_decoration = Some(TextDecoration::Underline);
        let b = NodeRecord::new("b".into(), "B", Position::new(400.0, 0.0));
        MindMapSnapshot {
            nodes: vec![a, b],
            edges: vec![EdgeRecord::new("e".into(), "a".into(), "b".into())],
            ..Default::default()
        }
    }

    fn options(width: u32, height: u32) -> ExportOptions {
        ExportOptions {
            width,
            height,
            ..Default::default()
        }
    }

    #[test]
    fn control_characters_are_dropped_from_labels() {
        assert_eq!(escape_xml("a\u{7}b\u{0}\u{1b}c\u{ffff}"), "abc");
        assert_eq!(escape_xml("tab\tline\n"), "tab\tline\n");

        let snapshot = MindMapSnapshot {
            nodes: vec![NodeRecord::new("a".into(), "bell\u{7}", Position::default())],
            ..Default::default()
        };
        let pixmap = renderer().render(&snapshot, &options(320, 200));
        assert!(pixmap.is_ok());
    }

    #[test]
    fn svg_contains_nodes_edges_and_escaped_labels() {
        let snapshot = two_node_snapshot();
        let layout = ExportLayout::compute(&snapshot, 1200, 400);
        let svg = build_svg(&layout);

        assert_eq!(svg.matches("<rect").count(), 2);
        assert_eq!(svg.matches("<path").count(), 1);
        assert_eq!(svg.matches("<line").count(), 1);
        assert!(svg.contains("A &amp; &lt;B&gt;"));
        assert!(svg.contains("fill=\"#ff0000\""));
        // Nodes are painted before edges.
        assert!(svg.rfind("<rect").unwrap() < svg.find("<path").unwrap());
    }

    #[test]
    fn svg_reflects_font_weight_and_style() {
        let mut node = NodeRecord::new("a".into(), "A", Position::default());
        node.style = NodeStyle {
            font_weight: Some(crate::types::FontWeight::Bold),
            font_style: Some(crate::types::FontStyle::Italic),
            ..Default::default()
        };
        let snapshot = MindMapSnapshot {
            nodes: vec![node],
            ..Default::default()
        };
        let svg = build_svg(&ExportLayout::compute(&snapshot, 800, 600));
        assert!(svg.contains("font-weight=\"bold\""));
        assert!(svg.contains("font-style=\"italic\""));
        assert!(svg.contains("font-size=\"14.000\""));
    }

    #[test]
    fn render_fills_background_and_node_boxes() {
        let snapshot = two_node_snapshot();
        let opts = ExportOptions {
            background: "#0000ff".into(),
            ..options(1200, 400)
        };
        let pixmap = renderer().render(&snapshot, &opts).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (1200, 400));

        let corner = pixmap.pixel(0, 0).unwrap();
        assert_eq!((corner.red(), corner.green(), corner.blue()), (0, 0, 255));

        let layout = ExportLayout::compute(&snapshot, 1200, 400);
        let red = &layout.nodes[0];
        let px = pixmap
            .pixel((red.x + 20.0) as u32, (red.y + 20.0) as u32)
            .unwrap();
        assert_eq!((px.red(), px.green(), px.blue()), (255, 0, 0));
    }

    #[test]
    fn rendering_is_deterministic() {
        let snapshot = two_node_snapshot();
        let r = renderer();
        let first = r.render(&snapshot, &options(640, 360)).unwrap();
        let second = r.render(&snapshot, &options(640, 360)).unwrap();
        assert_eq!(first.data(), second.data());
    }

    #[test]
    fn empty_snapshot_renders_background_only() {
        let pixmap = renderer()
            .render(&MindMapSnapshot::default(), &options(32, 16))
            .unwrap();
        assert!(pixmap
            .pixels()
            .iter()
            .all(|p| (p.red(), p.green(), p.blue(), p.alpha()) == (255, 255, 255, 255)));
    }

    #[test]
    fn zero_sized_export_is_rejected() {
        let err = renderer()
            .render(&MindMapSnapshot::default(), &options(0, 10))
            .unwrap_err();
        assert!(matches!(err, ExportError::InvalidSize { width: 0, height: 10 }));
    }

    #[test]
    fn invalid_background_is_rejected() {
        let opts = ExportOptions {
            background: "not-a-color".into(),
            ..options(10, 10)
        };
        assert!(matches!(
            renderer().render(&MindMapSnapshot::default(), &opts),
            Err(ExportError::InvalidColor(_))
        ));
    }

    #[test]
    fn png_and_jpeg_have_expected_signatures() {
        let snapshot = two_node_snapshot();
        let r = renderer();

        let png = r.export_image(&snapshot, &options(320, 200)).unwrap();
        assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));

        let jpeg_opts = ExportOptions {
            format: ImageFormat::Jpeg,
            ..options(320, 200)
        };
        let jpeg = r.export_image(&snapshot, &jpeg_opts).unwrap();
        assert!(jpeg.starts_with(&[0xFF, 0xD8]));
    }

    #[test]
    fn jpeg_requires_opaque_background() {
        let opts = ExportOptions {
            format: ImageFormat::Jpeg,
            background: "#ffffff80".into(),
            ..options(10, 10)
        };
        assert!(matches!(
            renderer().export_image(&MindMapSnapshot::default(), &opts),
            Err(ExportError::JpegOpaqueBackgroundRequired)
        ));
    }

    #[test]
    fn colors_parse_with_or_without_hash() {
        assert_eq!(parse_color("#fff").unwrap(), Color32::WHITE);
        assert_eq!(parse_color("000000").unwrap(), Color32::BLACK);
        assert!(parse_color("#12").is_err());
    }
}
