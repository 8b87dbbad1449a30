//! Fit-to-canvas geometry for image export.
//!
//! Everything here is pure arithmetic over a snapshot: the content bounding
//! box, the uniform scale and centering offset, and the scaled placement of
//! every node box, label, underline, edge line and arrowhead. The raster
//! stage only paints what this module computes.

use crate::constants::*;
use crate::types::{EdgeRecord, MindMapSnapshot, NodeRecord};

/// A point in export (pixel) space.
pub type Point = (f32, f32);

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// Uniform scale plus translation mapping world space into the target image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl FitTransform {
    /// The transform used for empty graphs.
    pub const IDENTITY: FitTransform = FitTransform {
        scale: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    /// Maps a world-space point into the target image.
    pub fn apply(&self, x: f32, y: f32) -> Point {
        (x * self.scale + self.offset_x, y * self.scale + self.offset_y)
    }
}

/// Bounding box of all node footprints, expanded by the export padding.
///
/// Returns `None` for a graph without nodes.
pub fn content_bounds(nodes: &[NodeRecord]) -> Option<Bounds> {
    let mut iter = nodes.iter();
    let first = iter.next()?;
    let mut bounds = Bounds {
        min_x: first.position.x,
        min_y: first.position.y,
        max_x: first.position.x + NODE_WIDTH,
        max_y: first.position.y + NODE_HEIGHT,
    };
    for node in iter {
        bounds.min_x = bounds.min_x.min(node.position.x);
        bounds.min_y = bounds.min_y.min(node.position.y);
        bounds.max_x = bounds.max_x.max(node.position.x + NODE_WIDTH);
        bounds.max_y = bounds.max_y.max(node.position.y + NODE_HEIGHT);
    }

    bounds.min_x -= EXPORT_PADDING;
    bounds.min_y -= EXPORT_PADDING;
    bounds.max_x += EXPORT_PADDING;
    bounds.max_y += EXPORT_PADDING;
    Some(bounds)
}

/// Largest scale not above 1.0 at which `bounds` fits the target, centered.
pub fn fit_transform(bounds: &Bounds, width: u32, height: u32) -> FitTransform {
    let (width, height) = (width as f32, height as f32);
    let content_w = bounds.width();
    let content_h = bounds.height();
    let scale = (width / content_w).min(height / content_h).min(1.0);

    FitTransform {
        scale,
        offset_x: (width - content_w * scale) / 2.0 - bounds.min_x * scale,
        offset_y: (height - content_h * scale) / 2.0 - bounds.min_y * scale,
    }
}

/// A node placed in the target image.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode<'a> {
    pub node: &'a NodeRecord,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub corner_radius: f32,
    pub border_width: f32,
    /// Center of the label
    pub text_anchor: Point,
    pub font_size: f32,
    /// Present when the label is underlined
    pub underline: Option<(Point, Point)>,
    pub underline_width: f32,
}

/// An edge placed in the target image.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedEdge<'a> {
    pub edge: &'a EdgeRecord,
    /// Right-center of the source box
    pub start: Point,
    /// Left-center of the target box
    pub end: Point,
    /// Outer ends of the two arrowhead strokes, both drawn from `end`
    pub arrow: [Point; 2],
    pub stroke_width: f32,
}

/// Full export geometry for one snapshot and target size.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportLayout<'a> {
    pub width: u32,
    pub height: u32,
    pub transform: FitTransform,
    pub nodes: Vec<PlacedNode<'a>>,
    pub edges: Vec<PlacedEdge<'a>>,
}

impl<'a> ExportLayout<'a> {
    /// Computes the layout of `snapshot` inside a `width` x `height` image.
    ///
    /// Edges whose endpoints are missing from the snapshot are skipped.
    pub fn compute(snapshot: &'a MindMapSnapshot, width: u32, height: u32) -> Self {
        let transform = content_bounds(&snapshot.nodes)
            .map(|bounds| fit_transform(&bounds, width, height))
            .unwrap_or(FitTransform::IDENTITY);

        let nodes = snapshot
            .nodes
            .iter()
            .map(|node| place_node(node, &transform))
            .collect();

        let edges = snapshot
            .edges
            .iter()
            .filter_map(|edge| {
                let source = snapshot.node(&edge.source)?;
                let target = snapshot.node(&edge.target)?;
                Some(place_edge(edge, source, target, &transform))
            })
            .collect();

        Self {
            width,
            height,
            transform,
            nodes,
            edges,
        }
    }
}

fn place_node<'a>(node: &'a NodeRecord, transform: &FitTransform) -> PlacedNode<'a> {
    let scale = transform.scale;
    let (x, y) = transform.apply(node.position.x, node.position.y);
    let width = NODE_WIDTH * scale;
    let height = NODE_HEIGHT * scale;
    let text_anchor = (x + width / 2.0, y + height / 2.0);

    let underline = node.style.is_underlined().then(|| {
        let line_y = text_anchor.1 + UNDERLINE_OFFSET * scale;
        (
            (x + UNDERLINE_INSET * scale, line_y),
            (x + width - UNDERLINE_INSET * scale, line_y),
        )
    });

    PlacedNode {
        node,
        x,
        y,
        width,
        height,
        corner_radius: NODE_CORNER_RADIUS * scale,
        border_width: EXPORT_BORDER_WIDTH * scale,
        text_anchor,
        font_size: node.style.font_size_or_default() * scale,
        underline,
        underline_width: scale,
    }
}

fn place_edge<'a>(
    edge: &'a EdgeRecord,
    source: &NodeRecord,
    target: &NodeRecord,
    transform: &FitTransform,
) -> PlacedEdge<'a> {
    let scale = transform.scale;
    let start = transform.apply(
        source.position.x + NODE_WIDTH,
        source.position.y + NODE_HEIGHT / 2.0,
    );
    let end = transform.apply(target.position.x, target.position.y + NODE_HEIGHT / 2.0);

    PlacedEdge {
        edge,
        start,
        end,
        arrow: arrowhead(start, end, ARROW_LENGTH * scale),
        stroke_width: edge.style.stroke_width_or_default() * scale,
    }
}

/// The two stroke ends of an arrowhead pointing at `end`.
pub fn arrowhead(start: Point, end: Point, length: f32) -> [Point; 2] {
    let angle = (end.1 - start.1).atan2(end.0 - start.0);
    [
        (
            end.0 - length * (angle - ARROW_HALF_ANGLE).cos(),
            end.1 - length * (angle - ARROW_HALF_ANGLE).sin(),
        ),
        (
            end.0 - length * (angle + ARROW_HALF_ANGLE).cos(),
            end.1 - length * (angle + ARROW_HALF_ANGLE).sin(),
        ),
    ]
}
