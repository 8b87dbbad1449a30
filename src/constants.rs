//! Shared application-wide constants.
//! Centralizes tweakable values used by the store, the export renderer and the editor surface.

// Node footprint
/// Approximate rendered node width in world units. Node positions are the top-left corner.
pub const NODE_WIDTH: f32 = 200.0;
/// Approximate rendered node height in world units.
pub const NODE_HEIGHT: f32 = 100.0;
/// Corner radius for node rectangles (world units, scaled on export).
pub const NODE_CORNER_RADIUS: f32 = 8.0;
/// Horizontal distance between a parent node and a child created from it.
pub const CHILD_NODE_OFFSET_X: f32 = 200.0;

// Defaults applied to new nodes and edges, and at render time for absent style fields
/// Label given to nodes created without an explicit label.
pub const DEFAULT_NODE_LABEL: &str = "New Node";
/// Default node background color.
pub const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";
/// Default node border color.
pub const DEFAULT_BORDER_COLOR: &str = "#000000";
/// Default node text color.
pub const DEFAULT_TEXT_COLOR: &str = "#000000";
/// Default label font size in pixels.
pub const DEFAULT_FONT_SIZE: f32 = 14.0;
/// Default edge stroke color.
pub const DEFAULT_EDGE_STROKE: &str = "#000000";
/// Default edge stroke width.
pub const DEFAULT_EDGE_STROKE_WIDTH: f32 = 2.0;

// Undo/redo
/// Maximum number of history snapshots to retain.
pub const MAX_HISTORY_ENTRIES: usize = 50;

// Image export
/// Padding (world units) added around the content bounding box.
pub const EXPORT_PADDING: f32 = 50.0;
/// Default export width in pixels.
pub const DEFAULT_EXPORT_WIDTH: u32 = 1920;
/// Default export height in pixels.
pub const DEFAULT_EXPORT_HEIGHT: u32 = 1080;
/// Default JPEG quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;
/// Border width of exported nodes before scaling.
pub const EXPORT_BORDER_WIDTH: f32 = 2.0;
/// Arrowhead stroke length before scaling.
pub const ARROW_LENGTH: f32 = 10.0;
/// Arrowhead half-angle in radians (30 degrees).
pub const ARROW_HALF_ANGLE: f32 = std::f32::consts::PI / 6.0;
/// Horizontal inset of the label underline from each side of the node box.
pub const UNDERLINE_INSET: f32 = 10.0;
/// Vertical offset of the label underline below the text center line.
pub const UNDERLINE_OFFSET: f32 = 5.0;

// Canvas interactions
/// Grid cell size in world units; shift-dragging snaps to it.
pub const GRID_SIZE: f32 = 15.0;
/// Minimum canvas zoom.
pub const MIN_ZOOM: f32 = 0.1;
/// Maximum canvas zoom.
pub const MAX_ZOOM: f32 = 2.0;
/// Click threshold in world units used for distinguishing click vs drag.
pub const CLICK_THRESHOLD: f32 = 10.0;
/// Maximum distance (world units) from an edge line that still counts as a hit.
pub const EDGE_HIT_DISTANCE: f32 = 8.0;
/// Where the toolbar's "Add Node" button places new nodes.
pub const TOOLBAR_NODE_X: f32 = 100.0;
pub const TOOLBAR_NODE_Y: f32 = 100.0;
