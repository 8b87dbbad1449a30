//! Core data types for mind maps.
//!
//! This module defines the graph records held by the store and written to disk:
//! nodes, edges, their styles, the viewport, and the snapshot that bundles them.
//! The JSON shape matches the persisted format (`{ nodes, edges, viewport }`).

use crate::constants;
use serde::{Deserialize, Serialize};

/// Identifier of a node, unique within an editing session.
pub type NodeId = String;

/// Identifier of an edge, unique within an editing session.
pub type EdgeId = String;

/// A point in world space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f32,
    /// Vertical coordinate
    pub y: f32,
}

impl Position {
    /// Creates a position from its coordinates.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Node flavour kept for compatibility with the persisted format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A regular node
    #[default]
    Default,
    /// A node without incoming handles
    Input,
}

/// Label font weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Label font style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Label decoration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
}

/// Visual style of a node. Every field is optional; defaults are applied at render time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    /// Text color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_decoration: Option<TextDecoration>,
}

impl NodeStyle {
    /// The fully populated style given to freshly created nodes.
    pub fn initial() -> Self {
        Self {
            background_color: Some(constants::DEFAULT_BACKGROUND_COLOR.to_string()),
            border_color: Some(constants::DEFAULT_BORDER_COLOR.to_string()),
            color: Some(constants::DEFAULT_TEXT_COLOR.to_string()),
            font_size: Some(constants::DEFAULT_FONT_SIZE),
            font_weight: Some(FontWeight::Normal),
            font_style: Some(FontStyle::Normal),
            text_decoration: Some(TextDecoration::None),
        }
    }

    /// Returns true when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrites every field that is set in `patch`, leaving the others untouched.
    pub fn merge(&mut self, patch: &NodeStyle) {
        if let Some(v) = &patch.background_color {
            self.background_color = Some(v.clone());
        }
        if let Some(v) = &patch.border_color {
            self.border_color = Some(v.clone());
        }
        if let Some(v) = &patch.color {
            self.color = Some(v.clone());
        }
        if let Some(v) = patch.font_size {
            self.font_size = Some(v);
        }
        if let Some(v) = patch.font_weight {
            self.font_weight = Some(v);
        }
        if let Some(v) = patch.font_style {
            self.font_style = Some(v);
        }
        if let Some(v) = patch.text_decoration {
            self.text_decoration = Some(v);
        }
    }

    pub fn background_or_default(&self) -> &str {
        self.background_color
            .as_deref()
            .unwrap_or(constants::DEFAULT_BACKGROUND_COLOR)
    }

    pub fn border_or_default(&self) -> &str {
        self.border_color
            .as_deref()
            .unwrap_or(constants::DEFAULT_BORDER_COLOR)
    }

    pub fn text_color_or_default(&self) -> &str {
        self.color.as_deref().unwrap_or(constants::DEFAULT_TEXT_COLOR)
    }

    pub fn font_size_or_default(&self) -> f32 {
        self.font_size.unwrap_or(constants::DEFAULT_FONT_SIZE)
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight == Some(FontWeight::Bold)
    }

    pub fn is_italic(&self) -> bool {
        self.font_style == Some(FontStyle::Italic)
    }

    pub fn is_underlined(&self) -> bool {
        self.text_decoration == Some(TextDecoration::Underline)
    }
}

/// A single node of the mind map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Unique identifier for this node
    pub id: NodeId,
    /// Text shown inside the node
    pub label: String,
    /// Node flavour
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    /// Top-left corner of the node in world space
    pub position: Position,
    /// Optional visual style
    #[serde(default, skip_serializing_if = "NodeStyle::is_empty")]
    pub style: NodeStyle,
}

impl NodeRecord {
    /// Creates a node with the initial style.
    pub fn new(id: NodeId, label: impl Into<String>, position: Position) -> Self {
        Self {
            id,
            label: label.into(),
            kind: NodeKind::Default,
            position,
            style: NodeStyle::initial(),
        }
    }
}

/// Visual style of an edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f32>,
}

impl EdgeStyle {
    /// The style given to freshly created edges.
    pub fn initial() -> Self {
        Self {
            stroke: Some(constants::DEFAULT_EDGE_STROKE.to_string()),
            stroke_width: Some(constants::DEFAULT_EDGE_STROKE_WIDTH),
        }
    }

    /// Returns true when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn stroke_or_default(&self) -> &str {
        self.stroke.as_deref().unwrap_or(constants::DEFAULT_EDGE_STROKE)
    }

    pub fn stroke_width_or_default(&self) -> f32 {
        self.stroke_width
            .unwrap_or(constants::DEFAULT_EDGE_STROKE_WIDTH)
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// ID of the source node
    pub source: NodeId,
    /// ID of the target node
    pub target: NodeId,
    /// Optional visual style
    #[serde(default, skip_serializing_if = "EdgeStyle::is_empty")]
    pub style: EdgeStyle,
}

impl EdgeRecord {
    /// Creates an edge with the initial style.
    pub fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source,
            target,
            style: EdgeStyle::initial(),
        }
    }

    /// Returns true if either endpoint is `node_id`.
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// Pan offset and zoom of the editor canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// The complete serializable state of a mind map at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MindMapSnapshot {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    #[serde(default)]
    pub viewport: Viewport,
}

impl MindMapSnapshot {
    /// Serialize the snapshot to a pretty JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a snapshot from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
