//! Batched change sets coming from the interactive canvas.
//!
//! A drag or a multi-selection edit produces many small deltas per frame. They
//! are applied in one pass without touching the undo history; the editor
//! surface records a single history entry once the interaction is committed.

use crate::types::{EdgeId, NodeId, Position};

/// A single delta against the node set.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeChange {
    /// A node moved; `dragging` is true while the pointer is still held
    Position {
        id: NodeId,
        position: Position,
        dragging: bool,
    },
    /// A node entered or left the selection
    Select { id: NodeId, selected: bool },
    /// A node was removed; incident edges are removed with it
    Remove { id: NodeId },
}

/// A single delta against the edge set.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeChange {
    /// An edge entered or left the selection
    Select { id: EdgeId, selected: bool },
    /// An edge was removed
    Remove { id: EdgeId },
}

/// What a batch actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    /// Nodes or edges that moved
    pub moved: usize,
    /// Nodes or edges that were removed, including cascaded edges
    pub removed: usize,
    /// True if any `Position` change in the batch was still dragging
    pub dragging: bool,
}

impl ChangeSummary {
    /// True if the batch altered graph content (selection changes do not count).
    pub fn altered_graph(&self) -> bool {
        self.moved > 0 || self.removed > 0
    }
}
