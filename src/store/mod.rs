//! The mind-map store: single source of truth for the graph being edited.
//!
//! [`MindMapStore`] owns the nodes, edges and viewport, the current
//! selection, and a bounded linear undo/redo history of full snapshots. It is
//! an ordinary value: construct one per editor instance and pass it by
//! reference to whatever needs it.
//!
//! Structural edits (add/delete node or edge, load, child creation) record a
//! history entry. Label, style and position edits do not; the editor records
//! one entry through [`MindMapStore::save_to_history`] when such an
//! interaction is committed.

mod changes;
mod history;

#[cfg(test)]
mod tests;

pub use changes::{ChangeSummary, EdgeChange, NodeChange};
pub use history::History;

use crate::constants;
use crate::ids::IdGenerator;
use crate::types::*;
use log::{debug, warn};

/// Errors reported by store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("edge endpoint does not exist: {node_id}")]
    MissingEndpoint { node_id: NodeId },
}

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// What is currently selected. Node and edge selection are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Node(NodeId),
    Edge(EdgeId),
}

/// Fields to merge into an existing node. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeUpdate {
    pub label: Option<String>,
    pub kind: Option<NodeKind>,
    pub position: Option<Position>,
    /// Merged field by field into the node's style
    pub style: Option<NodeStyle>,
}

impl NodeUpdate {
    /// An update that only changes the label.
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    /// An update that only merges style fields.
    pub fn style(style: NodeStyle) -> Self {
        Self {
            style: Some(style),
            ..Default::default()
        }
    }
}

/// In-memory graph state with selection and undo/redo.
#[derive(Debug, Clone)]
pub struct MindMapStore {
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
    viewport: Viewport,
    selection: Selection,
    is_editing: bool,
    history: History,
    ids: IdGenerator,
}

impl Default for MindMapStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MindMapStore {
    /// Creates an empty store. The empty graph is the first history entry.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            viewport: Viewport::default(),
            selection: Selection::None,
            is_editing: false,
            history: History::new(MindMapSnapshot::default()),
            ids: IdGenerator::new(),
        }
    }

    /// Creates a store whose baseline is `snapshot`.
    pub fn from_snapshot(snapshot: MindMapSnapshot) -> Self {
        let mut store = Self::new();
        store.replace_content(snapshot);
        store.history = History::new(store.export_snapshot());
        store
    }

    // Accessors

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Looks up an edge by id.
    pub fn edge(&self, id: &str) -> Option<&EdgeRecord> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn selected_node_id(&self) -> Option<&NodeId> {
        match &self.selection {
            Selection::Node(id) => Some(id),
            _ => None,
        }
    }

    pub fn selected_edge_id(&self) -> Option<&EdgeId> {
        match &self.selection {
            Selection::Edge(id) => Some(id),
            _ => None,
        }
    }

    /// True while a node label is being edited in place.
    pub fn is_editing(&self) -> bool {
        self.is_editing
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Read-only view of the undo/redo timeline.
    pub fn history(&self) -> &History {
        &self.history
    }

    // Setters without history

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Selects a node (or clears the selection with `None`). Clears any edge selection.
    pub fn set_selected_node(&mut self, id: Option<NodeId>) {
        self.selection = id.map_or(Selection::None, Selection::Node);
    }

    /// Selects an edge (or clears the selection with `None`). Clears any node selection.
    pub fn set_selected_edge(&mut self, id: Option<EdgeId>) {
        self.selection = id.map_or(Selection::None, Selection::Edge);
    }

    pub fn set_editing(&mut self, editing: bool) {
        self.is_editing = editing;
    }

    // Node operations

    /// Adds a node at `position` and selects it. Returns the new id.
    pub fn add_node(&mut self, position: Position, label: Option<&str>) -> NodeId {
        let id = self.insert_node(position, label);
        self.selection = Selection::Node(id.clone());
        self.save_to_history();
        id
    }

    /// Merges `update` into the node `id`. Returns false if there is no such node.
    ///
    /// This does not record a history entry.
    pub fn update_node(&mut self, id: &str, update: NodeUpdate) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        if let Some(label) = update.label {
            node.label = label;
        }
        if let Some(kind) = update.kind {
            node.kind = kind;
        }
        if let Some(position) = update.position {
            node.position = position;
        }
        if let Some(style) = &update.style {
            node.style.merge(style);
        }
        true
    }

    /// Removes the node `id` and every edge touching it.
    ///
    /// Returns false and leaves the store (including its history) untouched
    /// when the node does not exist.
    pub fn delete_node(&mut self, id: &str) -> bool {
        if !self.remove_node_cascading(id) {
            return false;
        }
        self.save_to_history();
        true
    }

    /// Adds a child to the right of `parent_id` and connects parent to child.
    ///
    /// Records a single history entry. Returns `None` if the parent does not exist.
    pub fn add_child_node(&mut self, parent_id: &str, label: Option<&str>) -> Option<NodeId> {
        let parent = self.node(parent_id)?;
        let position = Position::new(
            parent.position.x + constants::CHILD_NODE_OFFSET_X,
            parent.position.y,
        );
        let child = self.insert_node(position, label);
        let edge_id = self.next_edge_id();
        self.edges
            .push(EdgeRecord::new(edge_id, parent_id.to_string(), child.clone()));
        self.selection = Selection::Node(child.clone());
        self.save_to_history();
        Some(child)
    }

    // Edge operations

    /// Connects `source` to `target`. Both nodes must exist.
    ///
    /// Self-loops and parallel edges are allowed.
    pub fn add_edge(&mut self, source: &str, target: &str) -> Result<EdgeId> {
        for endpoint in [source, target] {
            if self.node(endpoint).is_none() {
                return Err(StoreError::MissingEndpoint {
                    node_id: endpoint.to_string(),
                });
            }
        }
        let id = self.next_edge_id();
        self.edges.push(EdgeRecord::new(
            id.clone(),
            source.to_string(),
            target.to_string(),
        ));
        self.save_to_history();
        Ok(id)
    }

    /// Merges `style` into the edge `id`. Returns false if there is no such edge.
    ///
    /// Like [`MindMapStore::update_node`], this does not record a history entry.
    pub fn update_edge(&mut self, id: &str, style: &EdgeStyle) -> bool {
        let Some(edge) = self.edges.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        if let Some(stroke) = &style.stroke {
            edge.style.stroke = Some(stroke.clone());
        }
        if let Some(width) = style.stroke_width {
            edge.style.stroke_width = Some(width);
        }
        true
    }

    /// Removes the edge `id`. Returns false, recording nothing, if it does not exist.
    pub fn delete_edge(&mut self, id: &str) -> bool {
        if !self.remove_edge(id) {
            return false;
        }
        self.save_to_history();
        true
    }

    // Batched changes

    /// Applies canvas deltas to nodes in one pass without recording history.
    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) -> ChangeSummary {
        let mut summary = ChangeSummary::default();
        for change in changes {
            match change {
                NodeChange::Position {
                    id,
                    position,
                    dragging,
                } => {
                    if let Some(node) = self.nodes.iter_mut().find(|n| &n.id == id) {
                        node.position = *position;
                        summary.moved += 1;
                        summary.dragging |= *dragging;
                    }
                }
                NodeChange::Select { id, selected } => {
                    if *selected {
                        if self.node(id).is_some() {
                            self.selection = Selection::Node(id.clone());
                        }
                    } else if self.selected_node_id() == Some(id) {
                        self.selection = Selection::None;
                    }
                }
                NodeChange::Remove { id } => {
                    let edges_before = self.edges.len();
                    if self.remove_node_cascading(id) {
                        summary.removed += 1 + (edges_before - self.edges.len());
                    }
                }
            }
        }
        summary
    }

    /// Applies canvas deltas to edges in one pass without recording history.
    pub fn apply_edge_changes(&mut self, changes: &[EdgeChange]) -> ChangeSummary {
        let mut summary = ChangeSummary::default();
        for change in changes {
            match change {
                EdgeChange::Select { id, selected } => {
                    if *selected {
                        if self.edge(id).is_some() {
                            self.selection = Selection::Edge(id.clone());
                        }
                    } else if self.selected_edge_id() == Some(id) {
                        self.selection = Selection::None;
                    }
                }
                EdgeChange::Remove { id } => {
                    if self.remove_edge(id) {
                        summary.removed += 1;
                    }
                }
            }
        }
        summary
    }

    // Snapshots and history

    /// Replaces the whole graph and viewport. Becomes the new undo baseline.
    pub fn load_snapshot(&mut self, snapshot: MindMapSnapshot) {
        self.replace_content(snapshot);
        self.save_to_history();
    }

    /// Projects the current graph and viewport into a snapshot.
    pub fn export_snapshot(&self) -> MindMapSnapshot {
        MindMapSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            viewport: self.viewport,
        }
    }

    /// Records the current state as a new history entry, discarding any redo entries.
    pub fn save_to_history(&mut self) {
        let snapshot = self.export_snapshot();
        self.history.record(snapshot);
        debug!(
            "history entry {} of {} recorded",
            self.history.cursor() + 1,
            self.history.len()
        );
    }

    /// Steps back one history entry. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.step_back().cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    /// Steps forward one history entry. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.step_forward().cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    // Internals

    fn insert_node(&mut self, position: Position, label: Option<&str>) -> NodeId {
        let id = {
            let nodes = &self.nodes;
            self.ids
                .next_node_id_where(|candidate| nodes.iter().all(|n| n.id != candidate))
        };
        let label = label.unwrap_or(constants::DEFAULT_NODE_LABEL);
        self.nodes.push(NodeRecord::new(id.clone(), label, position));
        id
    }

    fn next_edge_id(&mut self) -> EdgeId {
        let edges = &self.edges;
        self.ids
            .next_edge_id_where(|candidate| edges.iter().all(|e| e.id != candidate))
    }

    fn remove_node_cascading(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        if self.nodes.len() == before {
            return false;
        }
        self.edges.retain(|e| !e.touches(id));

        let selection_gone = match &self.selection {
            Selection::Node(selected) => selected == id,
            Selection::Edge(selected) => self.edges.iter().all(|e| &e.id != selected),
            Selection::None => false,
        };
        if selection_gone {
            self.selection = Selection::None;
        }
        true
    }

    fn remove_edge(&mut self, id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| e.id != id);
        if self.edges.len() == before {
            return false;
        }
        if self.selected_edge_id().map(String::as_str) == Some(id) {
            self.selection = Selection::None;
        }
        true
    }

    /// Installs `snapshot` as live content and resets transient UI state.
    fn replace_content(&mut self, snapshot: MindMapSnapshot) {
        let MindMapSnapshot {
            nodes,
            mut edges,
            viewport,
        } = snapshot;

        edges.retain(|edge| {
            let valid = nodes.iter().any(|n| n.id == edge.source)
                && nodes.iter().any(|n| n.id == edge.target);
            if !valid {
                warn!(
                    "dropping edge {} with missing endpoint ({} -> {})",
                    edge.id, edge.source, edge.target
                );
            }
            valid
        });

        self.nodes = nodes;
        self.edges = edges;
        self.viewport = viewport;
        self.selection = Selection::None;
        self.is_editing = false;
    }

    /// Installs a history entry without recording a new one.
    fn restore(&mut self, snapshot: MindMapSnapshot) {
        self.replace_content(snapshot);
    }
}
