//! Canvas navigation and pointer interaction.
//!
//! Pan and zoom write to the store's viewport. Dragging applies position
//! changes through the store's batched change API and records one history
//! entry when the drag ends.

use super::state::{MindMapApp, NodeDrag};
use crate::constants::*;
use crate::store::{EdgeChange, NodeChange};
use crate::types::*;
use eframe::egui;
use log::debug;

/// Screen-space rect of a node's footprint at the given pan and zoom.
pub(crate) fn node_screen_rect(viewport: Viewport, node: &NodeRecord) -> egui::Rect {
    let min = world_to_screen_with(viewport, egui::pos2(node.position.x, node.position.y));
    egui::Rect::from_min_size(min, egui::vec2(NODE_WIDTH, NODE_HEIGHT) * viewport.zoom)
}

pub(crate) fn world_to_screen_with(viewport: Viewport, world: egui::Pos2) -> egui::Pos2 {
    egui::pos2(
        world.x * viewport.zoom + viewport.x,
        world.y * viewport.zoom + viewport.y,
    )
}

/// Endpoints of an edge in world space: right-center of the source box to
/// left-center of the target box.
pub(crate) fn edge_world_endpoints(
    source: &NodeRecord,
    target: &NodeRecord,
) -> (egui::Pos2, egui::Pos2) {
    (
        egui::pos2(
            source.position.x + NODE_WIDTH,
            source.position.y + NODE_HEIGHT / 2.0,
        ),
        egui::pos2(target.position.x, target.position.y + NODE_HEIGHT / 2.0),
    )
}

fn point_to_segment_distance(point: egui::Pos2, start: egui::Pos2, end: egui::Pos2) -> f32 {
    let segment = end - start;
    let len_sq = segment.length_sq();
    if len_sq < 0.0001 {
        return (point - start).length();
    }
    let t = ((point - start).dot(segment) / len_sq).clamp(0.0, 1.0);
    (point - (start + segment * t)).length()
}

impl MindMapApp {
    pub fn screen_to_world(&self, screen_pos: egui::Pos2) -> egui::Pos2 {
        let vp = self.store.viewport();
        egui::pos2(
            (screen_pos.x - vp.x) / vp.zoom,
            (screen_pos.y - vp.y) / vp.zoom,
        )
    }

    pub fn world_to_screen(&self, world_pos: egui::Pos2) -> egui::Pos2 {
        world_to_screen_with(self.store.viewport(), world_pos)
    }

    /// Rounds a world position to the nearest grid point.
    pub fn snap_to_grid(&self, pos: egui::Pos2) -> egui::Pos2 {
        egui::pos2(
            (pos.x / GRID_SIZE).round() * GRID_SIZE,
            (pos.y / GRID_SIZE).round() * GRID_SIZE,
        )
    }

    /// Topmost node whose footprint contains `pos` (world space).
    pub fn find_node_at_position(&self, pos: egui::Pos2) -> Option<NodeId> {
        let size = egui::vec2(NODE_WIDTH, NODE_HEIGHT);
        self.store
            .nodes()
            .iter()
            .rev()
            .find(|node| {
                egui::Rect::from_min_size(egui::pos2(node.position.x, node.position.y), size)
                    .contains(pos)
            })
            .map(|node| node.id.clone())
    }

    /// Edge passing within the hit distance of `pos` (world space).
    pub fn find_edge_at_position(&self, pos: egui::Pos2) -> Option<EdgeId> {
        let threshold = EDGE_HIT_DISTANCE / self.store.viewport().zoom;
        self.store
            .edges()
            .iter()
            .rev()
            .find(|edge| {
                let (Some(source), Some(target)) =
                    (self.store.node(&edge.source), self.store.node(&edge.target))
                else {
                    return false;
                };
                let (start, end) = edge_world_endpoints(source, target);
                point_to_segment_distance(pos, start, end) < threshold
            })
            .map(|edge| edge.id.clone())
    }

    /// Middle-button or Cmd/Ctrl + primary drag pans the canvas.
    pub fn handle_canvas_panning(&mut self, ui: &egui::Ui, response: &egui::Response) {
        let should_pan = ui.input(|i| {
            i.pointer.middle_down() || (i.pointer.primary_down() && i.modifiers.command)
        });

        if !should_pan {
            self.interaction.is_panning = false;
            self.interaction.last_pan_pos = None;
            return;
        }
        let Some(current) = response
            .interact_pointer_pos()
            .or_else(|| ui.input(|i| i.pointer.hover_pos()))
        else {
            return;
        };
        if let Some(last) = self.interaction.last_pan_pos {
            let delta = current - last;
            let mut vp = self.store.viewport();
            vp.x += delta.x;
            vp.y += delta.y;
            self.store.set_viewport(vp);
        }
        self.interaction.is_panning = true;
        self.interaction.last_pan_pos = Some(current);
    }

    /// Scroll zoom that keeps the world point under the cursor fixed.
    pub fn handle_canvas_zoom(&mut self, ui: &egui::Ui, response: &egui::Response) {
        let scroll = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll == 0.0 {
            return;
        }
        let Some(mouse) = ui.input(|i| i.pointer.hover_pos()) else {
            return;
        };
        if !response.rect.contains(mouse) {
            return;
        }
        let step = if scroll > 0.0 { 1.1 } else { 1.0 / 1.1 };
        self.zoom_around(mouse, step);
    }

    /// Multiplies the zoom by `factor`, clamped, keeping `anchor` (screen) fixed.
    pub fn zoom_around(&mut self, anchor: egui::Pos2, factor: f32) {
        let world = self.screen_to_world(anchor);
        let mut vp = self.store.viewport();
        vp.zoom = (vp.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        vp.x = anchor.x - world.x * vp.zoom;
        vp.y = anchor.y - world.y * vp.zoom;
        self.store.set_viewport(vp);
    }

    /// Resets pan and zoom so the whole graph is visible in `rect`.
    pub fn fit_view(&mut self, rect: egui::Rect) {
        let Some(bounds) = crate::export::layout::content_bounds(self.store.nodes()) else {
            self.store.set_viewport(Viewport {
                x: rect.center().x,
                y: rect.center().y,
                zoom: 1.0,
            });
            return;
        };
        let zoom = (rect.width() / bounds.width())
            .min(rect.height() / bounds.height())
            .clamp(MIN_ZOOM, MAX_ZOOM);
        self.store.set_viewport(Viewport {
            x: rect.center().x - (bounds.min_x + bounds.width() / 2.0) * zoom,
            y: rect.center().y - (bounds.min_y + bounds.height() / 2.0) * zoom,
            zoom,
        });
    }

    /// Primary-button interaction: select, drag, connect, double-click edit.
    pub fn handle_pointer(&mut self, ui: &egui::Ui, response: &egui::Response) {
        if self.interaction.is_panning {
            return;
        }
        let primary_down = ui.input(|i| i.pointer.primary_down());
        let shift = ui.input(|i| i.modifiers.shift);
        let pointer = response
            .interact_pointer_pos()
            .or_else(|| ui.input(|i| i.pointer.hover_pos()));

        if response.double_clicked() {
            if let Some(pos) = pointer {
                self.handle_double_click(pos);
            }
            return;
        }

        if primary_down {
            let Some(current) = pointer else { return };
            let world = self.screen_to_world(current);
            let idle = self.interaction.drag.is_none()
                && self.interaction.drawing_connection_from.is_none()
                && self.interaction.pending_connection_from.is_none();

            if idle {
                if !ui.input(|i| i.pointer.primary_pressed()) {
                    return;
                }
                self.begin_press(world, current, shift);
            } else if self.interaction.drag.is_some() {
                self.continue_drag(world);
            } else if self.interaction.drawing_connection_from.is_some() {
                self.interaction.connection_draw_pos = Some(current);
            } else if let (Some(from), Some(start)) = (
                self.interaction.pending_connection_from.clone(),
                self.interaction.pending_connection_start,
            ) {
                if (current - start).length() >= CLICK_THRESHOLD {
                    self.interaction.drawing_connection_from = Some(from);
                    self.interaction.connection_draw_pos = Some(current);
                    self.interaction.pending_connection_from = None;
                    self.interaction.pending_connection_start = None;
                }
            }
        } else {
            if self.interaction.drawing_connection_from.is_some() {
                if let Some(pos) = pointer.or(self.interaction.connection_draw_pos) {
                    let world = self.screen_to_world(pos);
                    self.finalize_connection(world);
                }
            }
            self.interaction.drawing_connection_from = None;
            self.interaction.connection_draw_pos = None;
            self.interaction.pending_connection_from = None;
            self.interaction.pending_connection_start = None;
            self.finish_drag();
        }
    }

    fn begin_press(&mut self, world: egui::Pos2, screen: egui::Pos2, shift: bool) {
        if let Some(node_id) = self.find_node_at_position(world) {
            self.commit_label_edit();
            self.store.set_selected_node(Some(node_id.clone()));
            if shift {
                self.interaction.pending_connection_from = Some(node_id);
                self.interaction.pending_connection_start = Some(screen);
            } else if let Some(node) = self.store.node(&node_id) {
                let grab_offset = egui::pos2(node.position.x, node.position.y) - world;
                self.interaction.drag = Some(NodeDrag {
                    node_id,
                    grab_offset,
                    moved: false,
                });
            }
        } else if let Some(edge_id) = self.find_edge_at_position(world) {
            self.commit_label_edit();
            self.store
                .apply_edge_changes(&[EdgeChange::Select { id: edge_id, selected: true }]);
        } else {
            self.commit_label_edit();
            self.store.set_selected_node(None);
        }
    }

    fn continue_drag(&mut self, world: egui::Pos2) {
        let Some(drag) = self.interaction.drag.as_mut() else {
            return;
        };
        let mut target = world + drag.grab_offset;
        let node_id = drag.node_id.clone();
        if self.canvas.snap_to_grid {
            target = self.snap_to_grid(target);
        }
        let unchanged = self
            .store
            .node(&node_id)
            .is_some_and(|n| n.position == Position::new(target.x, target.y));
        if unchanged {
            return;
        }
        let summary = self.store.apply_node_changes(&[NodeChange::Position {
            id: node_id,
            position: Position::new(target.x, target.y),
            dragging: true,
        }]);
        if let Some(drag) = self.interaction.drag.as_mut() {
            drag.moved |= summary.moved > 0;
        }
    }

    fn finish_drag(&mut self) {
        let Some(drag) = self.interaction.drag.take() else {
            return;
        };
        if !drag.moved {
            return;
        }
        if let Some(position) = self.store.node(&drag.node_id).map(|n| n.position) {
            self.store.apply_node_changes(&[NodeChange::Position {
                id: drag.node_id.clone(),
                position,
                dragging: false,
            }]);
        }
        self.store.save_to_history();
        debug!("moved node {}", drag.node_id);
    }

    fn finalize_connection(&mut self, world: egui::Pos2) {
        let Some(from) = self.interaction.drawing_connection_from.clone() else {
            return;
        };
        let Some(to) = self.find_node_at_position(world) else {
            return;
        };
        match self.store.add_edge(&from, &to) {
            Ok(id) => debug!("connected {from} -> {to} as {id}"),
            Err(err) => self.set_status(super::state::StatusMessage::Error(err.to_string())),
        }
    }

    fn handle_double_click(&mut self, screen: egui::Pos2) {
        let world = self.screen_to_world(screen);
        if let Some(node_id) = self.find_node_at_position(world) {
            self.start_label_edit(node_id);
        } else if self.find_edge_at_position(world).is_none() {
            let mut pos = world - egui::vec2(NODE_WIDTH, NODE_HEIGHT) / 2.0;
            if self.canvas.snap_to_grid {
                pos = self.snap_to_grid(pos);
            }
            self.store.add_node(Position::new(pos.x, pos.y), None);
        }
    }

    /// Opens the in-place label editor for `node_id`.
    pub fn start_label_edit(&mut self, node_id: NodeId) {
        let Some(label) = self.store.node(&node_id).map(|n| n.label.clone()) else {
            return;
        };
        self.store.set_selected_node(Some(node_id.clone()));
        self.store.set_editing(true);
        self.interaction.editing_label = Some(node_id);
        self.interaction.label_buffer = label;
        self.interaction.focus_requested = false;
    }

    /// Applies the edited label. Blank labels are discarded.
    pub fn commit_label_edit(&mut self) {
        let Some(node_id) = self.interaction.editing_label.take() else {
            return;
        };
        self.store.set_editing(false);
        let label = self.interaction.label_buffer.trim().to_string();
        self.interaction.label_buffer.clear();
        let changed = self.store.node(&node_id).is_some_and(|n| n.label != label);
        if label.is_empty() || !changed {
            return;
        }
        if self
            .store
            .update_node(&node_id, crate::store::NodeUpdate::label(label))
        {
            self.store.save_to_history();
        }
    }

    pub fn cancel_label_edit(&mut self) {
        self.interaction.editing_label = None;
        self.interaction.label_buffer.clear();
        self.store.set_editing(false);
    }

    /// Draws the in-place label editor over the node being edited.
    pub fn draw_label_editor(&mut self, ui: &mut egui::Ui) {
        let Some(node_id) = self.interaction.editing_label.clone() else {
            return;
        };
        let Some(node) = self.store.node(&node_id) else {
            self.cancel_label_edit();
            return;
        };
        let rect = node_screen_rect(self.store.viewport(), node).shrink(8.0);
        let rect = egui::Rect::from_center_size(rect.center(), egui::vec2(rect.width(), 24.0));

        let response = ui.put(
            rect,
            egui::TextEdit::singleline(&mut self.interaction.label_buffer)
                .horizontal_align(egui::Align::Center),
        );
        if !self.interaction.focus_requested {
            response.request_focus();
            self.interaction.focus_requested = true;
        }
        if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.cancel_label_edit();
        } else if response.lost_focus() {
            self.commit_label_edit();
        }
    }
}
