//! Painting of the live canvas: grid, edges, nodes and the connection preview.

use super::canvas::{edge_world_endpoints, node_screen_rect};
use super::state::MindMapApp;
use crate::constants::*;
use crate::export::layout::arrowhead;
use crate::export::raster::parse_color;
use crate::store::Selection;
use crate::types::*;
use eframe::egui;
use eframe::epaint::StrokeKind;

const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(59, 130, 246);

fn color_or(text: &str, fallback: egui::Color32) -> egui::Color32 {
    parse_color(text).unwrap_or(fallback)
}

fn to_pos(point: (f32, f32)) -> egui::Pos2 {
    egui::pos2(point.0, point.1)
}

impl MindMapApp {
    /// Paints the whole mind map into `canvas_rect`. Edges are drawn below nodes.
    pub fn render_mindmap(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        if self.canvas.show_grid {
            self.draw_grid(painter, canvas_rect);
        }

        let selection = self.store.selection();
        for edge in self.store.edges() {
            let selected = matches!(selection, Selection::Edge(id) if *id == edge.id);
            self.draw_edge(painter, edge, selected);
        }

        if let (Some(from), Some(pos)) = (
            &self.interaction.drawing_connection_from,
            self.interaction.connection_draw_pos,
        ) {
            self.draw_connection_preview(painter, from, pos);
        }

        for node in self.store.nodes() {
            let selected = matches!(selection, Selection::Node(id) if *id == node.id);
            self.draw_node(painter, node, selected);
        }
    }

    /// Dotted background grid, skipped when zoomed too far out to read.
    pub fn draw_grid(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let zoom = self.store.viewport().zoom;
        let screen_step = GRID_SIZE * zoom;
        if screen_step < 6.0 {
            return;
        }
        let color = if self.dark_mode {
            egui::Color32::from_gray(70)
        } else {
            egui::Color32::from_gray(200)
        };

        let top_left = self.screen_to_world(canvas_rect.min);
        let bottom_right = self.screen_to_world(canvas_rect.max);
        let start_x = (top_left.x / GRID_SIZE).floor() * GRID_SIZE;
        let start_y = (top_left.y / GRID_SIZE).floor() * GRID_SIZE;
        let radius = (zoom).clamp(0.5, 1.5);

        let mut y = start_y;
        while y <= bottom_right.y {
            let mut x = start_x;
            while x <= bottom_right.x {
                let p = self.world_to_screen(egui::pos2(x, y));
                if canvas_rect.contains(p) {
                    painter.circle_filled(p, radius, color);
                }
                x += GRID_SIZE;
            }
            y += GRID_SIZE;
        }
    }

    pub fn draw_edge(&self, painter: &egui::Painter, edge: &EdgeRecord, selected: bool) {
        let (Some(source), Some(target)) =
            (self.store.node(&edge.source), self.store.node(&edge.target))
        else {
            return;
        };
        let zoom = self.store.viewport().zoom;
        let (start_world, end_world) = edge_world_endpoints(source, target);
        let start = self.world_to_screen(start_world);
        let end = self.world_to_screen(end_world);

        let (color, width) = if selected {
            (SELECTION_COLOR, (edge.style.stroke_width_or_default() + 1.0) * zoom)
        } else {
            (
                color_or(edge.style.stroke_or_default(), egui::Color32::BLACK),
                edge.style.stroke_width_or_default() * zoom,
            )
        };
        let stroke = egui::Stroke::new(width, color);
        painter.line_segment([start, end], stroke);

        let [a, b] = arrowhead((start.x, start.y), (end.x, end.y), ARROW_LENGTH * zoom);
        painter.line_segment([end, to_pos(a)], stroke);
        painter.line_segment([end, to_pos(b)], stroke);
    }

    pub fn draw_connection_preview(&self, painter: &egui::Painter, from: &str, pointer: egui::Pos2) {
        let Some(node) = self.store.node(from) else {
            return;
        };
        let start = self.world_to_screen(egui::pos2(
            node.position.x + NODE_WIDTH,
            node.position.y + NODE_HEIGHT / 2.0,
        ));
        painter.line_segment(
            [start, pointer],
            egui::Stroke::new(2.0, SELECTION_COLOR.gamma_multiply(0.7)),
        );
    }

    pub fn draw_node(&self, painter: &egui::Painter, node: &NodeRecord, selected: bool) {
        let viewport = self.store.viewport();
        let zoom = viewport.zoom;
        let rect = node_screen_rect(viewport, node);
        let style = &node.style;
        let radius = NODE_CORNER_RADIUS * zoom;

        painter.rect_filled(
            rect,
            radius,
            color_or(style.background_or_default(), egui::Color32::WHITE),
        );
        let border = if selected {
            egui::Stroke::new(3.0 * zoom, SELECTION_COLOR)
        } else {
            egui::Stroke::new(
                EXPORT_BORDER_WIDTH * zoom,
                color_or(style.border_or_default(), egui::Color32::BLACK),
            )
        };
        painter.rect_stroke(rect, radius, border, StrokeKind::Inside);

        if node.kind == NodeKind::Input {
            // Input nodes carry no incoming handle; mark the outgoing one.
            let handle = egui::pos2(rect.max.x, rect.center().y);
            painter.circle_filled(handle, 4.0 * zoom, border.color);
        }

        if self.interaction.editing_label.as_deref() == Some(node.id.as_str()) {
            return;
        }

        let text_color = color_or(style.text_color_or_default(), egui::Color32::BLACK);
        let format = egui::TextFormat {
            font_id: egui::FontId::proportional(style.font_size_or_default() * zoom),
            color: text_color,
            italics: style.is_italic(),
            underline: if style.is_underlined() {
                egui::Stroke::new(zoom.max(0.5), text_color)
            } else {
                egui::Stroke::NONE
            },
            ..Default::default()
        };
        let mut job = egui::text::LayoutJob::single_section(node.label.clone(), format);
        job.wrap.max_width = rect.width() - 2.0 * UNDERLINE_INSET * zoom;
        job.halign = egui::Align::Center;
        let galley = painter.layout_job(job);

        let pos = egui::pos2(rect.center().x, rect.center().y - galley.size().y / 2.0);
        if style.is_bold() {
            // No bold face is bundled; overdraw with a small offset.
            painter.galley(pos + egui::vec2(0.6 * zoom, 0.0), galley.clone(), text_color);
        }
        painter.galley(pos, galley, text_color);
    }
}
