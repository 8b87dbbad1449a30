//! The egui editor surface.
//!
//! [`MindMapApp`] renders the store and translates pointer and keyboard input
//! into store operations. It never mutates the graph directly.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main MindMapApp
//! - `canvas` - Pan, zoom, hit testing, dragging, connecting and label editing
//! - `rendering` - Painting the grid, edges and nodes
//! - `file_ops` - JSON import/export and image export for native and wasm

mod canvas;
mod file_ops;
mod rendering;
mod state;

pub use state::{FileOperationResult, MindMapApp, PendingFileOperation, StatusMessage};

use crate::constants;
use crate::export::ImageFormat;
use crate::library::{Library, SaveRequest};
use crate::persistence::MindMapId;
use crate::store::{MindMapStore, NodeUpdate, Selection};
use crate::types::*;
use eframe::egui;

/// Identifier used for eframe storage and the library location.
pub const APP_ID: &str = "mindmap-editor";

const STORAGE_KEY: &str = "app_state";

impl eframe::App for MindMapApp {
    /// Persist preferences and the current document between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.to_json() {
            Ok(json) => storage.set_string(STORAGE_KEY, json),
            Err(err) => log::error!("failed to serialize app state: {err}"),
        }
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });

        self.handle_pending_operations(ctx);
        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.draw_status_bar(ui);
        });

        let viewport_width = ctx.input(|i| i.screen_rect().width());
        let max_width = (viewport_width * 0.5).max(200.0);
        egui::SidePanel::right("properties_panel")
            .resizable(true)
            .default_width(self.properties_panel_width.clamp(200.0, max_width))
            .show(ctx, |ui| {
                self.properties_panel_width = ui.available_width().clamp(200.0, max_width);
                self.draw_properties_panel(ui);
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.draw_canvas(ui);
            });

        self.draw_export_dialog(ctx);
        self.draw_library_window(ctx);
        self.commit_pending_edit(ctx);
    }
}

impl MindMapApp {
    /// Builds the app from eframe storage, falling back to the welcome map.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let restored = cc
            .storage
            .and_then(|storage| storage.get_string(STORAGE_KEY))
            .and_then(|json| match Self::from_json(&json) {
                Ok(app) => Some(app),
                Err(err) => {
                    log::warn!("ignoring unreadable app state: {err}");
                    None
                }
            });
        let mut app = restored.unwrap_or_else(|| {
            let mut app = Self::default();
            app.seed_welcome_map();
            app
        });
        app.attach_library(open_default_library());
        app
    }

    /// Replaces the content with a few introductory nodes.
    ///
    /// The welcome map becomes the undo baseline rather than a series of edits.
    pub fn seed_welcome_map(&mut self) {
        let nodes = [
            (0.0, 0.0, "Welcome to the mind map editor!"),
            (-250.0, -150.0, "Double-click to edit"),
            (250.0, -150.0, "Drag to move"),
            (-250.0, 150.0, "Shift-drag to connect"),
            (250.0, 150.0, "Style & format"),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (x, y, label))| {
            NodeRecord::new(format!("n{}", i + 1), label, Position::new(x, y))
        })
        .collect();
        self.interaction = Default::default();
        self.store = MindMapStore::from_snapshot(MindMapSnapshot {
            nodes,
            ..Default::default()
        });
    }

    /// Starts a local session against `library`.
    pub fn attach_library(&mut self, library: Option<Library>) {
        self.library.library = library;
        self.library.token = None;
        if let Some(library) = self.library.library.as_mut() {
            self.library.token = Some(library.sign_in(self.library.user_id));
        }
    }

    /// Applies any style edit made since the last frame once the pointer is released.
    fn commit_pending_edit(&mut self, ctx: &egui::Context) {
        if self.interaction.uncommitted_edit && !ctx.input(|i| i.pointer.any_down()) {
            self.interaction.uncommitted_edit = false;
            self.store.save_to_history();
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (undo, redo, delete, child, rename, new, open, save, export, escape) =
            ctx.input(|i| {
                let cmd = i.modifiers.command;
                let shift = i.modifiers.shift;
                (
                    cmd && !shift && i.key_pressed(egui::Key::Z),
                    (cmd && shift && i.key_pressed(egui::Key::Z))
                        || (cmd && i.key_pressed(egui::Key::Y)),
                    i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace),
                    i.key_pressed(egui::Key::Tab),
                    i.key_pressed(egui::Key::F2) || i.key_pressed(egui::Key::Enter),
                    cmd && i.key_pressed(egui::Key::N),
                    cmd && i.key_pressed(egui::Key::O),
                    cmd && i.key_pressed(egui::Key::S),
                    cmd && i.key_pressed(egui::Key::E),
                    i.key_pressed(egui::Key::Escape),
                )
            });

        if undo {
            self.perform_undo();
        } else if redo {
            self.perform_redo();
        }
        if delete {
            self.delete_selected();
        }
        if child {
            self.add_child_to_selected();
        }
        if rename {
            if let Some(id) = self.store.selected_node_id().cloned() {
                self.start_label_edit(id);
            }
        }
        if new {
            self.new_document();
        }
        if open {
            self.import_json();
        }
        if save {
            self.library.show_panel = true;
            self.save_to_library(false);
        }
        if export {
            self.export.show_dialog = true;
        }
        if escape {
            self.store.set_selected_node(None);
        }
    }

    pub fn perform_undo(&mut self) {
        self.commit_label_edit();
        if self.store.undo() {
            self.interaction = Default::default();
        }
    }

    pub fn perform_redo(&mut self) {
        self.commit_label_edit();
        if self.store.redo() {
            self.interaction = Default::default();
        }
    }

    /// Adds a node at the toolbar's default spot.
    pub fn add_node(&mut self) {
        self.commit_label_edit();
        self.store.add_node(
            Position::new(constants::TOOLBAR_NODE_X, constants::TOOLBAR_NODE_Y),
            Some(constants::DEFAULT_NODE_LABEL),
        );
    }

    pub fn add_child_to_selected(&mut self) {
        let Some(parent) = self.store.selected_node_id().cloned() else {
            return;
        };
        self.commit_label_edit();
        self.store
            .add_child_node(&parent, Some(constants::DEFAULT_NODE_LABEL));
    }

    /// Deletes the selected node (with its edges) or the selected edge.
    pub fn delete_selected(&mut self) {
        match self.store.selection().clone() {
            Selection::Node(id) => {
                self.cancel_label_edit();
                self.store.delete_node(&id);
            }
            Selection::Edge(id) => {
                self.store.delete_edge(&id);
            }
            Selection::None => {}
        }
    }

    fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect;

        if self.canvas.last_rect.is_none() && self.store.viewport() == Viewport::default() {
            self.fit_view(rect);
        }
        self.canvas.last_rect = Some(rect);

        let background = if self.dark_mode {
            egui::Color32::from_gray(24)
        } else {
            egui::Color32::from_gray(248)
        };
        painter.rect_filled(rect, 0.0, background);

        self.handle_canvas_panning(ui, &response);
        self.handle_canvas_zoom(ui, &response);
        self.handle_pointer(ui, &response);

        self.render_mindmap(&painter, rect);
        self.draw_label_editor(ui);
    }

    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.strong("Mind Map");
            ui.separator();

            if ui.button("New").clicked() {
                self.new_document();
            }
            if ui.button("Import JSON").clicked() {
                self.import_json();
            }
            if ui.button("Export JSON").clicked() {
                self.export_json();
            }
            if ui.button("Export Image…").clicked() {
                self.export.show_dialog = true;
            }
            if ui.button("Library…").clicked() {
                self.library.show_panel = true;
                self.refresh_library();
            }

            ui.separator();

            ui.add_enabled_ui(self.store.can_undo(), |ui| {
                if ui.button("⟲ Undo").clicked() {
                    self.perform_undo();
                }
            });
            ui.add_enabled_ui(self.store.can_redo(), |ui| {
                if ui.button("⟳ Redo").clicked() {
                    self.perform_redo();
                }
            });

            ui.separator();

            if ui.button("Add Node").clicked() {
                self.add_node();
            }
            let has_node = self.store.selected_node_id().is_some();
            ui.add_enabled_ui(has_node, |ui| {
                if ui.button("Add Child").clicked() {
                    self.add_child_to_selected();
                }
            });
            ui.add_enabled_ui(*self.store.selection() != Selection::None, |ui| {
                if ui.button("Delete").clicked() {
                    self.delete_selected();
                }
            });

            ui.separator();

            if ui.button("Fit").clicked() {
                if let Some(rect) = self.canvas.last_rect {
                    self.fit_view(rect);
                }
            }
            ui.checkbox(&mut self.canvas.show_grid, "Grid");
            ui.checkbox(&mut self.canvas.snap_to_grid, "Snap");
            ui.checkbox(&mut self.dark_mode, "Dark Mode");

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("Zoom: {:.0}%", self.store.viewport().zoom * 100.0));
            });
        });
    }

    fn draw_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(format!(
                "{} nodes, {} edges",
                self.store.nodes().len(),
                self.store.edges().len()
            ));
            ui.separator();
            match &self.file.status {
                Some(StatusMessage::Info(msg)) => {
                    ui.label(msg);
                }
                Some(StatusMessage::Error(msg)) => {
                    ui.colored_label(ui.visuals().error_fg_color, msg);
                }
                None => {}
            }
        });
    }

    fn draw_properties_panel(&mut self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                ui.heading("Properties");
                ui.separator();
                match self.store.selection().clone() {
                    Selection::Node(id) => self.draw_node_properties(ui, &id),
                    Selection::Edge(id) => self.draw_edge_properties(ui, &id),
                    Selection::None => draw_no_selection_info(ui),
                }
            });
    }

    fn draw_node_properties(&mut self, ui: &mut egui::Ui, id: &str) {
        let Some(node) = self.store.node(id).cloned() else {
            ui.label("Node not found");
            return;
        };
        let style = &node.style;

        ui.label("Label:");
        if ui.button(&node.label).clicked() {
            self.start_label_edit(node.id.clone());
        }

        let mut kind = node.kind;
        egui::ComboBox::from_label("Type")
            .selected_text(match kind {
                NodeKind::Default => "Default",
                NodeKind::Input => "Input",
            })
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut kind, NodeKind::Default, "Default");
                ui.selectable_value(&mut kind, NodeKind::Input, "Input");
            });
        if kind != node.kind {
            self.apply_node_update(
                id,
                NodeUpdate {
                    kind: Some(kind),
                    ..Default::default()
                },
            );
        }

        ui.separator();
        ui.label("Style");

        let mut patch = NodeStyle::default();
        egui::Grid::new("node_style_grid")
            .num_columns(2)
            .show(ui, |ui| {
                ui.label("Background");
                patch.background_color = color_field(ui, style.background_or_default());
                ui.end_row();

                ui.label("Border");
                patch.border_color = color_field(ui, style.border_or_default());
                ui.end_row();

                ui.label("Text");
                patch.color = color_field(ui, style.text_color_or_default());
                ui.end_row();

                ui.label("Font size");
                let mut size = style.font_size_or_default();
                if ui
                    .add(egui::DragValue::new(&mut size).range(8.0..=72.0).speed(0.5))
                    .changed()
                {
                    patch.font_size = Some(size);
                }
                ui.end_row();
            });

        ui.horizontal(|ui| {
            let mut bold = style.is_bold();
            if ui.toggle_value(&mut bold, egui::RichText::new("B").strong()).changed() {
                patch.font_weight = Some(if bold { FontWeight::Bold } else { FontWeight::Normal });
            }
            let mut italic = style.is_italic();
            if ui.toggle_value(&mut italic, egui::RichText::new("I").italics()).changed() {
                patch.font_style = Some(if italic { FontStyle::Italic } else { FontStyle::Normal });
            }
            let mut underline = style.is_underlined();
            if ui
                .toggle_value(&mut underline, egui::RichText::new("U").underline())
                .changed()
            {
                patch.text_decoration = Some(if underline {
                    TextDecoration::Underline
                } else {
                    TextDecoration::None
                });
            }
        });

        if !patch.is_empty() {
            self.apply_node_update(id, NodeUpdate::style(patch));
        }

        ui.separator();
        ui.label(format!(
            "Position: ({:.0}, {:.0})",
            node.position.x, node.position.y
        ));
        ui.horizontal(|ui| {
            if ui.button("Add Child").clicked() {
                self.add_child_to_selected();
            }
            if ui.button("Delete").clicked() {
                self.delete_selected();
            }
        });
    }

    fn apply_node_update(&mut self, id: &str, update: NodeUpdate) {
        if self.store.update_node(id, update) {
            self.interaction.uncommitted_edit = true;
        }
    }

    fn draw_edge_properties(&mut self, ui: &mut egui::Ui, id: &str) {
        let Some(edge) = self.store.edge(id).cloned() else {
            ui.label("Edge not found");
            return;
        };
        let label_of = |node_id: &str| {
            self.store
                .node(node_id)
                .map(|n| n.label.clone())
                .unwrap_or_else(|| node_id.to_string())
        };
        ui.label(format!("From: {}", label_of(&edge.source)));
        ui.label(format!("To: {}", label_of(&edge.target)));
        ui.separator();

        let mut patch = EdgeStyle::default();
        egui::Grid::new("edge_style_grid")
            .num_columns(2)
            .show(ui, |ui| {
                ui.label("Stroke");
                patch.stroke = color_field(ui, edge.style.stroke_or_default());
                ui.end_row();

                ui.label("Width");
                let mut width = edge.style.stroke_width_or_default();
                if ui
                    .add(egui::DragValue::new(&mut width).range(1.0..=10.0).speed(0.1))
                    .changed()
                {
                    patch.stroke_width = Some(width);
                }
                ui.end_row();
            });
        if !patch.is_empty() && self.store.update_edge(id, &patch) {
            self.interaction.uncommitted_edit = true;
        }

        ui.separator();
        if ui.button("Delete").clicked() {
            self.delete_selected();
        }
    }

    fn draw_export_dialog(&mut self, ctx: &egui::Context) {
        let mut open = self.export.show_dialog;
        let mut export_now = false;
        egui::Window::new("Export Image")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                let options = &mut self.export.options;
                egui::Grid::new("export_options_grid")
                    .num_columns(2)
                    .show(ui, |ui| {
                        ui.label("Width");
                        ui.add(egui::DragValue::new(&mut options.width).range(1..=8192));
                        ui.end_row();

                        ui.label("Height");
                        ui.add(egui::DragValue::new(&mut options.height).range(1..=8192));
                        ui.end_row();

                        ui.label("Background");
                        if let Some(hex) = color_field(ui, &options.background) {
                            options.background = hex;
                        }
                        ui.end_row();

                        ui.label("Format");
                        egui::ComboBox::from_id_salt("export_format")
                            .selected_text(options.format.label())
                            .show_ui(ui, |ui| {
                                for format in [ImageFormat::Png, ImageFormat::Jpeg] {
                                    ui.selectable_value(&mut options.format, format, format.label());
                                }
                            });
                        ui.end_row();

                        if options.format == ImageFormat::Jpeg {
                            ui.label("Quality");
                            ui.add(egui::Slider::new(&mut options.jpeg_quality, 1..=100));
                            ui.end_row();
                        }

                        ui.label("File name");
                        ui.text_edit_singleline(&mut options.file_name);
                        ui.end_row();
                    });
                ui.separator();
                if ui.button("Export").clicked() {
                    export_now = true;
                }
            });
        self.export.show_dialog = open && !export_now;
        if export_now {
            self.export_image();
        }
    }

    /// Reloads the entry list from the library.
    pub fn refresh_library(&mut self) {
        let (Some(library), Some(token)) = (&self.library.library, &self.library.token) else {
            return;
        };
        match library.list(token) {
            Ok(entries) => self.library.entries = entries,
            Err(err) => self.set_status(StatusMessage::Error(format!("Library: {err}"))),
        }
    }

    /// Saves the editor content under the title typed in the library panel.
    pub fn save_to_library(&mut self, as_new: bool) {
        if self.library.library.is_none() || self.library.token.is_none() {
            self.set_status(StatusMessage::Error("Library is not available".into()));
            return;
        }
        let (Some(library), Some(token)) = (&mut self.library.library, &self.library.token) else {
            return;
        };
        let description = self.library.description.trim();
        let request = SaveRequest {
            id: if as_new { None } else { self.library.current },
            title: self.library.title.clone(),
            description: (!description.is_empty()).then(|| description.to_string()),
        };
        match library.save_from(token, &self.store, request) {
            Ok(map) => {
                self.library.current = Some(map.id);
                self.library.title = map.title.clone();
                self.set_status(StatusMessage::Info(format!("Saved \"{}\"", map.title)));
                self.refresh_library();
            }
            Err(err) => self.set_status(StatusMessage::Error(format!("Save failed: {err}"))),
        }
    }

    pub fn open_from_library(&mut self, id: MindMapId) {
        let (Some(library), Some(token)) = (&self.library.library, &self.library.token) else {
            return;
        };
        match library.open_into(token, id, &mut self.store) {
            Ok(map) => {
                self.interaction = Default::default();
                self.library.current = Some(map.id);
                self.library.title = map.title.clone();
                self.library.description = map.description.clone().unwrap_or_default();
                self.set_status(StatusMessage::Info(format!("Opened \"{}\"", map.title)));
            }
            Err(err) => self.set_status(StatusMessage::Error(format!("Open failed: {err}"))),
        }
    }

    pub fn delete_from_library(&mut self, id: MindMapId) {
        let (Some(library), Some(token)) = (&mut self.library.library, &self.library.token) else {
            return;
        };
        match library.delete(token, id) {
            Ok(()) => {
                if self.library.current == Some(id) {
                    self.library.current = None;
                }
                self.refresh_library();
            }
            Err(err) => self.set_status(StatusMessage::Error(format!("Delete failed: {err}"))),
        }
    }

    fn draw_library_window(&mut self, ctx: &egui::Context) {
        let mut open = self.library.show_panel;
        let mut action: Option<LibraryAction> = None;
        egui::Window::new("Library")
            .open(&mut open)
            .default_width(360.0)
            .show(ctx, |ui| {
                if self.library.library.is_none() {
                    ui.label("No library storage is available on this platform.");
                    return;
                }
                egui::Grid::new("library_save_grid")
                    .num_columns(2)
                    .show(ui, |ui| {
                        ui.label("Title");
                        ui.text_edit_singleline(&mut self.library.title);
                        ui.end_row();
                        ui.label("Description");
                        ui.text_edit_singleline(&mut self.library.description);
                        ui.end_row();
                    });
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        action = Some(LibraryAction::Save { as_new: false });
                    }
                    ui.add_enabled_ui(self.library.current.is_some(), |ui| {
                        if ui.button("Save as New").clicked() {
                            action = Some(LibraryAction::Save { as_new: true });
                        }
                    });
                    if ui.button("Refresh").clicked() {
                        action = Some(LibraryAction::Refresh);
                    }
                });
                ui.separator();

                if self.library.entries.is_empty() {
                    ui.label("No saved mind maps yet.");
                }
                egui::ScrollArea::vertical().max_height(320.0).show(ui, |ui| {
                    for entry in &self.library.entries {
                        ui.horizontal(|ui| {
                            let current = self.library.current == Some(entry.id);
                            ui.label(if current {
                                egui::RichText::new(&entry.title).strong()
                            } else {
                                egui::RichText::new(&entry.title)
                            });
                            ui.weak(entry.updated_at.format("%Y-%m-%d %H:%M").to_string());
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    if ui.small_button("Delete").clicked() {
                                        action = Some(LibraryAction::Delete(entry.id));
                                    }
                                    if ui.small_button("Open").clicked() {
                                        action = Some(LibraryAction::Open(entry.id));
                                    }
                                },
                            );
                        });
                        if let Some(description) = &entry.description {
                            ui.weak(description);
                        }
                    }
                });
            });
        self.library.show_panel = open;

        match action {
            Some(LibraryAction::Save { as_new }) => self.save_to_library(as_new),
            Some(LibraryAction::Open(id)) => self.open_from_library(id),
            Some(LibraryAction::Delete(id)) => self.delete_from_library(id),
            Some(LibraryAction::Refresh) => self.refresh_library(),
            None => {}
        }
    }
}

enum LibraryAction {
    Save { as_new: bool },
    Open(MindMapId),
    Delete(MindMapId),
    Refresh,
}

fn draw_no_selection_info(ui: &mut egui::Ui) {
    ui.label("Nothing selected");
    ui.separator();
    ui.label("Click a node or edge to select it");
    ui.label("Double-click empty space to add a node");
    ui.label("Double-click a node to edit its label");
    ui.label("Shift-drag from a node to connect");
    ui.label("Middle-drag or Ctrl-drag to pan, scroll to zoom");
}

/// Color button for a hex color. Returns the new hex value when changed.
fn color_field(ui: &mut egui::Ui, hex: &str) -> Option<String> {
    let mut color = crate::export::raster::parse_color(hex).unwrap_or(egui::Color32::BLACK);
    if ui.color_edit_button_srgba(&mut color).changed() {
        let [r, g, b, _] = color.to_srgba_unmultiplied();
        Some(format!("#{r:02x}{g:02x}{b:02x}"))
    } else {
        None
    }
}

/// Opens the on-disk library next to eframe's own storage.
#[cfg(not(target_arch = "wasm32"))]
fn open_default_library() -> Option<Library> {
    let dir = eframe::storage_dir(APP_ID)?;
    match crate::persistence::JsonFileRepository::open(dir.join("library.json")) {
        Ok(repository) => Some(Library::new(Box::new(repository))),
        Err(err) => {
            log::error!("failed to open mind map library: {err}");
            None
        }
    }
}

/// The browser build keeps its library for the lifetime of the page.
#[cfg(target_arch = "wasm32")]
fn open_default_library() -> Option<Library> {
    Some(Library::new(Box::new(
        crate::persistence::InMemoryRepository::new(),
    )))
}
