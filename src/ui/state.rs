//! Application state for the editor surface.
//!
//! The graph itself lives in [`MindMapStore`]; the structs here only track
//! transient interaction state, persisted preferences and async plumbing.

use crate::auth::{SessionToken, UserId};
use crate::export::{ExportOptions, ExportRenderer};
use crate::library::Library;
use crate::persistence::{MindMap, MindMapId};
use crate::store::MindMapStore;
use crate::types::*;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Canvas display preferences. Pan and zoom are kept in the store's viewport.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasState {
    pub show_grid: bool,
    /// Snap dragged nodes to the grid
    pub snap_to_grid: bool,
    /// Screen rect of the canvas in the last frame
    #[serde(skip)]
    pub last_rect: Option<egui::Rect>,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            show_grid: true,
            snap_to_grid: true,
            last_rect: None,
        }
    }
}

/// A node drag in progress.
#[derive(Debug, Clone)]
pub struct NodeDrag {
    pub node_id: NodeId,
    /// Offset from the pointer to the node's top-left corner, in world units
    pub grab_offset: egui::Vec2,
    pub moved: bool,
}

/// Pointer and keyboard interaction state. Never persisted.
#[derive(Default)]
pub struct InteractionState {
    pub drag: Option<NodeDrag>,
    pub is_panning: bool,
    pub last_pan_pos: Option<egui::Pos2>,
    /// Node pressed with Shift; becomes a connection once dragged past the threshold
    pub pending_connection_from: Option<NodeId>,
    pub pending_connection_start: Option<egui::Pos2>,
    pub drawing_connection_from: Option<NodeId>,
    pub connection_draw_pos: Option<egui::Pos2>,
    /// Node whose label is edited in place on the canvas
    pub editing_label: Option<NodeId>,
    pub label_buffer: String,
    pub focus_requested: bool,
    /// Style or label edits applied to the store but not yet recorded in history
    pub uncommitted_edit: bool,
}

/// Status line message.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusMessage {
    Info(String),
    Error(String),
}

/// File operation queued by the toolbar or a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingFileOperation {
    ImportJson,
    ExportJson,
    ExportImage,
}

/// Messages sent from async file operations back to the app.
#[derive(Debug)]
pub enum FileOperationResult {
    /// A file was written; carries a display name
    Saved(String),
    /// A JSON document was read; carries name and content
    Loaded(String, String),
    Failed(String),
}

/// Async file dialog plumbing.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct FileState {
    #[serde(skip)]
    pub pending: Option<PendingFileOperation>,
    #[serde(skip)]
    pub sender: Option<Sender<FileOperationResult>>,
    #[serde(skip)]
    pub receiver: Option<Receiver<FileOperationResult>>,
    #[serde(skip)]
    pub status: Option<StatusMessage>,
}

impl Default for FileState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            pending: None,
            sender: Some(sender),
            receiver: Some(receiver),
            status: None,
        }
    }
}

/// Image export preferences and the export dialog.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct ExportState {
    pub options: ExportOptions,
    #[serde(skip)]
    pub show_dialog: bool,
    /// Created on first image export
    #[serde(skip)]
    pub renderer: Option<ExportRenderer>,
}

impl Default for ExportState {
    fn default() -> Self {
        Self {
            options: ExportOptions::default(),
            show_dialog: false,
            renderer: None,
        }
    }
}

/// Saved-map library panel.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryState {
    /// Owner of maps saved from this installation
    pub user_id: UserId,
    #[serde(skip)]
    pub library: Option<Library>,
    #[serde(skip)]
    pub token: Option<SessionToken>,
    #[serde(skip)]
    pub show_panel: bool,
    /// Map the editor content was opened from or last saved to
    #[serde(skip)]
    pub current: Option<MindMapId>,
    #[serde(skip)]
    pub title: String,
    #[serde(skip)]
    pub description: String,
    #[serde(skip)]
    pub entries: Vec<MindMap>,
}

impl Default for LibraryState {
    fn default() -> Self {
        Self {
            user_id: uuid::Uuid::new_v4(),
            library: None,
            token: None,
            show_panel: false,
            current: None,
            title: String::new(),
            description: String::new(),
            entries: Vec::new(),
        }
    }
}

/// The editor application.
///
/// Implements `eframe::App`. Only preferences and the last document are
/// persisted between runs; everything else is rebuilt on start.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct MindMapApp {
    /// Live graph state
    #[serde(skip)]
    pub store: MindMapStore,
    /// Copy of the graph written on save and read back on start
    pub document: MindMapSnapshot,
    pub canvas: CanvasState,
    #[serde(skip)]
    pub interaction: InteractionState,
    pub file: FileState,
    pub export: ExportState,
    pub library: LibraryState,
    pub dark_mode: bool,
    /// Remembered width of the properties panel across sessions
    pub properties_panel_width: f32,
}

impl Default for MindMapApp {
    fn default() -> Self {
        Self {
            store: MindMapStore::new(),
            document: MindMapSnapshot::default(),
            canvas: CanvasState::default(),
            interaction: InteractionState::default(),
            file: FileState::default(),
            export: ExportState::default(),
            library: LibraryState::default(),
            dark_mode: false,
            properties_panel_width: 280.0,
        }
    }
}

impl MindMapApp {
    /// Serializes preferences and the current document.
    pub fn to_json(&mut self) -> Result<String, serde_json::Error> {
        self.document = self.store.export_snapshot();
        serde_json::to_string(self)
    }

    /// Restores an app from [`MindMapApp::to_json`] output.
    ///
    /// The stored document becomes the store's undo baseline.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut app: Self = serde_json::from_str(json)?;
        app.store = MindMapStore::from_snapshot(std::mem::take(&mut app.document));
        Ok(app)
    }

    pub fn set_status(&mut self, status: StatusMessage) {
        match &status {
            StatusMessage::Info(msg) => log::info!("{msg}"),
            StatusMessage::Error(msg) => log::error!("{msg}"),
        }
        self.file.status = Some(status);
    }
}
