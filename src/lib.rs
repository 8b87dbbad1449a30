//! # Mind Map Editor
//!
//! An editor for mind maps: labelled nodes on an infinite canvas joined by
//! directed edges.
//!
//! ## Features
//! - Add, move, restyle and delete nodes, connect them with edges
//! - Linear undo/redo over a capped snapshot history
//! - Pan and zoom, in-place label editing
//! - JSON import/export and PNG/JPEG export fitted to a fixed canvas
//! - A per-user library of saved maps
//!
//! The graph lives in [`store::MindMapStore`]; the egui surface only talks to
//! the store. [`export::ExportRenderer`] rasterizes a snapshot without the UI.

#![deny(unsafe_code)]

pub mod auth;
pub mod constants;
pub mod export;
pub mod ids;
pub mod library;
pub mod persistence;
pub mod store;
pub mod types;
mod ui;

// Re-export the types most callers need
pub use export::{ExportOptions, ExportRenderer, ImageFormat};
pub use store::{MindMapStore, Selection};
pub use types::*;
pub use ui::MindMapApp;

/// Runs the editor in a native window.
///
/// # Example
///
/// ```no_run
/// fn main() -> Result<(), eframe::Error> {
///     mindmap_editor::run_app()
/// }
/// ```
#[cfg(not(target_arch = "wasm32"))]
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Mind Map Editor")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Mind Map Editor",
        options,
        Box::new(|cc| Ok(Box::new(MindMapApp::new(cc)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_empty() {
        let store = MindMapStore::new();
        assert!(store.nodes().is_empty());
        assert!(store.edges().is_empty());
        assert_eq!(*store.selection(), Selection::None);
        assert!(!store.can_undo());
    }

    #[test]
    fn test_default_export_options() {
        let options = ExportOptions::default();
        assert_eq!((options.width, options.height), (1920, 1080));
        assert_eq!(options.format, ImageFormat::Png);
    }
}
