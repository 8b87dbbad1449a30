//! JSON import/export and image export through native dialogs or browser downloads.

use super::state::{FileOperationResult, MindMapApp, PendingFileOperation, StatusMessage};
use crate::export::{self, ExportRenderer};
use crate::types::MindMapSnapshot;
use eframe::egui;

impl MindMapApp {
    /// Drains finished async operations and starts any queued one.
    pub fn handle_pending_operations(&mut self, ctx: &egui::Context) {
        let results: Vec<FileOperationResult> = self
            .file
            .receiver
            .as_ref()
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default();
        for result in results {
            self.apply_file_result(result);
        }

        let Some(operation) = self.file.pending.take() else {
            return;
        };
        match operation {
            PendingFileOperation::ExportJson => self.start_json_export(ctx),
            PendingFileOperation::ImportJson => self.start_json_import(ctx),
            PendingFileOperation::ExportImage => self.start_image_export(ctx),
        }
    }

    /// Applies the outcome of a finished file operation.
    pub fn apply_file_result(&mut self, result: FileOperationResult) {
        match result {
            FileOperationResult::Saved(name) => {
                self.set_status(StatusMessage::Info(format!("Saved {name}")));
            }
            FileOperationResult::Loaded(name, content) => match export::import_json(&content) {
                Ok(snapshot) => {
                    self.load_document(snapshot);
                    self.set_status(StatusMessage::Info(format!("Imported {name}")));
                }
                Err(err) => self.set_status(StatusMessage::Error(format!(
                    "Could not import {name}: {err}"
                ))),
            },
            FileOperationResult::Failed(err) => self.set_status(StatusMessage::Error(err)),
        }
    }

    /// Replaces the editor content, dropping any in-progress interaction.
    pub fn load_document(&mut self, snapshot: MindMapSnapshot) {
        self.interaction = Default::default();
        self.store.load_snapshot(snapshot);
        self.library.current = None;
    }

    /// Clears the canvas. The empty graph is recorded so the reset is undoable.
    pub fn new_document(&mut self) {
        self.load_document(MindMapSnapshot::default());
        if let Some(rect) = self.canvas.last_rect {
            self.fit_view(rect);
        }
        self.library.title.clear();
        self.library.description.clear();
    }

    pub fn import_json(&mut self) {
        self.file.pending = Some(PendingFileOperation::ImportJson);
    }

    pub fn export_json(&mut self) {
        self.file.pending = Some(PendingFileOperation::ExportJson);
    }

    pub fn export_image(&mut self) {
        self.file.pending = Some(PendingFileOperation::ExportImage);
    }

    fn renderer(&mut self) -> ExportRenderer {
        self.export
            .renderer
            .get_or_insert_with(ExportRenderer::new)
            .clone()
    }

    fn start_json_export(&mut self, ctx: &egui::Context) {
        let json = match export::export_json(&self.store.export_snapshot()) {
            Ok(json) => json,
            Err(err) => {
                self.set_status(StatusMessage::Error(err.to_string()));
                return;
            }
        };
        let name = self.export.options.json_file_name();
        self.write_bytes(ctx, name, "JSON", "json", "application/json", json.into_bytes());
    }

    fn start_image_export(&mut self, ctx: &egui::Context) {
        let snapshot = self.store.export_snapshot();
        let options = self.export.options.clone();
        let renderer = self.renderer();
        let bytes = match renderer.export_image(&snapshot, &options) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.set_status(StatusMessage::Error(format!("Image export failed: {err}")));
                return;
            }
        };
        log::info!(
            "rendered {}x{} {} ({} bytes)",
            options.width,
            options.height,
            options.format.label(),
            bytes.len()
        );
        self.write_bytes(
            ctx,
            options.image_file_name(),
            options.format.label(),
            options.format.extension(),
            options.format.mime_type(),
            bytes,
        );
    }

    /// Hands `bytes` to a save dialog (native) or a browser download (wasm).
    /// The dialog filter is native-only and the MIME type wasm-only.
    #[allow(unused_variables)]
    fn write_bytes(
        &mut self,
        ctx: &egui::Context,
        file_name: String,
        filter_name: &str,
        extension: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) {
        let sender = self.file.sender.clone();
        let ctx = ctx.clone();

        #[cfg(target_arch = "wasm32")]
        {
            let result = match Self::trigger_download(&file_name, mime, &bytes) {
                Ok(()) => FileOperationResult::Saved(file_name),
                Err(e) => FileOperationResult::Failed(e),
            };
            if let Some(tx) = sender {
                let _ = tx.send(result);
            }
            ctx.request_repaint();
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let filter_name = filter_name.to_string();
            let extension = extension.to_string();
            tokio::spawn(async move {
                let Some(handle) = rfd::AsyncFileDialog::new()
                    .add_filter(filter_name.as_str(), &[extension.as_str()])
                    .set_file_name(file_name.as_str())
                    .save_file()
                    .await
                else {
                    return;
                };
                let path = handle.path().to_path_buf();
                let result = match std::fs::write(&path, bytes) {
                    Ok(()) => FileOperationResult::Saved(path.display().to_string()),
                    Err(e) => FileOperationResult::Failed(format!(
                        "Failed to write {}: {e}",
                        path.display()
                    )),
                };
                if let Some(tx) = sender {
                    let _ = tx.send(result);
                }
                ctx.request_repaint();
            });
        }
    }

    fn start_json_import(&mut self, ctx: &egui::Context) {
        let sender = self.file.sender.clone();
        let ctx = ctx.clone();

        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(async move {
                let Some(file) = Self::show_open_file_picker().await else {
                    log::debug!("open dialog cancelled");
                    return;
                };
                let name = file.name();
                let result = match Self::read_file(file).await {
                    Ok(content) => FileOperationResult::Loaded(name, content),
                    Err(e) => FileOperationResult::Failed(e),
                };
                if let Some(tx) = sender {
                    let _ = tx.send(result);
                }
                ctx.request_repaint();
            });
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            tokio::spawn(async move {
                let Some(handle) = rfd::AsyncFileDialog::new()
                    .add_filter("JSON", &["json"])
                    .pick_file()
                    .await
                else {
                    return;
                };
                let path = handle.path().to_path_buf();
                let result = match std::fs::read_to_string(&path) {
                    Ok(json) => FileOperationResult::Loaded(path.display().to_string(), json),
                    Err(e) => FileOperationResult::Failed(format!(
                        "Failed to read {}: {e}",
                        path.display()
                    )),
                };
                if let Some(tx) = sender {
                    let _ = tx.send(result);
                }
                ctx.request_repaint();
            });
        }
    }

    /// Downloads `bytes` through a temporary anchor and blob URL.
    #[cfg(target_arch = "wasm32")]
    fn trigger_download(filename: &str, mime: &str, bytes: &[u8]) -> Result<(), String> {
        use wasm_bindgen::JsCast;

        let window = web_sys::window().ok_or("No window found")?;
        let document = window.document().ok_or("No document found")?;

        let parts = js_sys::Array::new();
        parts.push(&js_sys::Uint8Array::from(bytes));
        let options = web_sys::BlobPropertyBag::new();
        options.set_type(mime);
        let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)
            .map_err(|_| "Failed to create blob")?;
        let url = web_sys::Url::create_object_url_with_blob(&blob)
            .map_err(|_| "Failed to create object URL")?;

        let anchor = document
            .create_element("a")
            .map_err(|_| "Failed to create anchor element")?
            .dyn_into::<web_sys::HtmlAnchorElement>()
            .map_err(|_| "Failed to cast to anchor element")?;
        anchor.set_href(&url);
        anchor.set_download(filename);
        anchor.style().set_property("display", "none").ok();

        let body = document.body().ok_or("No body found")?;
        body.append_child(&anchor)
            .map_err(|_| "Failed to append anchor")?;
        anchor.click();
        body.remove_child(&anchor)
            .map_err(|_| "Failed to remove anchor")?;

        web_sys::Url::revoke_object_url(&url).map_err(|_| "Failed to revoke object URL")?;
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    async fn show_open_file_picker() -> Option<web_sys::File> {
        use wasm_bindgen::closure::Closure;
        use wasm_bindgen::JsCast;

        let document = web_sys::window()?.document()?;
        let input = document
            .create_element("input")
            .ok()?
            .dyn_into::<web_sys::HtmlInputElement>()
            .ok()?;
        input.set_type("file");
        input.set_accept(".json,application/json");
        input.style().set_property("display", "none").ok()?;

        let (sender, receiver) = futures::channel::oneshot::channel::<Option<web_sys::File>>();
        let sender = std::rc::Rc::new(std::cell::RefCell::new(Some(sender)));

        let onchange = Closure::wrap(Box::new(move |event: web_sys::Event| {
            let file = event
                .target()
                .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
                .and_then(|input| input.files())
                .and_then(|files| files.get(0));
            if let Some(sender) = sender.borrow_mut().take() {
                let _ = sender.send(file);
            }
        }) as Box<dyn FnMut(_)>);
        input.set_onchange(Some(onchange.as_ref().unchecked_ref()));
        onchange.forget();

        document.body()?.append_child(&input).ok()?;
        input.click();
        let file = receiver.await.ok()??;
        document.body()?.remove_child(&input).ok()?;
        Some(file)
    }

    #[cfg(target_arch = "wasm32")]
    async fn read_file(file: web_sys::File) -> Result<String, String> {
        let text = wasm_bindgen_futures::JsFuture::from(file.text())
            .await
            .map_err(|e| format!("Failed to read file: {e:?}"))?;
        text.as_string()
            .ok_or_else(|| "File content is not text".to_string())
    }
}
