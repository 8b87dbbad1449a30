#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    // Set up logging for development
    env_logger::init();

    // File dialogs are spawned on the tokio runtime
    mindmap_editor::run_app()
}

#[cfg(target_arch = "wasm32")]
fn main() {}
