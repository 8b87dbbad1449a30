//! Export of mind maps to JSON and raster images.
//!
//! JSON export writes the snapshot verbatim. Image export re-renders the
//! snapshot from scratch (see [`layout`] and [`raster`]) so the result never
//! depends on the live canvas' pan or zoom.

pub mod layout;
pub mod raster;

pub use layout::{ExportLayout, FitTransform};
pub use raster::ExportRenderer;

use crate::constants;
use crate::types::MindMapSnapshot;
use serde::{Deserialize, Serialize};

/// Errors raised while exporting or importing.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to serialize or parse mind map JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid export size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("invalid color: {0}")]
    InvalidColor(String),
    #[error("failed to build the export scene: {0}")]
    Scene(String),
    #[error("failed to encode PNG: {0}")]
    PngEncode(String),
    #[error("JPEG export requires an opaque background color")]
    JpegOpaqueBackgroundRequired,
    #[error("failed to encode JPEG: {0}")]
    JpegEncode(#[from] image::ImageError),
}

/// Result alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Encoded image formats supported by image export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

impl ImageFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }

    /// MIME type of the encoded bytes.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    /// Human-readable name for dialogs.
    pub fn label(self) -> &'static str {
        match self {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPEG",
        }
    }
}

/// Options controlling image export. Persisted with the editor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Target image width in pixels
    pub width: u32,
    /// Target image height in pixels
    pub height: u32,
    /// Background fill as a hex color
    pub background: String,
    pub format: ImageFormat,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
    /// Base name of downloaded files, without extension
    pub file_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            width: constants::DEFAULT_EXPORT_WIDTH,
            height: constants::DEFAULT_EXPORT_HEIGHT,
            background: constants::DEFAULT_BACKGROUND_COLOR.to_string(),
            format: ImageFormat::Png,
            jpeg_quality: constants::DEFAULT_JPEG_QUALITY,
            file_name: "mindmap".to_string(),
        }
    }
}

impl ExportOptions {
    /// File name for a JSON export.
    pub fn json_file_name(&self) -> String {
        format!("{}.json", self.file_name)
    }

    /// File name for an image export in the configured format.
    pub fn image_file_name(&self) -> String {
        format!("{}.{}", self.file_name, self.format.extension())
    }
}

/// Serializes a snapshot as pretty JSON for download.
pub fn export_json(snapshot: &MindMapSnapshot) -> Result<String> {
    Ok(snapshot.to_json()?)
}

/// Parses a snapshot previously written by [`export_json`].
pub fn import_json(json: &str) -> Result<MindMapSnapshot> {
    Ok(MindMapSnapshot::from_json(json)?)
}
