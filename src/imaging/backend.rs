//! Backend traits and shared types.
//!
//! A build talks to two external collaborators:
//!
//! - [`TransformBackend`] turns a [`TransformRequest`] into a URL (and a WebP
//!   sibling URL). It never touches pixels; the service behind the URL does.
//! - [`PlaceholderBackend`] produces the low-cost stand-ins (base64 raster,
//!   colour palette, silhouette) from a temporary down-sampled raster.
//!
//! The shipped implementations are
//! [`UrlTransformBackend`](super::url_backend::UrlTransformBackend) and
//! [`RustPlaceholderBackend`](super::rust_backend::RustPlaceholderBackend).
//! Both are injected into an [`Optimizer`](crate::optimizer::Optimizer), so
//! tests swap in the recording mocks below.

use super::params::{AspectRatio, CropPosition};
use crate::types::SourceImage;
use crate::variants::TransformRequest;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Temporary down-sampled raster shared by the placeholder steps.
///
/// The file is deleted when this value is dropped, on every exit path.
#[derive(Debug)]
pub struct TempRaster {
    path: TempPath,
}

impl TempRaster {
    pub fn new(path: TempPath) -> Self {
        Self { path }
    }

    /// Take ownership of an existing file; it is deleted on drop.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: TempPath::from_path(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Generates transform URLs for a source image.
pub trait TransformBackend: Sync {
    /// URL for the transformed image, or `None` when the request cannot be
    /// fulfilled. An empty string is treated the same as `None`.
    fn transform_url(&self, source: &SourceImage, request: &TransformRequest) -> Option<String>;

    /// WebP variant of a URL previously returned by [`transform_url`](Self::transform_url).
    fn webp_url(&self, url: &str) -> Option<String>;

    /// Whether requests should ask for progressive/interlaced output.
    fn supports_interlace(&self) -> bool {
        true
    }
}

/// Generates placeholder representations for a source image.
pub trait PlaceholderBackend: Sync {
    /// Crop `source` to `aspect` at `position` and down-sample it into a
    /// temporary raster.
    fn create_temp_placeholder(
        &self,
        source: &SourceImage,
        aspect: AspectRatio,
        position: CropPosition,
    ) -> Result<TempRaster, BackendError>;

    /// Base64-encoded tiny JPEG.
    fn placeholder_image(
        &self,
        temp: &TempRaster,
        aspect: AspectRatio,
        position: CropPosition,
    ) -> Result<String, BackendError>;

    /// Colours ordered by dominance, as CSS hex strings.
    fn color_palette(&self, temp: &TempRaster) -> Result<Vec<String>, BackendError>;

    /// Silhouette SVG, already encoded for use in a data URI.
    fn placeholder_svg(&self, temp: &TempRaster) -> Result<String, BackendError>;
}
