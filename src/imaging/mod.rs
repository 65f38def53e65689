//! Backends and the geometry they share.
//!
//! | Concern | Implementation |
//! |---|---|
//! | **Transform URLs** | [`UrlTransformBackend`] (query-string image CDN) |
//! | **Temp raster** | [`RustPlaceholderBackend`]: crop + `resize_exact` → JPEG q75 |
//! | **Placeholder** | 16px JPEG q50 → base64 |
//! | **Palette / silhouette** | histogram quantization / luminance trace |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop and down-sample math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`TransformBackend`] + [`PlaceholderBackend`] traits
//! - **Concrete backends**: [`url_backend`] and [`rust_backend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;
pub mod url_backend;

pub use backend::{BackendError, PlaceholderBackend, TempRaster, TransformBackend};
pub use calculations::{CropRect, calculate_crop_rect, calculate_downsample_dimensions};
pub use params::{AspectRatio, CropPosition, Quality};
pub use rust_backend::{RustPlaceholderBackend, identify, identify_in};
pub use url_backend::UrlTransformBackend;
