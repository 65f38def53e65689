//! Placeholder generation for one representative variant.
//!
//! Every placeholder is derived from one temporary down-sampled raster:
//!
//! ```text
//! create_temp_placeholder ─┬─▶ placeholder_image   (always)
//!                          ├─▶ color_palette       (if enabled)
//!                          └─▶ placeholder_svg     (if enabled)
//!                          ▼
//!                     temp raster deleted
//! ```
//!
//! A step that fails leaves its own output empty and is logged; it never
//! stops the steps after it. If the temp raster cannot be created nothing is
//! produced at all.

use crate::imaging::{AspectRatio, CropPosition, PlaceholderBackend};
use crate::types::SourceImage;

/// Which optional placeholder outputs to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderFlags {
    pub color_palette: bool,
    pub silhouette: bool,
}

/// Placeholder outputs. Fields are empty when their step was skipped or
/// failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
    /// Base64 JPEG.
    pub image: String,
    pub color_palette: Vec<String>,
    /// Encoded silhouette markup.
    pub silhouette: String,
}

/// Generate placeholders for `source` cropped to `aspect`.
///
/// The crop is anchored at the source's focal point when it has one. Returns
/// `None` when no temp raster could be created.
pub fn generate<P: PlaceholderBackend + ?Sized>(
    backend: &P,
    flags: PlaceholderFlags,
    source: &SourceImage,
    aspect: AspectRatio,
) -> Option<Placeholders> {
    let position = CropPosition::from_focal_point(source.focal_point);

    let temp = match backend.create_temp_placeholder(source, aspect, position) {
        Ok(temp) => temp,
        Err(e) => {
            log::warn!(
                "Skipping placeholders for {}: no temp raster: {}",
                source.location,
                e
            );
            return None;
        }
    };

    let mut placeholders = Placeholders::default();

    match backend.placeholder_image(&temp, aspect, position) {
        Ok(image) => placeholders.image = image,
        Err(e) => log::warn!("Placeholder image failed for {}: {}", source.location, e),
    }

    if flags.color_palette {
        match backend.color_palette(&temp) {
            Ok(palette) => placeholders.color_palette = palette,
            Err(e) => log::warn!("Colour palette failed for {}: {}", source.location, e),
        }
    }

    if flags.silhouette {
        match backend.placeholder_svg(&temp) {
            Ok(svg) => placeholders.silhouette = svg,
            Err(e) => log::warn!("Silhouette failed for {}: {}", source.location, e),
        }
    }

    drop(temp);
    log::debug!("Generated placeholders for {} at {}", source.location, position);
    Some(placeholders)
}
