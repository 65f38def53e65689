//! Pure calculation functions for placeholder geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{AspectRatio, CropPosition};

/// Width of the intermediate raster every placeholder is derived from.
pub const TEMP_PLACEHOLDER_WIDTH: u32 = 300;

/// Width of the final base64 placeholder image.
pub const PLACEHOLDER_WIDTH: u32 = 16;

/// A crop rectangle within a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest rectangle of the given aspect ratio that fits inside `source`,
/// anchored as close to `position` as the image bounds allow.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `aspect` - Target aspect ratio
/// * `position` - Crop anchor (center or focal point)
///
/// A degenerate ratio returns the full image.
pub fn calculate_crop_rect(
    source: (u32, u32),
    aspect: AspectRatio,
    position: CropPosition,
) -> CropRect {
    let (src_w, src_h) = source;
    if aspect.x == 0 || aspect.y == 0 || src_w == 0 || src_h == 0 {
        return CropRect {
            x: 0,
            y: 0,
            width: src_w,
            height: src_h,
        };
    }

    let (crop_w, crop_h) = if src_w as u64 * aspect.y as u64 > src_h as u64 * aspect.x as u64 {
        // Source is wider: full height, trimmed width
        (aspect.width_for(src_h).clamp(1, src_w), src_h)
    } else {
        // Source is taller (or equal): full width, trimmed height
        (src_w, aspect.height_for(src_w).clamp(1, src_h))
    };

    let (anchor_x, anchor_y) = position.anchor();
    CropRect {
        x: anchored_offset(src_w, crop_w, anchor_x),
        y: anchored_offset(src_h, crop_h, anchor_y),
        width: crop_w,
        height: crop_h,
    }
}

/// Offset that centers a `span`-long window on `anchor * extent`, clamped so
/// the window stays inside `0..extent`.
fn anchored_offset(extent: u32, span: u32, anchor: f64) -> u32 {
    let max_offset = extent.saturating_sub(span);
    let center = anchor * extent as f64;
    let offset = (center - span as f64 / 2.0).round();
    offset.clamp(0.0, max_offset as f64) as u32
}

/// Dimensions for a down-sampled raster no wider than `max_width`.
///
/// Never upscales; never returns a zero dimension.
pub fn calculate_downsample_dimensions(crop: (u32, u32), max_width: u32) -> (u32, u32) {
    let (crop_w, crop_h) = crop;
    if crop_w == 0 || crop_h == 0 {
        return (1, 1);
    }
    let width = crop_w.min(max_width).max(1);
    let height = ((width as u64 * crop_h as u64) / crop_w as u64).max(1) as u32;
    (width, height)
}
