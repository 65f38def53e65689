//! Shared test utilities.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = jpg_source(1600, 900);          // no file behind it
//! let tmp = tempfile::TempDir::new().unwrap();
//! let path = tmp.path().join("dawn.jpg");
//! write_test_jpeg(&path, 320, 180);            // real decodable JPEG
//! ```

use crate::types::SourceImage;
use image::{Rgb, RgbImage};
use std::path::Path;

/// A JPEG source at `source.jpg`, with no file behind it.
pub fn jpg_source(width: u32, height: u32) -> SourceImage {
    SourceImage::new("source.jpg", "jpg", width, height)
}

/// Write a decodable JPEG with a dark disc on a light gradient, so palette
/// and silhouette extraction have something to find.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
    let radius = width.min(height) as f64 / 3.0;
    let img = RgbImage::from_fn(width, height, |x, y| {
        let (dx, dy) = (x as f64 - cx, y as f64 - cy);
        if dx * dx + dy * dy < radius * radius {
            Rgb([30, 40, 60])
        } else {
            let shade = 180 + (x * 60 / width.max(1)) as u8;
            Rgb([shade, shade, 200])
        }
    });
    img.save_with_format(path, image::ImageFormat::Jpeg).unwrap();
}
