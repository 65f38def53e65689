//! Shared types consumed by every stage of a build.
//!
//! A [`SourceImage`] is owned by whatever storage system holds the original
//! asset; this crate only reads it.

use serde::{Deserialize, Serialize};

/// Normalized focal point (`0.0..=1.0` on both axes) marking the subject to
/// keep when cropping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocalPoint {
    pub x: f64,
    pub y: f64,
}

/// The original image a build derives variants from.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    /// Reference handed to the backends: a filesystem path or a URL path.
    pub location: String,
    /// File extension without the dot, e.g. `"jpg"`.
    pub extension: String,
    pub width: u32,
    pub height: u32,
    pub focal_point: Option<FocalPoint>,
}

impl SourceImage {
    pub fn new(
        location: impl Into<String>,
        extension: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            location: location.into(),
            extension: extension.into(),
            width,
            height,
            focal_point: None,
        }
    }

    pub fn with_focal_point(mut self, focal_point: FocalPoint) -> Self {
        self.focal_point = Some(focal_point);
        self
    }
}
