//! Parameter types for image operations.
//!
//! These types describe *what* a backend should produce, not *how*. They are
//! the interface between the [`variants`](crate::variants) expander (which
//! decides which transforms exist) and the [`backend`](super::backend) traits
//! (which turn them into URLs and placeholder rasters).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 82). Clamped on construction.
//! - [`AspectRatio`]: Rational `x:y` ratio with exact integer height math.
//! - [`CropPosition`]: Where to anchor a crop: centered or at a focal point.

use crate::types::FocalPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(82)
    }
}

/// Aspect ratio expressed as `x:y`.
///
/// Kept as a rational rather than an `f64` so that heights derived from it
/// are exact: `16:9` at 400px wide is 225px, not 224 after a float round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    pub x: u32,
    pub y: u32,
}

impl AspectRatio {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Height for `width` at this ratio, truncated toward zero and capped at
    /// `u32::MAX`.
    ///
    /// Returns 0 for a degenerate ratio (`x == 0`).
    pub fn height_for(self, width: u32) -> u32 {
        if self.x == 0 {
            return 0;
        }
        u32::try_from(width as u64 * self.y as u64 / self.x as u64).unwrap_or(u32::MAX)
    }

    /// Width for `height` at this ratio, truncated toward zero and capped at
    /// `u32::MAX`.
    pub fn width_for(self, height: u32) -> u32 {
        if self.y == 0 {
            return 0;
        }
        u32::try_from(height as u64 * self.x as u64 / self.y as u64).unwrap_or(u32::MAX)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.x, self.y)
    }
}

/// Crop anchor for placeholder rasters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CropPosition {
    #[default]
    CenterCenter,
    /// Normalized focal point, both coordinates in `0.0..=1.0`.
    Focal { x: f64, y: f64 },
}

impl CropPosition {
    /// Focal point if set, otherwise `center-center`.
    pub fn from_focal_point(focal_point: Option<FocalPoint>) -> Self {
        match focal_point {
            Some(fp) => Self::Focal {
                x: fp.x.clamp(0.0, 1.0),
                y: fp.y.clamp(0.0, 1.0),
            },
            None => Self::CenterCenter,
        }
    }

    /// Anchor as normalized `(x, y)` coordinates.
    pub fn anchor(self) -> (f64, f64) {
        match self {
            Self::CenterCenter => (0.5, 0.5),
            Self::Focal { x, y } => (x, y),
        }
    }
}

impl fmt::Display for CropPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CenterCenter => f.write_str("center-center"),
            Self::Focal { x, y } => write!(f, "{}%-{}%", (x * 100.0).round(), (y * 100.0).round()),
        }
    }
}
