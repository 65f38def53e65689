//! # Optimized Images
//!
//! Responsive-image metadata for a source image: a set of transform URLs (and
//! their WebP siblings) derived from declarative variant specs, plus cheap
//! placeholders for progressive loading.
//!
//! # Architecture: Expand → Resolve → Placeholder
//!
//! ```text
//! 1. Expand       variants × retina sizes  →  transform requests   (pure)
//! 2. Resolve      request                  →  URL + WebP URL       (TransformBackend)
//! 3. Placeholder  first resolved request   →  raster, palette, SVG (PlaceholderBackend)
//! ```
//!
//! The results accumulate into an [`OptimizedImage`](model::OptimizedImage),
//! which answers `src`/`srcset` queries and serializes to a flat JSON object
//! for storage.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`variants`] | Variant specs, validation, expansion into transform requests |
//! | [`transform`] | Resolves a request to a URL and WebP URL via the transform backend |
//! | [`placeholder`] | Placeholder generation from one temp raster, degrade-and-continue |
//! | [`optimizer`] | Dependency-injected builder tying the stages together |
//! | [`model`] | The built result: width maps, srcset selection, placeholder data URIs |
//! | [`imaging`] | Backend traits, crop geometry, URL and pure-Rust placeholder backends |
//! | [`filesize`] | Remote `Content-Length` probe and human-readable sizes |
//! | [`data_uri`] | JPEG and SVG data URI encoding |
//! | [`config`] | `config.toml` loading, stock-default merging, validation |
//! | [`types`] | Source image and focal point |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Backends Are Injected
//!
//! An [`Optimizer`](optimizer::Optimizer) receives its transform backend,
//! placeholder backend and settings at construction. Nothing is reached
//! through globals, so every stage is testable with recording mocks and two
//! optimizers with different CDNs can coexist in one process.
//!
//! ## Pixels Happen Elsewhere
//!
//! Transformed images are never produced here. A transform backend only
//! encodes the request into a URL; the image service behind it does the
//! resampling on first request. The only local pixel work is the small temp
//! raster placeholders are derived from.
//!
//! ## Parallel Width Lists
//!
//! `variantSourceWidths` is kept parallel to the insertion order of the URL
//! maps, exactly as stored data expects. Filtering by design slot (the
//! pre-retina width) therefore returns every density of that slot. Width
//! collisions overwrite the earlier URL in place while the width list still
//! grows; see [`model`] for the consequences.
//!
//! ## Degrade, Don't Fail
//!
//! Per-image work never errors. Ineligible variants are skipped, refused
//! URLs are dropped, and a failed placeholder step leaves only its own field
//! empty. The one hard failure is a malformed variant spec, and that surfaces
//! when settings are loaded.

pub mod config;
pub mod data_uri;
pub mod filesize;
pub mod imaging;
pub mod model;
pub mod optimizer;
pub mod output;
pub mod placeholder;
pub mod transform;
pub mod types;
pub mod variants;

#[cfg(test)]
pub(crate) mod test_helpers;
