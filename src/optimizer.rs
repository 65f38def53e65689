//! Builds [`OptimizedImage`]s from source images.
//!
//! An [`Optimizer`] owns its collaborators: a [`TransformBackend`] for URLs,
//! a [`PlaceholderBackend`] for placeholders, and the [`Settings`]. Nothing
//! is looked up globally, so tests inject recording mocks.
//!
//! ## Build
//!
//! ```text
//! reset model
//! for each expanded (variant, retina) request, in order:
//!     copy focal point + original size
//!     resolve URLs ──(none)──▶ skip
//!     urls[width] = url; webp[width] = webp; source_widths.push(variant.width)
//!     first success only: placeholder size = request size, generate placeholders
//! ```
//!
//! Builds of different images are independent: [`Optimizer::build_all`] runs
//! them in parallel. Each placeholder temp raster has a unique name, so
//! parallel builds never share one.

use crate::config::Settings;
use crate::imaging::{PlaceholderBackend, TransformBackend};
use crate::model::OptimizedImage;
use crate::placeholder::{self, PlaceholderFlags};
use crate::transform;
use crate::types::SourceImage;
use crate::variants::{self, VariantSpec};
use rayon::prelude::*;

pub struct Optimizer<T, P> {
    transform: T,
    placeholder: P,
    settings: Settings,
    variants: Vec<VariantSpec>,
}

impl<T: TransformBackend, P: PlaceholderBackend> Optimizer<T, P> {
    pub fn new(transform: T, placeholder: P, settings: Settings) -> Self {
        Self {
            transform,
            placeholder,
            settings,
            variants: Vec::new(),
        }
    }

    /// Use `variants` instead of the settings' defaults. An empty list falls
    /// back to the defaults.
    pub fn with_variants(mut self, variants: Vec<VariantSpec>) -> Self {
        self.variants = variants;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Variants a build expands.
    pub fn variants(&self) -> &[VariantSpec] {
        if self.variants.is_empty() {
            &self.settings.default_variants
        } else {
            &self.variants
        }
    }

    pub fn transform_backend(&self) -> &T {
        &self.transform
    }

    pub fn placeholder_backend(&self) -> &P {
        &self.placeholder
    }

    fn placeholder_flags(&self) -> PlaceholderFlags {
        PlaceholderFlags {
            color_palette: self.settings.create_color_palette,
            silhouette: self.settings.create_placeholder_silhouettes,
        }
    }

    /// Rebuild `model` from `source`, discarding whatever it held.
    pub fn populate(&self, model: &mut OptimizedImage, source: &SourceImage) {
        model.reset();
        let interlace = self.transform.supports_interlace();
        let mut placeholder_made = false;

        for expanded in variants::expand(self.variants(), source, interlace) {
            let request = &expanded.request;
            model.focal_point = source.focal_point;
            model.original_image_width = Some(source.width);
            model.original_image_height = Some(source.height);

            let Some(urls) = transform::resolve(&self.transform, source, request) else {
                log::debug!(
                    "No URL for {} at {}x{}",
                    source.location,
                    request.width,
                    request.height
                );
                continue;
            };

            log::debug!(
                "{} {}x{} → {}",
                source.location,
                request.width,
                request.height,
                urls.url
            );
            model.optimized_image_urls.insert(request.width, urls.url);
            model
                .optimized_webp_image_urls
                .insert(request.width, urls.webp_url);
            model.variant_source_widths.push(expanded.source_width);

            if !placeholder_made {
                placeholder_made = true;
                model.placeholder_width = Some(request.width);
                model.placeholder_height = Some(request.height);
                if let Some(generated) = placeholder::generate(
                    &self.placeholder,
                    self.placeholder_flags(),
                    source,
                    expanded.aspect,
                ) {
                    model.placeholder = generated.image;
                    model.color_palette = generated.color_palette;
                    model.placeholder_svg = generated.silhouette;
                }
            }
        }
    }

    /// Build a fresh model for `source`.
    pub fn build(&self, source: &SourceImage) -> OptimizedImage {
        let mut model = OptimizedImage::default();
        self.populate(&mut model, source);
        log::info!(
            "Built {} ({} URLs)",
            source.location,
            model.optimized_image_urls.len()
        );
        model
    }

    /// Decode stored data and, when a source is available, rebuild it.
    ///
    /// Without a source (an unsaved entity, say) the stored data is returned
    /// as-is. Stored data that does not decode is replaced by an empty model.
    pub fn normalize(
        &self,
        raw_json: Option<&str>,
        source: Option<&SourceImage>,
    ) -> OptimizedImage {
        let mut model = match raw_json.map(str::trim).filter(|json| !json.is_empty()) {
            Some(json) => OptimizedImage::from_json(json).unwrap_or_else(|e| {
                log::warn!("Discarding stored optimized image data: {e}");
                OptimizedImage::default()
            }),
            None => OptimizedImage::default(),
        };
        if let Some(source) = source {
            self.populate(&mut model, source);
        }
        model
    }

    /// Build every source in parallel, preserving input order.
    pub fn build_all(&self, sources: &[SourceImage]) -> Vec<OptimizedImage> {
        sources.par_iter().map(|source| self.build(source)).collect()
    }
}
