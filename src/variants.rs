//! Variant specifications and their expansion into transform requests.
//!
//! A [`VariantSpec`] describes one design slot (say, "400px wide, 16:9, q80,
//! 1x and 2x"). [`expand`] turns a list of them into the concrete
//! [`TransformRequest`]s a backend is asked for, one per
//! `(variant, retina size)` pair, in input order.
//!
//! ## Dimensions
//!
//! ```text
//! width  = floor(variant.width × retina)
//! height = floor(width / aspect)        (exact integer math on x:y)
//! ```
//!
//! The aspect ratio is the variant's own `x:y` when it uses one, otherwise the
//! source image's `width:height`.
//!
//! ## Eligibility
//!
//! A pair is skipped silently unless the output format (the variant's, or the
//! source extension when unset) and the source extension are both
//! transformable, and the source has a non-zero height.
//!
//! ## Validation
//!
//! Specs are validated while they are deserialized, so a malformed variant
//! fails config loading rather than a build. See [`VariantSpec`] for the rules.

use crate::imaging::{AspectRatio, Quality};
use crate::types::SourceImage;
use serde::{Deserialize, Serialize};

/// Formats the transform pipeline can read and write. Kept in step with the
/// `image` decoders enabled in `Cargo.toml`, since placeholders are decoded
/// locally from the same source.
const TRANSFORMABLE_FORMATS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "tif", "tiff"];

/// Whether `format` (an extension, without the dot) can be transformed.
pub fn is_transformable_format(format: &str) -> bool {
    TRANSFORMABLE_FORMATS
        .iter()
        .any(|f| f.eq_ignore_ascii_case(format))
}

/// How a variant's output height is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectMode {
    /// Crop to a fixed ratio.
    Fixed(AspectRatio),
    /// Keep the source image's ratio.
    Source,
}

/// A validated variant specification.
///
/// Serialized as a flat table:
///
/// ```toml
/// [[default_variants]]
/// width = 400
/// format = "webp"          # optional; defaults to the source extension
/// quality = 80
/// use_aspect_ratio = true  # optional; default true
/// aspect_ratio_x = 16      # required when use_aspect_ratio is true
/// aspect_ratio_y = 9
/// retina_sizes = [1, 2]    # optional; default [1]
/// ```
///
/// Rules: `width > 0`, `quality` in `1..=100`, every retina size finite and
/// positive, and both ratio components positive when a ratio is used.
/// camelCase keys (`aspectRatioX`, `retinaSizes`, ...) are accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawVariantSpec", into = "RawVariantSpec")]
pub struct VariantSpec {
    pub width: u32,
    pub format: Option<String>,
    pub quality: Quality,
    pub aspect: AspectMode,
    pub retina_sizes: Vec<f64>,
}

impl VariantSpec {
    /// A 1x variant cropped to `x:y`.
    pub fn fixed(width: u32, quality: u32, x: u32, y: u32) -> Self {
        Self {
            width,
            format: None,
            quality: Quality::new(quality),
            aspect: AspectMode::Fixed(AspectRatio::new(x, y)),
            retina_sizes: vec![1.0],
        }
    }

    /// A 1x variant that keeps the source aspect ratio.
    pub fn source_aspect(width: u32, quality: u32) -> Self {
        Self {
            width,
            format: None,
            quality: Quality::new(quality),
            aspect: AspectMode::Source,
            retina_sizes: vec![1.0],
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_retina_sizes(mut self, sizes: &[f64]) -> Self {
        self.retina_sizes = sizes.to_vec();
        self
    }

    /// Retina multipliers, `[1]` when none are configured.
    pub fn effective_retina_sizes(&self) -> &[f64] {
        if self.retina_sizes.is_empty() {
            &[1.0]
        } else {
            &self.retina_sizes
        }
    }

    /// Aspect ratio used for `source`.
    pub fn aspect_ratio(&self, source: &SourceImage) -> AspectRatio {
        match self.aspect {
            AspectMode::Fixed(ratio) => ratio,
            AspectMode::Source => AspectRatio::new(source.width, source.height),
        }
    }
}

/// Retina multiplier as stored: a number, or a numeric string as exported
/// by CMS field settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawRetinaSize {
    Number(f64),
    Text(String),
}

/// Unvalidated wire form of [`VariantSpec`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVariantSpec {
    width: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    quality: u32,
    #[serde(default = "default_true", alias = "useAspectRatio")]
    use_aspect_ratio: bool,
    #[serde(default, alias = "aspectRatioX", skip_serializing_if = "Option::is_none")]
    aspect_ratio_x: Option<u32>,
    #[serde(default, alias = "aspectRatioY", skip_serializing_if = "Option::is_none")]
    aspect_ratio_y: Option<u32>,
    #[serde(default, alias = "retinaSizes")]
    retina_sizes: Vec<RawRetinaSize>,
}

fn default_true() -> bool {
    true
}

impl TryFrom<RawVariantSpec> for VariantSpec {
    type Error = String;

    fn try_from(raw: RawVariantSpec) -> Result<Self, Self::Error> {
        if raw.width == 0 {
            return Err("variant width must be greater than 0".into());
        }
        if !(1..=100).contains(&raw.quality) {
            return Err(format!(
                "variant quality must be 1-100, got {}",
                raw.quality
            ));
        }

        let aspect = if raw.use_aspect_ratio {
            match (raw.aspect_ratio_x, raw.aspect_ratio_y) {
                (Some(x), Some(y)) if x > 0 && y > 0 => AspectMode::Fixed(AspectRatio::new(x, y)),
                (Some(_), Some(_)) => {
                    return Err(format!(
                        "variant {}: aspect_ratio_x/y must be non-zero",
                        raw.width
                    ));
                }
                _ => {
                    return Err(format!(
                        "variant {}: aspect_ratio_x and aspect_ratio_y are required when use_aspect_ratio is true",
                        raw.width
                    ));
                }
            }
        } else {
            AspectMode::Source
        };

        let mut retina_sizes = Vec::with_capacity(raw.retina_sizes.len());
        for size in raw.retina_sizes {
            let value = match size {
                RawRetinaSize::Number(n) => n,
                RawRetinaSize::Text(s) => s
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| format!("variant {}: invalid retina size {s:?}", raw.width))?,
            };
            if !value.is_finite() || value <= 0.0 {
                return Err(format!(
                    "variant {}: retina sizes must be positive, got {value}",
                    raw.width
                ));
            }
            if scaled_width(raw.width, value).is_none() {
                return Err(format!(
                    "variant {}: retina size {value} gives a width outside 1-{}",
                    raw.width,
                    u32::MAX
                ));
            }
            retina_sizes.push(value);
        }
        if retina_sizes.is_empty() {
            retina_sizes.push(1.0);
        }

        Ok(Self {
            width: raw.width,
            format: raw.format.filter(|f| !f.is_empty()),
            quality: Quality(raw.quality),
            aspect,
            retina_sizes,
        })
    }
}

impl From<VariantSpec> for RawVariantSpec {
    fn from(spec: VariantSpec) -> Self {
        let (use_aspect_ratio, aspect_ratio_x, aspect_ratio_y) = match spec.aspect {
            AspectMode::Fixed(ratio) => (true, Some(ratio.x), Some(ratio.y)),
            AspectMode::Source => (false, None, None),
        };
        Self {
            width: spec.width,
            format: spec.format,
            quality: spec.quality.value(),
            use_aspect_ratio,
            aspect_ratio_x,
            aspect_ratio_y,
            retina_sizes: spec
                .retina_sizes
                .into_iter()
                .map(RawRetinaSize::Number)
                .collect(),
        }
    }
}

/// A concrete instruction for the transform backend.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRequest {
    pub width: u32,
    pub height: u32,
    /// Output format; `None` keeps the source format.
    pub format: Option<String>,
    pub quality: Quality,
    pub interlace: bool,
}

/// A transform request plus the bookkeeping a build needs alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedRequest {
    pub request: TransformRequest,
    /// Pre-retina width of the variant this request came from.
    pub source_width: u32,
    /// Ratio used to size the request; placeholders reuse it.
    pub aspect: AspectRatio,
}

/// `width × retina`, floored, or `None` when it falls outside `1..=u32::MAX`.
fn scaled_width(width: u32, retina: f64) -> Option<u32> {
    let scaled = (width as f64 * retina).floor();
    if (1.0..=u32::MAX as f64).contains(&scaled) {
        Some(scaled as u32)
    } else {
        None
    }
}

/// Expand `variants` × retina sizes into transform requests for `source`.
///
/// Ineligible pairs produce nothing (see the [module docs](self)).
pub fn expand(
    variants: &[VariantSpec],
    source: &SourceImage,
    interlace: bool,
) -> Vec<ExpandedRequest> {
    let mut requests = Vec::new();

    for variant in variants {
        let final_format = variant.format.as_deref().unwrap_or(&source.extension);
        if !is_transformable_format(final_format)
            || !is_transformable_format(&source.extension)
            || source.height == 0
        {
            log::debug!(
                "Skipping variant {}: format {final_format} from {} ({}px high) is not transformable",
                variant.width,
                source.extension,
                source.height
            );
            continue;
        }

        let aspect = variant.aspect_ratio(source);
        for &retina in variant.effective_retina_sizes() {
            let Some(width) = scaled_width(variant.width, retina) else {
                log::debug!("Skipping variant {} at {retina}x: width out of range", variant.width);
                continue;
            };
            requests.push(ExpandedRequest {
                request: TransformRequest {
                    width,
                    height: aspect.height_for(width),
                    format: variant.format.clone(),
                    quality: variant.quality,
                    interlace,
                },
                source_width: variant.width,
                aspect,
            });
        }
    }

    requests
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::jpg_source;

    fn dims(requests: &[ExpandedRequest]) -> Vec<(u32, u32)> {
        requests
            .iter()
            .map(|r| (r.request.width, r.request.height))
            .collect()
    }

    // =========================================================================
    // expand tests
    // =========================================================================

    #[test]
    fn expands_retina_sizes_in_order() {
        let variants = [VariantSpec::fixed(400, 80, 16, 9).with_retina_sizes(&[1.0, 2.0])];
        let requests = expand(&variants, &jpg_source(1600, 900), true);

        assert_eq!(dims(&requests), vec![(400, 225), (800, 450)]);
        assert!(requests.iter().all(|r| r.source_width == 400));
        assert!(requests.iter().all(|r| r.request.quality.value() == 80));
        assert!(requests.iter().all(|r| r.request.interlace));
    }

    #[test]
    fn preserves_variant_order() {
        let variants = [
            VariantSpec::fixed(800, 80, 1, 1),
            VariantSpec::fixed(200, 80, 1, 1),
        ];
        let requests = expand(&variants, &jpg_source(1000, 1000), true);
        assert_eq!(dims(&requests), vec![(800, 800), (200, 200)]);
    }

    #[test]
    fn source_aspect_uses_image_ratio() {
        let variants = [VariantSpec::source_aspect(400, 80)];
        let requests = expand(&variants, &jpg_source(1000, 750), true);
        assert_eq!(dims(&requests), vec![(400, 300)]);
        assert_eq!(requests[0].aspect, AspectRatio::new(1000, 750));
    }

    #[test]
    fn height_is_truncated_not_rounded() {
        // 100 * 2 / 3 = 66.67
        let variants = [VariantSpec::fixed(100, 80, 3, 2)];
        let requests = expand(&variants, &jpg_source(300, 200), true);
        assert_eq!(requests[0].request.height, 66);
    }

    #[test]
    fn fractional_retina_floors_width() {
        let variants = [VariantSpec::fixed(333, 80, 1, 1).with_retina_sizes(&[1.5])];
        let requests = expand(&variants, &jpg_source(1000, 1000), true);
        assert_eq!(requests[0].request.width, 499);
    }

    #[test]
    fn out_of_range_retina_width_is_skipped() {
        let variants =
            [VariantSpec::fixed(3_000_000_000, 80, 1, 1).with_retina_sizes(&[2.0, 1.0])];
        let requests = expand(&variants, &jpg_source(1000, 1000), true);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].request.width, 3_000_000_000);
    }

    #[test]
    fn tiff_source_is_expanded() {
        let source = SourceImage::new("scan.tif", "tif", 1600, 900);
        let variants = [VariantSpec::fixed(400, 80, 16, 9).with_format("jpg")];
        let requests = expand(&variants, &source, true);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].request.format.as_deref(), Some("jpg"));
    }

    #[test]
    fn avif_source_is_skipped() {
        let source = SourceImage::new("photo.avif", "avif", 1600, 900);
        let variants = [VariantSpec::fixed(400, 80, 16, 9).with_format("jpg")];
        assert!(expand(&variants, &source, true).is_empty());
    }

    #[test]
    fn zero_height_source_produces_nothing() {
        let variants = [VariantSpec::fixed(400, 80, 16, 9).with_retina_sizes(&[1.0, 2.0])];
        assert!(expand(&variants, &jpg_source(1600, 0), true).is_empty());
    }

    #[test]
    fn untransformable_source_extension_is_skipped() {
        let variants = [VariantSpec::fixed(400, 80, 16, 9)];
        let source = SourceImage::new("doc.pdf", "pdf", 1600, 900);
        assert!(expand(&variants, &source, true).is_empty());
    }

    #[test]
    fn untransformable_target_format_skips_only_that_variant() {
        let variants = [
            VariantSpec::fixed(400, 80, 16, 9).with_format("bmp"),
            VariantSpec::fixed(200, 80, 16, 9).with_format("webp"),
        ];
        let requests = expand(&variants, &jpg_source(1600, 900), true);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].request.format.as_deref(), Some("webp"));
    }

    #[test]
    fn duplicate_scaled_widths_are_all_emitted() {
        let variants = [
            VariantSpec::fixed(400, 80, 1, 1).with_retina_sizes(&[2.0]),
            VariantSpec::fixed(800, 80, 1, 1),
        ];
        let requests = expand(&variants, &jpg_source(1000, 1000), true);
        assert_eq!(dims(&requests), vec![(800, 800), (800, 800)]);
        assert_eq!(
            requests.iter().map(|r| r.source_width).collect::<Vec<_>>(),
            vec![400, 800]
        );
    }

    #[test]
    fn interlace_follows_backend_support() {
        let variants = [VariantSpec::fixed(400, 80, 16, 9)];
        let requests = expand(&variants, &jpg_source(1600, 900), false);
        assert!(!requests[0].request.interlace);
    }

    #[test]
    fn transformable_formats_are_case_insensitive() {
        assert!(is_transformable_format("JPG"));
        assert!(is_transformable_format("webp"));
        assert!(is_transformable_format("tiff"));
        assert!(!is_transformable_format("pdf"));
        // No local decoder for these
        assert!(!is_transformable_format("avif"));
        assert!(!is_transformable_format("svg"));
        assert!(!is_transformable_format(""));
    }

    // =========================================================================
    // VariantSpec parsing tests
    // =========================================================================

    #[test]
    fn parse_full_variant() {
        let spec: VariantSpec = toml::from_str(
            r#"
width = 400
format = "webp"
quality = 80
aspect_ratio_x = 16
aspect_ratio_y = 9
retina_sizes = [1, 2]
"#,
        )
        .unwrap();
        assert_eq!(spec.width, 400);
        assert_eq!(spec.format.as_deref(), Some("webp"));
        assert_eq!(spec.aspect, AspectMode::Fixed(AspectRatio::new(16, 9)));
        assert_eq!(spec.retina_sizes, vec![1.0, 2.0]);
    }

    #[test]
    fn parse_camel_case_with_string_retina_sizes() {
        let spec: VariantSpec = serde_json::from_str(
            r#"{"width":992,"quality":82,"aspectRatioX":4,"aspectRatioY":3,"retinaSizes":["1","1.5"]}"#,
        )
        .unwrap();
        assert_eq!(spec.retina_sizes, vec![1.0, 1.5]);
        assert_eq!(spec.format, None);
    }

    #[test]
    fn parse_defaults_retina_to_one() {
        let spec: VariantSpec =
            toml::from_str("width = 400\nquality = 80\nuse_aspect_ratio = false\n").unwrap();
        assert_eq!(spec.retina_sizes, vec![1.0]);
        assert_eq!(spec.aspect, AspectMode::Source);
    }

    #[test]
    fn parse_rejects_missing_ratio() {
        let err = toml::from_str::<VariantSpec>("width = 400\nquality = 80\n").unwrap_err();
        assert!(err.to_string().contains("aspect_ratio_x and aspect_ratio_y are required"));
    }

    #[test]
    fn parse_rejects_zero_width() {
        let result = toml::from_str::<VariantSpec>(
            "width = 0\nquality = 80\nuse_aspect_ratio = false\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn parse_rejects_quality_out_of_range() {
        let result = toml::from_str::<VariantSpec>(
            "width = 400\nquality = 0\nuse_aspect_ratio = false\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn parse_rejects_non_positive_retina() {
        let result = toml::from_str::<VariantSpec>(
            "width = 400\nquality = 80\nuse_aspect_ratio = false\nretina_sizes = [0]\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn parse_rejects_retina_width_out_of_range() {
        let overflow = toml::from_str::<VariantSpec>(
            "width = 3000000000\nquality = 80\nuse_aspect_ratio = false\nretina_sizes = [2]\n",
        );
        assert!(overflow.unwrap_err().to_string().contains("outside"));

        let zero = toml::from_str::<VariantSpec>(
            "width = 1\nquality = 80\nuse_aspect_ratio = false\nretina_sizes = [0.5]\n",
        );
        assert!(zero.is_err());
    }

    #[test]
    fn variant_serializes_flat() {
        let spec = VariantSpec::fixed(400, 80, 16, 9).with_retina_sizes(&[1.0, 2.0]);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["aspect_ratio_x"], 16);
        assert_eq!(json["use_aspect_ratio"], true);
        let back: VariantSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }
}
