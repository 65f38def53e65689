//! Pure Rust placeholder backend, no external services.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF) | `image` crate (pure Rust decoders) |
//! | Crop at focal point | `image::DynamicImage::crop_imm` + [`calculate_crop_rect`] |
//! | Down-sample | `image::DynamicImage::resize_exact` with `Triangle` filter |
//! | Temp raster | JPEG q75 in a `tempfile` named file |
//! | Placeholder | 16px JPEG q50 → `base64` |
//! | Colour palette | coarse RGB histogram (4 bits/channel), dominant first |
//! | Silhouette | luminance threshold at the mean → SVG path of dark runs |

use super::backend::{BackendError, PlaceholderBackend, TempRaster};
use super::calculations::{
    PLACEHOLDER_WIDTH, TEMP_PLACEHOLDER_WIDTH, calculate_crop_rect, calculate_downsample_dimensions,
};
use super::params::{AspectRatio, CropPosition};
use crate::data_uri::encode_svg;
use crate::types::SourceImage;
use base64::{Engine as _, engine::general_purpose};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// JPEG quality of the intermediate raster.
const TEMP_PLACEHOLDER_QUALITY: u8 = 75;

/// JPEG quality of the base64 placeholder.
const PLACEHOLDER_QUALITY: u8 = 50;

/// Maximum number of palette entries.
const PALETTE_SIZE: usize = 5;

/// Width the silhouette is traced at.
const SILHOUETTE_WIDTH: u32 = 64;

/// Fill colour of the silhouette shape.
const SILHOUETTE_FILL: &str = "#d3d3d3";

/// Pure Rust backend using the `image` crate ecosystem.
///
/// `SourceImage::location` is read as a filesystem path, relative to
/// `source_root` when one is set (see [`identify_in`]). Temp rasters go to
/// `temp_dir` (the OS temp directory by default) under unique names, so
/// concurrent builds never share one.
#[derive(Debug, Clone, Default)]
pub struct RustPlaceholderBackend {
    temp_dir: Option<PathBuf>,
    source_root: Option<PathBuf>,
}

impl RustPlaceholderBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(temp_dir.into());
        self
    }

    /// Directory that source locations are relative to.
    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    fn source_path(&self, source: &SourceImage) -> PathBuf {
        match &self.source_root {
            Some(root) => root.join(&source.location),
            None => PathBuf::from(&source.location),
        }
    }
}

/// Build a [`SourceImage`] for a file on disk.
///
/// Reads only the image header for dimensions.
pub fn identify(path: &Path) -> Result<SourceImage, BackendError> {
    let (width, height) = image::image_dimensions(path)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    Ok(SourceImage::new(
        path.to_string_lossy(),
        extension,
        width,
        height,
    ))
}

/// Build a [`SourceImage`] for a file under `root`.
///
/// The location is the path relative to `root` with `/` separators, so only
/// that part ends up in transform URLs. Fails when `path` is not under `root`.
pub fn identify_in(root: &Path, path: &Path) -> Result<SourceImage, BackendError> {
    let root = root.canonicalize()?;
    let full = path.canonicalize()?;
    let relative = full.strip_prefix(&root).map_err(|_| {
        BackendError::ProcessingFailed(format!(
            "{} is not under {}",
            path.display(),
            root.display()
        ))
    })?;
    let location = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    let mut source = identify(&full)?;
    source.location = location;
    Ok(source)
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode as baseline JPEG (alpha dropped) at `quality`.
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, BackendError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut bytes = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality);
    rgb.write_with_encoder(encoder)?;
    Ok(bytes)
}

/// Dominant colours of `img`, most frequent first, as `#rrggbb`.
///
/// Pixels are bucketed by the top 4 bits of each channel; each bucket reports
/// the mean colour of its members.
fn dominant_colors(img: &DynamicImage, max_colors: usize) -> Vec<String> {
    let rgb = img.to_rgb8();
    let mut buckets: HashMap<u16, (u64, [u64; 3])> = HashMap::new();

    for pixel in rgb.pixels() {
        let [r, g, b] = pixel.0;
        let key = ((r as u16 >> 4) << 8) | ((g as u16 >> 4) << 4) | (b as u16 >> 4);
        let entry = buckets.entry(key).or_insert((0, [0; 3]));
        entry.0 += 1;
        entry.1[0] += r as u64;
        entry.1[1] += g as u64;
        entry.1[2] += b as u64;
    }

    let mut ranked: Vec<(u16, (u64, [u64; 3]))> = buckets.into_iter().collect();
    // Ties broken by bucket key so output is deterministic
    ranked.sort_by(|a, b| b.1.0.cmp(&a.1.0).then(a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .take(max_colors)
        .map(|(_, (count, sums))| {
            format!(
                "#{:02x}{:02x}{:02x}",
                sums[0] / count,
                sums[1] / count,
                sums[2] / count
            )
        })
        .collect()
}

/// Trace the darker-than-average pixels of `img` into SVG markup.
///
/// Each row's dark runs become `h`/`v` rectangles in a single path; the
/// viewBox matches the traced raster so the SVG scales to any box.
fn trace_silhouette(img: &DynamicImage) -> String {
    let (trace_w, trace_h) =
        calculate_downsample_dimensions((img.width(), img.height()), SILHOUETTE_WIDTH);
    let gray = img
        .resize_exact(trace_w, trace_h, FilterType::Triangle)
        .to_luma8();

    let total: u64 = gray.pixels().map(|p| p.0[0] as u64).sum();
    let mean = total / (trace_w as u64 * trace_h as u64).max(1);

    let mut path = String::new();
    for y in 0..trace_h {
        let mut x = 0;
        while x < trace_w {
            if (gray.get_pixel(x, y).0[0] as u64) < mean {
                let start = x;
                while x < trace_w && (gray.get_pixel(x, y).0[0] as u64) < mean {
                    x += 1;
                }
                path.push_str(&format!("M{start} {y}h{}v1h-{}z", x - start, x - start));
            } else {
                x += 1;
            }
        }
    }

    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {trace_w} {trace_h}\" preserveAspectRatio=\"none\"><path fill=\"{SILHOUETTE_FILL}\" d=\"{path}\"/></svg>"
    )
}

impl PlaceholderBackend for RustPlaceholderBackend {
    fn create_temp_placeholder(
        &self,
        source: &SourceImage,
        aspect: AspectRatio,
        position: CropPosition,
    ) -> Result<TempRaster, BackendError> {
        let img = load_image(&self.source_path(source))?;
        let rect = calculate_crop_rect((img.width(), img.height()), aspect, position);
        let cropped = img.crop_imm(rect.x, rect.y, rect.width, rect.height);
        let (width, height) =
            calculate_downsample_dimensions((rect.width, rect.height), TEMP_PLACEHOLDER_WIDTH);
        let small = cropped.resize_exact(width, height, FilterType::Triangle);

        let bytes = encode_jpeg(&small, TEMP_PLACEHOLDER_QUALITY)?;
        let mut file = tempfile::Builder::new()
            .prefix("placeholder-")
            .suffix(".jpg")
            .tempfile_in(self.temp_dir())?;
        std::io::Write::write_all(&mut file, &bytes)?;

        log::debug!(
            "Created temp placeholder {}x{} at {} for {}",
            width,
            height,
            position,
            source.location
        );
        Ok(TempRaster::new(file.into_temp_path()))
    }

    fn placeholder_image(
        &self,
        temp: &TempRaster,
        aspect: AspectRatio,
        _position: CropPosition,
    ) -> Result<String, BackendError> {
        let img = load_image(temp.path())?;
        let height = aspect.height_for(PLACEHOLDER_WIDTH).max(1);
        let tiny = img.resize_exact(PLACEHOLDER_WIDTH, height, FilterType::Triangle);
        let bytes = encode_jpeg(&tiny, PLACEHOLDER_QUALITY)?;
        Ok(general_purpose::STANDARD.encode(bytes))
    }

    fn color_palette(&self, temp: &TempRaster) -> Result<Vec<String>, BackendError> {
        let img = load_image(temp.path())?;
        Ok(dominant_colors(&img, PALETTE_SIZE))
    }

    fn placeholder_svg(&self, temp: &TempRaster) -> Result<String, BackendError> {
        let img = load_image(temp.path())?;
        Ok(encode_svg(&trace_silhouette(&img)))
    }
}
