//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every built image leads with its positional index and file name; the
//! source location, the URL map and the placeholders are indented context
//! lines beneath it.
//!
//! # Output Format
//!
//! ## Optimize
//!
//! ```text
//! 001 dawn.jpg (1600x900)
//!     Source: photos/dawn.jpg
//!     400w ← 400: https://img.example.com/dawn.jpg?w=400&h=225&q=80
//!         webp: https://img.example.com/dawn.jpg?w=400&h=225&q=80&fm=webp
//!     800w ← 400: https://img.example.com/dawn.jpg?w=800&h=450&q=80
//!         webp: https://img.example.com/dawn.jpg?w=800&h=450&q=80&fm=webp
//!     Placeholder: 400x225, image 1.1K, box 151.0B
//!     Palette: #3a4b5c #d0d4e8
//!
//! Built 1 image, 2 URLs
//! ```
//!
//! ## Check
//!
//! ```text
//! Variants
//! 001 1200w source ratio, q82, jpg, 1x
//! 002 992w 16:9, q82, jpg, 1x
//!
//! Placeholders
//!     Colour palette: on
//!     Silhouettes: off
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::config::Settings;
use crate::filesize::FileSize;
use crate::model::OptimizedImage;
use crate::types::SourceImage;
use crate::variants::{AspectMode, VariantSpec};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format a retina multiplier: `1x`, `1.5x`.
fn format_retina(size: f64) -> String {
    format!("{}x", size)
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Optimize output
// ============================================================================

/// Format one built image.
///
/// URL lines show the map key and the pre-retina variant width it came from
/// (`800w ← 400`), so collisions are visible.
pub fn format_model_output(
    index: usize,
    source: &SourceImage,
    model: &OptimizedImage,
) -> Vec<String> {
    let mut lines = Vec::new();
    let filename = Path::new(&source.location)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.location.clone());

    lines.push(format!(
        "{} {} ({}x{})",
        format_index(index),
        filename,
        source.width,
        source.height
    ));
    lines.push(format!("{}Source: {}", indent(1), source.location));

    if model.optimized_image_urls.is_empty() {
        lines.push(format!("{}No variants", indent(1)));
        return lines;
    }

    for (position, (width, url)) in model.optimized_image_urls.iter().enumerate() {
        let source_width = model
            .variant_source_widths
            .get(position)
            .map(|w| w.to_string())
            .unwrap_or_else(|| "?".to_string());
        lines.push(format!("{}{}w ← {}: {}", indent(1), width, source_width, url));
        match model.optimized_webp_image_urls.get(width) {
            Some(webp) if !webp.is_empty() => {
                lines.push(format!("{}webp: {}", indent(2), webp));
            }
            _ => {}
        }
    }

    if let (Some(w), Some(h)) = (model.placeholder_width, model.placeholder_height) {
        lines.push(format!(
            "{}Placeholder: {}x{}, image {}, box {}",
            indent(1),
            w,
            h,
            model.placeholder_image_size(),
            model.placeholder_box_size()
        ));
    }
    if !model.color_palette.is_empty() {
        lines.push(format!(
            "{}Palette: {}",
            indent(1),
            model.color_palette.join(" ")
        ));
    }
    if !model.placeholder_svg.is_empty() {
        lines.push(format!(
            "{}Silhouette: {}",
            indent(1),
            model.placeholder_silhouette_size()
        ));
    }
    lines
}

/// Format the closing summary of an optimize run.
pub fn format_optimize_summary(models: &[OptimizedImage]) -> String {
    let urls: usize = models.iter().map(|m| m.optimized_image_urls.len()).sum();
    format!(
        "Built {}, {}",
        plural(models.len(), "image"),
        plural(urls, "URL")
    )
}

/// Print optimize output to stdout.
pub fn print_optimize_output(sources: &[SourceImage], models: &[OptimizedImage]) {
    for (i, (source, model)) in sources.iter().zip(models).enumerate() {
        for line in format_model_output(i + 1, source, model) {
            println!("{}", line);
        }
    }
    println!();
    println!("{}", format_optimize_summary(models));
}

// ============================================================================
// Size output
// ============================================================================

/// Format a remote size probe result.
pub fn format_size_line(url: &str, size: &FileSize) -> String {
    match size {
        FileSize::Unavailable => format!("{} → unavailable (-1)", url),
        other => format!("{} → {}", url, other),
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format one variant: width, ratio, quality, format, densities.
fn variant_line(index: usize, variant: &VariantSpec) -> String {
    let ratio = match variant.aspect {
        AspectMode::Fixed(ratio) => ratio.to_string(),
        AspectMode::Source => "source ratio".to_string(),
    };
    let retina: Vec<String> = variant
        .effective_retina_sizes()
        .iter()
        .map(|&s| format_retina(s))
        .collect();
    format!(
        "{} {}w {}, q{}, {}, {}",
        format_index(index),
        variant.width,
        ratio,
        variant.quality.value(),
        variant.format.as_deref().unwrap_or("source format"),
        retina.join(" ")
    )
}

/// Format the effective settings for `check`.
pub fn format_check_output(settings: &Settings) -> Vec<String> {
    let mut lines = vec!["Variants".to_string()];
    for (i, variant) in settings.default_variants.iter().enumerate() {
        lines.push(variant_line(i + 1, variant));
    }
    lines.push(String::new());
    lines.push("Placeholders".to_string());
    lines.push(format!(
        "{}Colour palette: {}",
        indent(1),
        on_off(settings.create_color_palette)
    ));
    lines.push(format!(
        "{}Silhouettes: {}",
        indent(1),
        on_off(settings.create_placeholder_silhouettes)
    ));
    lines.push(String::new());
    lines.push("Transform".to_string());
    lines.push(format!("{}Base URL: {}", indent(1), settings.transform.base_url));
    lines
}

/// Print check output to stdout.
pub fn print_check_output(settings: &Settings) {
    for line in format_check_output(settings) {
        println!("{}", line);
    }
}
