//! Builds real images end to end: a JPEG on disk goes through `identify_in`,
//! the URL transform backend and the pure Rust placeholder backend.

use base64::Engine;
use image::{Rgb, RgbImage};
use optimized_images::config::Settings;
use optimized_images::imaging::{RustPlaceholderBackend, UrlTransformBackend, identify_in};
use optimized_images::model::OptimizedImage;
use optimized_images::optimizer::Optimizer;
use optimized_images::types::FocalPoint;
use optimized_images::variants::VariantSpec;
use std::path::Path;
use tempfile::TempDir;

fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        if x > width / 3 && x < 2 * width / 3 && y > height / 4 && y < 3 * height / 4 {
            Rgb([20, 30, 50])
        } else {
            Rgb([220, 210, 190])
        }
    });
    img.save_with_format(path, image::ImageFormat::Jpeg).unwrap();
}

fn optimizer(
    root: &Path,
    temp_dir: &Path,
    silhouettes: bool,
) -> Optimizer<UrlTransformBackend, RustPlaceholderBackend> {
    let settings = Settings {
        create_placeholder_silhouettes: silhouettes,
        ..Settings::default()
    };
    Optimizer::new(
        UrlTransformBackend::parse("https://img.example.com/").unwrap(),
        RustPlaceholderBackend::new()
            .with_temp_dir(temp_dir)
            .with_source_root(root),
        settings,
    )
    .with_variants(vec![
        VariantSpec::fixed(400, 80, 16, 9).with_retina_sizes(&[1.0, 2.0]),
    ])
}

#[test]
fn builds_urls_and_placeholders_from_a_real_jpeg() {
    let images = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let path = images.path().join("dawn.jpg");
    write_jpeg(&path, 640, 360);

    let source = identify_in(images.path(), &path).unwrap();
    assert_eq!((source.width, source.height), (640, 360));
    assert_eq!(source.extension, "jpg");

    let model = optimizer(images.path(), scratch.path(), false).build(&source);

    let widths: Vec<u32> = model.optimized_image_urls.widths().collect();
    assert_eq!(widths, vec![400, 800]);
    assert_eq!(model.variant_source_widths, vec![400, 400]);
    assert_eq!(
        model.src(),
        "https://img.example.com/dawn.jpg?w=400&h=225&q=80&interlace=1"
    );
    assert!(
        model
            .optimized_image_urls
            .get(800)
            .unwrap()
            .contains("w=800&h=450")
    );
    assert!(
        model
            .optimized_webp_image_urls
            .get(400)
            .unwrap()
            .ends_with("fm=webp")
    );
    assert_eq!(model.original_image_width, Some(640));
    assert_eq!(model.original_image_height, Some(360));
    assert_eq!((model.placeholder_width, model.placeholder_height), (Some(400), Some(225)));

    // Placeholder is a 16px wide JPEG at the variant's ratio
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&model.placeholder)
        .unwrap();
    let placeholder = image::load_from_memory(&bytes).unwrap();
    assert_eq!((placeholder.width(), placeholder.height()), (16, 9));

    assert!(!model.color_palette.is_empty());
    assert!(model.color_palette.iter().all(|c| c.starts_with('#') && c.len() == 7));
    assert!(model.placeholder_svg.is_empty());

    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[test]
fn silhouette_is_traced_when_enabled() {
    let images = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let path = images.path().join("shape.jpg");
    write_jpeg(&path, 320, 180);

    let source = identify_in(images.path(), &path)
        .unwrap()
        .with_focal_point(FocalPoint { x: 0.5, y: 0.5 });
    let model = optimizer(images.path(), scratch.path(), true).build(&source);

    assert!(model.placeholder_svg.starts_with("%3Csvg"));
    assert!(
        model
            .placeholder_silhouette()
            .starts_with("data:image/svg+xml,%3Csvg")
    );
    assert_eq!(model.focal_point, Some(FocalPoint { x: 0.5, y: 0.5 }));
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[test]
fn built_model_survives_json_storage() {
    let images = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let path = images.path().join("dawn.jpg");
    write_jpeg(&path, 640, 360);
    let source = identify_in(images.path(), &path).unwrap();
    let optimizer = optimizer(images.path(), scratch.path(), false);

    let model = optimizer.build(&source);
    let json = model.to_json().unwrap();
    assert!(json.contains("\"optimizedWebPImageUrls\""));
    assert_eq!(OptimizedImage::from_json(&json).unwrap(), model);

    // Rebuilding from stored data gives the same result
    let normalized = optimizer.normalize(Some(&json), Some(&source));
    assert_eq!(normalized.optimized_image_urls, model.optimized_image_urls);
    assert_eq!(normalized.srcset(), model.srcset());
}

#[test]
fn build_all_handles_several_images() {
    let images = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let sources: Vec<_> = ["a.jpg", "b.jpg", "c.jpg"]
        .iter()
        .map(|name| {
            let path = images.path().join(name);
            write_jpeg(&path, 480, 270);
            identify_in(images.path(), &path).unwrap()
        })
        .collect();

    let models = optimizer(images.path(), scratch.path(), false).build_all(&sources);

    assert_eq!(models.len(), 3);
    for (source, model) in sources.iter().zip(&models) {
        let expected = format!("https://img.example.com/{}?", source.location);
        assert!(model.src().starts_with(&expected));
        assert!(!model.placeholder.is_empty());
    }
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}
