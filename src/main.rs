use clap::{Args, Parser, Subcommand};
use optimized_images::config::{self, Settings};
use optimized_images::filesize::RemoteSizeClient;
use optimized_images::imaging::{RustPlaceholderBackend, UrlTransformBackend, identify_in};
use optimized_images::optimizer::Optimizer;
use optimized_images::output;
use optimized_images::types::FocalPoint;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "optimized-images")]
#[command(about = "Responsive image URLs and placeholders from variant specs")]
#[command(long_about = "\
Responsive image URLs and placeholders from variant specs

Each image is expanded into one transform URL per (variant, retina size) pair,
plus a WebP sibling. The first URL also yields the placeholders: a tiny base64
JPEG, a dominant colour palette and, optionally, a traced SVG silhouette.

Variants and placeholder options come from config.toml in --config-dir:

  [[default_variants]]
  width = 400
  quality = 80
  aspect_ratio_x = 16
  aspect_ratio_y = 9
  retina_sizes = [1, 2]

Run 'optimized-images gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Override the transform base URL from config
    #[arg(long, global = true)]
    transform_base: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct OptimizeArgs {
    /// Source images
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Directory the images live under; their paths relative to it are
    /// appended to the transform base URL
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Focal point as normalized `x,y`, applied to every image
    #[arg(long, value_parser = parse_focal_point)]
    focal_point: Option<FocalPoint>,

    /// Print the built models as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SizeArgs {
    /// URL to probe; relative URLs need remote.site_url
    url: String,

    /// Print the size in bytes instead of a formatted size
    #[arg(long)]
    bytes: bool,

    /// Use GET instead of HEAD
    #[arg(long)]
    get: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build URLs and placeholders for images
    Optimize(OptimizeArgs),
    /// Look up the size of a remote file
    Size(SizeArgs),
    /// Validate config.toml and show the effective settings
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn parse_focal_point(value: &str) -> Result<FocalPoint, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got {value:?}"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| (0.0..=1.0).contains(n))
            .ok_or_else(|| format!("focal point coordinates must be 0.0-1.0, got {s:?}"))
    };
    Ok(FocalPoint {
        x: parse(x)?,
        y: parse(y)?,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match cli.command {
        Command::Optimize(ref args) => {
            let settings = load_settings(&cli)?;
            init_thread_pool(&settings.processing);

            let mut sources = Vec::with_capacity(args.images.len());
            for path in &args.images {
                let source = identify_in(&args.root, path)?;
                sources.push(match args.focal_point {
                    Some(fp) => source.with_focal_point(fp),
                    None => source,
                });
            }

            let transform = UrlTransformBackend::parse(&settings.transform.base_url)
                .ok_or("transform.base_url is not an absolute URL")?;
            let mut placeholder = RustPlaceholderBackend::new().with_source_root(&args.root);
            if let Some(dir) = &settings.placeholders.temp_dir {
                placeholder = placeholder.with_temp_dir(dir);
            }
            let optimizer = Optimizer::new(transform, placeholder, settings);
            let models = optimizer.build_all(&sources);

            if args.json {
                println!("{}", serde_json::to_string_pretty(&models)?);
            } else {
                output::print_optimize_output(&sources, &models);
            }
        }
        Command::Size(ref args) => {
            let settings = load_settings(&cli)?;
            let client = RemoteSizeClient::from_config(&settings.remote)?;
            let size = client.remote_file_size(&args.url, !args.bytes, !args.get);
            println!("{}", output::format_size_line(&args.url, &size));
        }
        Command::Check => {
            println!("==> Checking {}", cli.config_dir.join("config.toml").display());
            let settings = load_settings(&cli)?;
            output::print_check_output(&settings);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load settings from `--config-dir`, applying `--transform-base`.
fn load_settings(cli: &Cli) -> Result<Settings, config::ConfigError> {
    let mut settings = config::load_config(&cli.config_dir)?;
    if let Some(base) = &cli.transform_base {
        settings.transform.base_url = base.clone();
        settings.validate()?;
    }
    Ok(settings)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
