use clap::{Parser, Subcommand};
use pickscale::imaging::RustBackend;
use pickscale::request::{ResizeRequest, ResizeResponse};
use pickscale::resizer::{ImageResizer, ResizeOptions};
use pickscale::{config, output};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "pickscale")]
#[command(about = "Downscale and recompress picked images, keeping EXIF")]
#[command(long_about = "\
Downscale and recompress picked images, keeping EXIF

An image is only rewritten when a maximum width, maximum height, or a
quality between 1 and 99 is given. SVG, APNG, and animated GIF/WebP files
are always left alone. Images with transparency are written as PNG,
everything else as JPEG.

Scaled copies land in the output directory as scaled_<file name>:

  pickscale resize --max-width 1024 ~/Pictures/IMG_0001.jpg
  pickscale resize --quality 70 ~/Pictures/holiday/
  echo '{\"path\": \"a.jpg\", \"maxHeight\": 600}' | pickscale call

Set RUST_LOG=pickscale=debug to see why files were skipped.
Run 'pickscale gen-config' to generate a documented pickscale.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output directory, overriding the config file
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize files, or every file under the given directories
    Resize {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Maximum width in pixels
        #[arg(long)]
        max_width: Option<f64>,
        /// Maximum height in pixels
        #[arg(long)]
        max_height: Option<f64>,
        /// JPEG quality; only 1-99 has an effect
        #[arg(long)]
        quality: Option<i64>,
    },
    /// Read one JSON request from stdin and write the JSON response to stdout
    Call,
    /// Print a stock pickscale.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Resize {
            paths,
            max_width,
            max_height,
            quality,
        } => {
            let config = config::load_config(cli.config.as_deref())?;
            let resizer = build_resizer(&config, cli.output_dir)?;
            init_thread_pool(&config.processing);
            let requests: Vec<ResizeRequest> = collect_files(&paths)
                .into_iter()
                .map(|path| ResizeRequest {
                    path,
                    max_width,
                    max_height,
                    image_quality: quality,
                })
                .collect();

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_event(&event);
                }
            });
            let results = resizer.resize_batch(&requests, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let summary = output::Summary::from_results(&results);
            output::print_summary(&summary);
            if let Some(message) = summary.failure_message() {
                return Err(message.into());
            }
        }
        Command::Call => {
            let config = config::load_config(cli.config.as_deref())?;
            let resizer = build_resizer(&config, cli.output_dir)?;
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            let response = ResizeResponse::from_call(&resizer, &input);
            println!("{}", serde_json::to_string(&response)?);
        }
    }

    Ok(())
}

/// `--output-dir` wins over the config file, which wins over the platform data dir.
fn build_resizer(
    config: &config::ResizerConfig,
    output_dir: Option<PathBuf>,
) -> Result<ImageResizer<RustBackend>, config::ConfigError> {
    let output_dir = match output_dir {
        Some(dir) => dir,
        None => config.output_dir()?,
    };
    Ok(ImageResizer::new(
        RustBackend::new(),
        ResizeOptions::from_config(config, output_dir),
    ))
}

/// Log to stderr so `call` output on stdout stays machine-readable.
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pickscale=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Expand directories into the files beneath them, sorted; plain paths pass through.
fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        tracing::warn!("Skipping unreadable entry: {e}");
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file() && !is_hidden(entry.path()))
                .map(|entry| entry.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}
