//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify (dimensions, alpha) | `image::ImageReader::into_decoder`, header only |
//! | Decode | `image::ImageReader::decode`; failures after open are [`BackendError::Decode`] |
//! | Animated GIF | `image::codecs::gif::GifDecoder`, more than one frame |
//! | Animated WebP | `image::codecs::webp::WebPDecoder::has_animation` |
//! | APNG | `image::codecs::png::PngDecoder::is_apng` |
//! | Resize | `image::DynamicImage::resize_exact` with the configured filter |
//! | Encode → JPEG / PNG | `JpegEncoder::new_with_quality` / `PngEncoder` |
//! | EXIF | `kamadak-exif` read + [`exif`](super::exif) splice |

use super::backend::{BackendError, Dimensions, ImageBackend, SourceInfo};
use super::exif;
use super::params::{OutputFormat, ResizeFilter, ScaleParams};
use image::codecs::gif::GifDecoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{PngDecoder, PngEncoder};
use image::codecs::webp::WebPDecoder;
use image::imageops::FilterType;
use image::{AnimationDecoder, DynamicImage, ImageDecoder, ImageError, ImageFormat, ImageReader};
use std::fs;
use std::io::{BufRead, Seek};
use std::path::Path;
use tracing::debug;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn filter_type(filter: ResizeFilter) -> FilterType {
    match filter {
        ResizeFilter::Nearest => FilterType::Nearest,
        ResizeFilter::Triangle => FilterType::Triangle,
        ResizeFilter::CatmullRom => FilterType::CatmullRom,
        ResizeFilter::Gaussian => FilterType::Gaussian,
        ResizeFilter::Lanczos3 => FilterType::Lanczos3,
    }
}

/// Load and decode an image from disk, sniffing the format from its content.
///
/// Only opening the file is an I/O error. Once it is open, any failure
/// (including a read hitting the end of truncated data) is a decode error.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| BackendError::Decode(format!("{}: {}", path.display(), e)))
}

/// Encode into an in-memory buffer so EXIF can be spliced before writing.
fn encode(img: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let result = match format {
        OutputFormat::Png => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_with_encoder(PngEncoder::new(&mut buf))
        }
        OutputFormat::Jpeg { quality } => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality.value())),
    };
    result.map_err(|e| BackendError::Encode(format!("{format} encode failed: {e}")))?;
    Ok(buf)
}

/// Frame-count based animation check for the formats that can animate.
fn detect_animation<R: BufRead + Seek>(reader: ImageReader<R>) -> Result<bool, ImageError> {
    let format = reader.format();
    let inner = reader.into_inner();
    match format {
        Some(ImageFormat::Gif) => {
            let frames = GifDecoder::new(inner)?.into_frames();
            Ok(frames.take(2).count() > 1)
        }
        Some(ImageFormat::WebP) => Ok(WebPDecoder::new(inner)?.has_animation()),
        Some(ImageFormat::Png) => PngDecoder::new(inner)?.is_apng(),
        _ => Ok(false),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Option<SourceInfo>, BackendError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        if reader.format().is_none() {
            debug!("Unrecognized image format: {}", path.display());
            return Ok(None);
        }
        match reader.into_decoder() {
            Ok(decoder) => {
                let (width, height) = decoder.dimensions();
                Ok(Some(SourceInfo {
                    dimensions: Dimensions { width, height },
                    has_alpha: decoder.color_type().has_alpha(),
                }))
            }
            Err(e) => {
                debug!("Cannot decode {}: {e}", path.display());
                Ok(None)
            }
        }
    }

    fn is_animated(&self, path: &Path) -> Result<bool, BackendError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        match detect_animation(reader) {
            Ok(animated) => Ok(animated),
            // Broken data is left for the decode gate
            Err(e) => {
                debug!("Animation check failed for {}: {e}", path.display());
                Ok(false)
            }
        }
    }

    fn scale(&self, params: &ScaleParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let resized = img.resize_exact(params.width, params.height, filter_type(params.filter));
        let encoded = encode(&resized, params.format)?;

        if let Some(parent) = params.output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&params.output, encoded)?;
        Ok(())
    }

    fn copy_exif(&self, source: &Path, dest: &Path) -> Result<bool, BackendError> {
        let Some(tiff) = exif::read_exif(source)? else {
            return Ok(false);
        };
        let mut encoded = fs::read(dest)?;
        if !exif::embed_exif(&mut encoded, &tiff) {
            return Ok(false);
        }
        fs::write(dest, encoded)?;
        Ok(true)
    }
}
