//! Conditional downscale-and-recompress of a single picked image.
//!
//! [`ImageResizer::resize_image_if_needed`] runs a short chain of gates and
//! only then touches pixels:
//!
//! ```text
//! 1. anything requested?   no max width, no max height, no valid quality → original path
//! 2. resizable extension?  svg / apng (configurable)                      → original path
//! 3. animated?             GIF / WebP with frames, APNG by content         → original path
//! 4. decodable?            not an image, or pixels fail to decode          → no path
//! 5. scale                 aspect-preserving dimensions, PNG if alpha else JPEG
//! 6. copy EXIF             best effort, source → destination
//! ```
//!
//! The output lands in the configured directory as `<prefix><file name>`,
//! the file name kept verbatim even when the encoding changes.
//!
//! ## Batches
//!
//! [`ImageResizer::resize_batch`] fans requests out over rayon and reports a
//! [`ResizeEvent`] per finished request, so the CLI can print progress while
//! work continues. Results come back in input order.
//!
//! Outputs share one flat directory, so two sources with the same file name
//! would write the same file. The first request in input order keeps the
//! name; later ones fail with [`ResizeError::OutputConflict`] before any
//! work starts.

use crate::config::ResizerConfig;
use crate::imaging::{
    BackendError, ConstraintError, ImageBackend, OutputFormat, Quality, ResizeFilter, ScaleParams,
    calculate_scaled_dimensions,
};
use crate::request::ResizeRequest;
use rayon::prelude::*;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Backend(#[from] BackendError),
    #[error("Invalid constraint: {0}")]
    InvalidConstraint(#[from] ConstraintError),
    #[error("Path has no file name: {0}")]
    InvalidPath(PathBuf),
    #[error(
        "Output {} is already written for {}",
        .output.display(),
        .claimed_by.display()
    )]
    OutputConflict { output: PathBuf, claimed_by: PathBuf },
}

impl ResizeError {
    /// Stable machine-readable code for the method-call response.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) | Self::Backend(BackendError::Io(_)) => "io_error",
            Self::Backend(BackendError::Decode(_)) => "decode_failed",
            Self::Backend(BackendError::Encode(_)) => "encode_failed",
            Self::InvalidConstraint(_) | Self::InvalidPath(_) => "invalid_argument",
            Self::OutputConflict { .. } => "output_conflict",
        }
    }
}

/// Why a file was handed back untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No max width, max height, or valid quality was requested.
    NothingRequested,
    /// Extension is in the non-resizable list.
    NonResizableExtension(String),
    Animated,
}

/// A freshly written scaled image.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub exif_copied: bool,
}

/// Result of a resize call that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum ResizeOutcome {
    Unchanged { path: PathBuf, reason: SkipReason },
    Scaled(ScaledImage),
    /// The source could not be decoded; there is no path to return.
    Undecodable { path: PathBuf },
}

impl ResizeOutcome {
    /// The path the caller should use from now on, if any.
    pub fn output_path(&self) -> Option<&Path> {
        match self {
            Self::Unchanged { path, .. } => Some(path),
            Self::Scaled(scaled) => Some(&scaled.path),
            Self::Undecodable { .. } => None,
        }
    }
}

/// Progress report for one finished request of a batch.
#[derive(Debug, Clone)]
pub struct ResizeEvent {
    /// 1-based position in the batch.
    pub index: usize,
    pub source: PathBuf,
    pub result: Result<ResizeOutcome, String>,
}

/// Resizer settings, resolved from [`ResizerConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeOptions {
    pub output_dir: PathBuf,
    pub prefix: String,
    pub filter: ResizeFilter,
    pub default_quality: Quality,
    /// Lowercase, without the dot.
    pub non_resizable_extensions: Vec<String>,
}

impl ResizeOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self::from_config(&ResizerConfig::default(), output_dir.into())
    }

    pub fn from_config(config: &ResizerConfig, output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            prefix: config.output.prefix.clone(),
            filter: config.resize.filter,
            default_quality: config.default_quality(),
            non_resizable_extensions: config
                .resize
                .non_resizable_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }
}

/// Resizes picked images through an [`ImageBackend`].
pub struct ImageResizer<B> {
    backend: B,
    options: ResizeOptions,
}

impl<B: ImageBackend> ImageResizer<B> {
    pub fn new(backend: B, options: ResizeOptions) -> Self {
        Self { backend, options }
    }

    pub fn options(&self) -> &ResizeOptions {
        &self.options
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Resize the image at `request.path` if the request and the file allow it.
    ///
    /// See the [module docs](self) for the gate order.
    pub fn resize_image_if_needed(
        &self,
        request: &ResizeRequest,
    ) -> Result<ResizeOutcome, ResizeError> {
        let source = request.path.as_path();
        let constraints = request.constraints()?;
        let requested_quality = request.valid_quality();

        if constraints.is_empty() && requested_quality.is_none() {
            debug!("Nothing requested for {}", source.display());
            return Ok(unchanged(source, SkipReason::NothingRequested));
        }

        if let Some(ext) = self.non_resizable_extension(source) {
            debug!("Not resizing {}: .{ext} is not resizable", source.display());
            return Ok(unchanged(source, SkipReason::NonResizableExtension(ext)));
        }

        if self.backend.is_animated(source)? {
            debug!("Not resizing animated image {}", source.display());
            return Ok(unchanged(source, SkipReason::Animated));
        }

        let Some(info) = self.backend.identify(source)? else {
            info!("Cannot decode {}", source.display());
            return Ok(ResizeOutcome::Undecodable {
                path: source.to_path_buf(),
            });
        };

        let output = self.output_path(source)?;

        let original = (info.dimensions.width, info.dimensions.height);
        let (width, height) = calculate_scaled_dimensions(original, &constraints);
        let quality = requested_quality.unwrap_or(self.options.default_quality);
        let format = OutputFormat::for_source(info.has_alpha, quality);
        if format == OutputFormat::Png && requested_quality.is_some() {
            debug!(
                "Compression is not supported for PNG; {} keeps full quality",
                source.display()
            );
        }

        let scaled = self.backend.scale(&ScaleParams {
            source: source.to_path_buf(),
            output: output.clone(),
            width,
            height,
            format,
            filter: self.options.filter,
        });
        match scaled {
            Ok(()) => {}
            Err(BackendError::Decode(reason)) => {
                info!("Cannot decode {}: {reason}", source.display());
                return Ok(ResizeOutcome::Undecodable {
                    path: source.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        }
        let exif_copied = self.backend.copy_exif(source, &output)?;

        info!(
            "Scaled {} {}x{} → {}x{} ({format})",
            source.display(),
            original.0,
            original.1,
            width,
            height
        );
        Ok(ResizeOutcome::Scaled(ScaledImage {
            path: output,
            width,
            height,
            format,
            exif_copied,
        }))
    }

    /// Resize many requests in parallel.
    ///
    /// Each finished request is reported on `progress` (if given) as soon as
    /// it completes; the returned results keep the input order.
    pub fn resize_batch(
        &self,
        requests: &[ResizeRequest],
        progress: Option<Sender<ResizeEvent>>,
    ) -> Vec<Result<ResizeOutcome, ResizeError>> {
        let conflicts = self.output_conflicts(requests);
        requests
            .par_iter()
            .zip(conflicts.into_par_iter())
            .enumerate()
            .map_with(progress, |progress, (i, (request, conflict))| {
                let result = match conflict {
                    Some(err) => Err(err),
                    None => self.resize_image_if_needed(request),
                };
                if let Some(tx) = progress {
                    // A closed receiver only means nobody is listening
                    let _ = tx.send(ResizeEvent {
                        index: i + 1,
                        source: request.path.clone(),
                        result: result.as_ref().cloned().map_err(|e| e.to_string()),
                    });
                }
                result
            })
            .collect()
    }

    /// `<output_dir>/<prefix><file name>`.
    fn output_path(&self, source: &Path) -> Result<PathBuf, ResizeError> {
        let file_name = source
            .file_name()
            .ok_or_else(|| ResizeError::InvalidPath(source.to_path_buf()))?;
        Ok(self.options.output_dir.join(format!(
            "{}{}",
            self.options.prefix,
            file_name.to_string_lossy()
        )))
    }

    /// Where a request would write, unless a gate that needs no file access
    /// already rules it out.
    fn planned_output(&self, request: &ResizeRequest) -> Option<PathBuf> {
        let constraints = request.constraints().ok()?;
        if constraints.is_empty() && request.valid_quality().is_none() {
            return None;
        }
        if self.non_resizable_extension(&request.path).is_some() {
            return None;
        }
        self.output_path(&request.path).ok()
    }

    /// One slot per request: the conflict error for every request whose
    /// output an earlier request already claims.
    fn output_conflicts(&self, requests: &[ResizeRequest]) -> Vec<Option<ResizeError>> {
        let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
        requests
            .iter()
            .map(|request| {
                let output = self.planned_output(request)?;
                match claimed.entry(output) {
                    Entry::Occupied(entry) => {
                        warn!(
                            "{} and {} both map to {}",
                            entry.get().display(),
                            request.path.display(),
                            entry.key().display()
                        );
                        Some(ResizeError::OutputConflict {
                            output: entry.key().clone(),
                            claimed_by: entry.get().to_path_buf(),
                        })
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(&request.path);
                        None
                    }
                }
            })
            .collect()
    }

    fn non_resizable_extension(&self, path: &Path) -> Option<String> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        self.options
            .non_resizable_extensions
            .contains(&ext)
            .then_some(ext)
    }
}

fn unchanged(path: &Path, reason: SkipReason) -> ResizeOutcome {
    ResizeOutcome::Unchanged {
        path: path.to_path_buf(),
        reason,
    }
}
