//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`resizer`](crate::resizer) (which decides whether
//! and how an image gets scaled) and the [`backend`](super::backend) (which
//! does the actual pixel work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing the gating logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 100). Clamped on construction.
//! - [`Constraints`]: Optional max width / max height, validated on construction.
//! - [`OutputFormat`]: PNG (lossless, quality ignored) or JPEG at a quality.
//! - [`ResizeFilter`]: Resampling filter handed to the backend.
//! - [`ScaleParams`]: Full specification for a scale: source, output, target dimensions, format.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    /// Interpret a caller-supplied quality.
    ///
    /// Only 1..=99 counts as a request to recompress; anything else
    /// (absent, zero, negative, 100 and above) is ignored.
    pub fn from_request(requested: Option<i64>) -> Option<Self> {
        match requested {
            Some(q @ 1..=99) => Some(Self(q as u8)),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(100)
    }
}

/// Optional upper bounds on the output dimensions, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Constraints {
    pub max_width: Option<f64>,
    pub max_height: Option<f64>,
}

/// A dimension bound that is zero, negative, or not a number.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("{axis} must be a positive number, got {value}")]
pub struct ConstraintError {
    pub axis: Axis,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Width => write!(f, "max width"),
            Self::Height => write!(f, "max height"),
        }
    }
}

impl Constraints {
    /// Build constraints, rejecting bounds that are not finite and positive.
    pub fn new(max_width: Option<f64>, max_height: Option<f64>) -> Result<Self, ConstraintError> {
        for (axis, value) in [(Axis::Width, max_width), (Axis::Height, max_height)] {
            match value {
                Some(v) if !(v.is_finite() && v > 0.0) => {
                    return Err(ConstraintError { axis, value: v });
                }
                _ => {}
            }
        }
        Ok(Self {
            max_width,
            max_height,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.max_width.is_none() && self.max_height.is_none()
    }
}

/// Encoding chosen for a scaled image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Lossless; used whenever the source carries an alpha channel.
    Png,
    Jpeg { quality: Quality },
}

impl OutputFormat {
    /// PNG for images with alpha, JPEG at `quality` otherwise.
    pub fn for_source(has_alpha: bool, quality: Quality) -> Self {
        if has_alpha {
            Self::Png
        } else {
            Self::Jpeg { quality }
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Png => write!(f, "png"),
            Self::Jpeg { quality } => write!(f, "jpeg q{}", quality.value()),
        }
    }
}

/// Resampling filter used when scaling.
///
/// `Nearest` is the default: it matches an unfiltered bitmap scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    #[default]
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

/// Parameters for a single scale-and-encode operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub filter: ResizeFilter,
}
