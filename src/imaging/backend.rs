//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four operations every backend must
//! support: identify, is_animated, scale, and copy_exif.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate for pixels and `kamadak-exif` for metadata.

use super::params::ScaleParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decoding failed: {0}")]
    Decode(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// What the resizer needs to know about a source before scaling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    pub dimensions: Dimensions,
    pub has_alpha: bool,
}

/// Trait for image processing backends.
///
/// Every backend must implement all four operations so the resizer stays
/// backend-agnostic.
pub trait ImageBackend: Sync {
    /// Read dimensions and alpha presence without decoding pixels.
    ///
    /// Returns `Ok(None)` when the file is not a decodable image, and `Err`
    /// when it cannot be read at all.
    fn identify(&self, path: &Path) -> Result<Option<SourceInfo>, BackendError>;

    /// Whether the file holds more than one frame (GIF, WebP, APNG).
    fn is_animated(&self, path: &Path) -> Result<bool, BackendError>;

    /// Decode, resize to exactly `width`x`height`, encode, and write.
    ///
    /// Pixel data that cannot be decoded is [`BackendError::Decode`], even
    /// when the header was identified; failing to open or write is `Io`.
    fn scale(&self, params: &ScaleParams) -> Result<(), BackendError>;

    /// Copy EXIF metadata from `source` into the already-written `dest`.
    ///
    /// Returns `Ok(false)` when the source has no readable EXIF.
    fn copy_exif(&self, source: &Path, dest: &Path) -> Result<bool, BackendError>;
}
