//! # pickscale
//!
//! Conditionally downscale and recompress a picked image, keeping its EXIF
//! metadata. Given a path plus optional maximum width, maximum height, and
//! quality, pickscale either hands the original path back untouched or writes
//! a scaled copy and returns that path instead.
//!
//! ```text
//! request { path, maxWidth?, maxHeight?, imageQuality? }
//!     │
//!     ├─ nothing requested / svg / animated  →  original path
//!     ├─ not an image                        →  null
//!     └─ scale → encode (PNG if alpha, else JPEG) → copy EXIF → scaled path
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`resizer`] | The gate chain, output naming, and parallel batches |
//! | [`request`] | JSON method-call request and response types |
//! | [`imaging`] | Dimension math, the [`ImageBackend`](imaging::ImageBackend) trait, the `image`-based backend, EXIF transfer |
//! | [`config`] | `pickscale.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting for resize runs |
//!
//! # Design Decisions
//!
//! ## Backend Trait
//!
//! All pixel and metadata work goes through [`imaging::ImageBackend`]. The
//! resizer never touches a decoder directly, so its gate order and naming
//! rules are unit tested against a recording mock instead of real files.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling, and encoding use the `image` crate; EXIF is read
//! with `kamadak-exif` and spliced back into the encoded bytes by hand.
//! There are no system libraries to install.
//!
//! ## Output Naming
//!
//! Scaled files are written as `<prefix><original file name>` in a single
//! output directory. The extension is kept even when a PNG source without
//! alpha is re-encoded as JPEG; callers rely on the name, and decoders sniff
//! content.

pub mod config;
pub mod imaging;
pub mod output;
pub mod request;
pub mod resizer;

#[cfg(test)]
pub(crate) mod test_helpers;
