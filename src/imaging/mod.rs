//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_decoder` (header only) |
//! | **Animation check** | GIF frame count, WebP `has_animation`, `is_apng` |
//! | **Scale → JPEG/PNG** | `resize_exact` + `JpegEncoder` / `PngEncoder` |
//! | **EXIF** | `kamadak-exif` read, custom APP1 / `eXIf` splice |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **EXIF**: Raw metadata transfer between containers

pub mod backend;
mod calculations;
pub(crate) mod exif;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, SourceInfo};
pub use calculations::calculate_scaled_dimensions;
pub use params::{Axis, ConstraintError, Constraints, OutputFormat, Quality, ResizeFilter, ScaleParams};
pub use rust_backend::RustBackend;
