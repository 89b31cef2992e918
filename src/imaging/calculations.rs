//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Constraints;

/// Calculate the output dimensions for a constrained downscale.
///
/// Each axis is first clamped to its maximum (when one is given). If any
/// maximum is strictly smaller than the original, the axis that was *not*
/// the binding one is re-derived from the other so the aspect ratio holds:
///
/// - clamped width < clamped height: derive height from width, unless no
///   max width was supplied (then derive width from height)
/// - clamped height < clamped width: the mirror image of the above
/// - equal: the original orientation decides; portrait derives width,
///   landscape derives height, square keeps both
///
/// A final pass re-clamps any axis the derivation pushed past its bound.
/// Results are truncated to whole pixels and never drop below 1.
///
/// # Examples
/// ```
/// # use pickscale::imaging::{Constraints, calculate_scaled_dimensions};
/// // 4000x3000 with max width 1000 → 1000x750
/// let c = Constraints::new(Some(1000.0), None).unwrap();
/// assert_eq!(calculate_scaled_dimensions((4000, 3000), &c), (1000, 750));
///
/// // Constraints larger than the image leave it untouched
/// let c = Constraints::new(Some(5000.0), Some(5000.0)).unwrap();
/// assert_eq!(calculate_scaled_dimensions((4000, 3000), &c), (4000, 3000));
/// ```
pub fn calculate_scaled_dimensions(original: (u32, u32), constraints: &Constraints) -> (u32, u32) {
    let orig_w = original.0 as f64;
    let orig_h = original.1 as f64;
    let Constraints {
        max_width,
        max_height,
    } = *constraints;

    let mut width = max_width.map_or(orig_w, |m| orig_w.min(m));
    let mut height = max_height.map_or(orig_h, |m| orig_h.min(m));

    let downscale_width = max_width.is_some_and(|m| m < orig_w);
    let downscale_height = max_height.is_some_and(|m| m < orig_h);

    if downscale_width || downscale_height {
        let derived_width = (height / orig_h) * orig_w;
        let derived_height = (width / orig_w) * orig_h;

        if width < height {
            if max_width.is_none() {
                width = derived_width;
            } else {
                height = derived_height;
            }
        } else if height < width {
            if max_height.is_none() {
                height = derived_height;
            } else {
                width = derived_width;
            }
        } else if orig_w < orig_h {
            width = derived_width;
        } else if orig_h < orig_w {
            height = derived_height;
        }

        // The derived axis can overshoot the other bound (e.g. a tall image
        // with both bounds set); pull it back in proportionally.
        if let Some(m) = max_height.filter(|&m| height > m) {
            width *= m / height;
            height = m;
        }
        if let Some(m) = max_width.filter(|&m| width > m) {
            height *= m / width;
            width = m;
        }
    }

    (to_pixels(width), to_pixels(height))
}

/// Truncate toward zero, never returning an empty axis.
fn to_pixels(value: f64) -> u32 {
    (value as u32).max(1)
}
