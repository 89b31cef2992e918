//! Shared test utilities for the pickscale test suite.
//!
//! Synthetic fixtures only: every image is generated on the fly with the
//! `image` encoders, so tests need no checked-in binaries.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let path = tmp.path().join("photo.jpg");
//! write_jpeg_with_exif(&path, 640, 480, &tiff_with_orientation(6));
//! ```

use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, Frame, ImageEncoder, ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;
use std::path::Path;

// =========================================================================
// In-memory encoders
// =========================================================================

fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

fn gradient_rgba(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 200, ((x + y) % 256) as u8])
    })
}

/// Encode an opaque gradient as JPEG bytes.
pub fn encode_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = gradient_rgb(width, height);
    let mut buf = Vec::new();
    JpegEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// Encode a translucent gradient as PNG bytes.
pub fn encode_png(width: u32, height: u32) -> Vec<u8> {
    let img = gradient_rgba(width, height);
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgba8)
        .unwrap();
    buf
}

/// Minimal little-endian TIFF block with a single IFD0 Orientation entry.
pub fn tiff_with_orientation(orientation: u16) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes()); // IFD0 offset
    tiff.extend_from_slice(&1u16.to_le_bytes()); // entry count
    tiff.extend_from_slice(&0x0112u16.to_le_bytes()); // Orientation
    tiff.extend_from_slice(&3u16.to_le_bytes()); // SHORT
    tiff.extend_from_slice(&1u32.to_le_bytes()); // count
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]); // value padding
    tiff.extend_from_slice(&0u32.to_le_bytes()); // no next IFD
    tiff
}

// =========================================================================
// File fixtures
// =========================================================================

pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::write(path, encode_jpeg(width, height)).unwrap();
}

pub fn write_rgba_png(path: &Path, width: u32, height: u32) {
    std::fs::write(path, encode_png(width, height)).unwrap();
}

pub fn write_jpeg_with_exif(path: &Path, width: u32, height: u32, tiff: &[u8]) {
    let mut jpeg = encode_jpeg(width, height);
    assert!(crate::imaging::exif::embed_exif(&mut jpeg, tiff));
    std::fs::write(path, jpeg).unwrap();
}

/// Lossless WebP; the `image` encoder never writes animation.
pub fn write_webp(path: &Path, width: u32, height: u32) {
    DynamicImage::ImageRgb8(gradient_rgb(width, height))
        .save_with_format(path, ImageFormat::WebP)
        .unwrap();
}

/// GIF with `frames` frames; more than one makes it animated.
pub fn write_gif(path: &Path, frames: usize) {
    let file = std::fs::File::create(path).unwrap();
    let mut encoder = GifEncoder::new(file);
    let frames: Vec<Frame> = (0..frames)
        .map(|i| {
            let mut img = gradient_rgba(16, 16);
            img.put_pixel(0, 0, image::Rgba([i as u8 * 40, 0, 0, 255]));
            Frame::new(img)
        })
        .collect();
    encoder.encode_frames(frames).unwrap();
}

/// A PNG cut off a few bytes past IHDR: the header parses, the pixels do not.
pub fn write_truncated_png(path: &Path, width: u32, height: u32) {
    let png = encode_png(width, height);
    // Signature (8) + IHDR chunk (25) + 10 bytes of the next chunk
    std::fs::write(path, &png[..8 + 25 + 10]).unwrap();
}

fn le24(value: u32) -> [u8; 3] {
    let b = value.to_le_bytes();
    [b[0], b[1], b[2]]
}

/// Extended WebP with the VP8X animation flag, an ANIM chunk, and a single
/// ANMF frame wrapping a real lossless bitstream.
pub fn write_animated_webp(path: &Path, width: u32, height: u32) {
    let mut still = Vec::new();
    DynamicImage::ImageRgb8(gradient_rgb(width, height))
        .write_to(&mut Cursor::new(&mut still), ImageFormat::WebP)
        .unwrap();
    let vp8l_at = still.windows(4).position(|w| w == b"VP8L").unwrap();
    let frame_chunk = &still[vp8l_at..];

    let mut vp8x = vec![0x02, 0, 0, 0]; // animation flag
    vp8x.extend_from_slice(&le24(width - 1));
    vp8x.extend_from_slice(&le24(height - 1));

    let anim = [0u8, 0, 0, 0, 0, 0]; // background colour, loop forever

    let mut anmf = Vec::new();
    anmf.extend_from_slice(&le24(0)); // x offset
    anmf.extend_from_slice(&le24(0)); // y offset
    anmf.extend_from_slice(&le24(width - 1));
    anmf.extend_from_slice(&le24(height - 1));
    anmf.extend_from_slice(&le24(100)); // duration, ms
    anmf.push(0);
    anmf.extend_from_slice(frame_chunk);

    let mut body = b"WEBP".to_vec();
    for (fourcc, data) in [(b"VP8X", &vp8x[..]), (b"ANIM", &anim[..]), (b"ANMF", &anmf[..])] {
        body.extend_from_slice(fourcc);
        body.extend_from_slice(&(data.len() as u32).to_le_bytes());
        body.extend_from_slice(data);
        if data.len() % 2 == 1 {
            body.push(0);
        }
    }

    let mut riff = b"RIFF".to_vec();
    riff.extend_from_slice(&(body.len() as u32).to_le_bytes());
    riff.extend_from_slice(&body);
    std::fs::write(path, riff).unwrap();
}

/// A PNG whose header carries an `acTL` chunk, which is all it takes to be APNG.
pub fn write_apng_header(path: &Path, width: u32, height: u32) {
    let png = encode_png(width, height);
    // Signature (8) + IHDR chunk (4 + 4 + 13 + 4)
    let ihdr_end = 8 + 25;
    let mut actl = Vec::new();
    actl.extend_from_slice(&1u32.to_be_bytes()); // num_frames
    actl.extend_from_slice(&0u32.to_be_bytes()); // num_plays

    let mut out = png[..ihdr_end].to_vec();
    crate::imaging::exif::write_png_chunk(&mut out, b"acTL", &actl);
    out.extend_from_slice(&png[ihdr_end..]);
    std::fs::write(path, out).unwrap();
}
