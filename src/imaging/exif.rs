//! EXIF transfer between image files.
//!
//! Reading goes through `kamadak-exif`, which understands every container we
//! can decode (JPEG, PNG, TIFF, WebP). The result is the raw TIFF-structured
//! block, so it can be re-embedded byte for byte:
//!
//! - JPEG: APP1 marker (0xFFE1) with an `Exif\0\0` header, placed after the
//!   leading APP0/JFIF segment. An existing EXIF APP1 is replaced.
//! - PNG: `eXIf` chunk holding the bare TIFF block, placed before the first
//!   `IDAT`. An existing `eXIf` chunk is replaced.
//!
//! Anything else is left untouched.
//!
//! A TIFF source is its own EXIF container, so `kamadak-exif` hands back the
//! whole file, pixels included. For those the primary IFD is re-serialized
//! with `exif::experimental::Writer`, minus the tags that describe the
//! source's own pixel layout.

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;
use tracing::{debug, warn};

const EXIF_HEADER: &[u8] = b"Exif\0\0";
const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

/// Read the raw EXIF (TIFF) block from an image file.
///
/// Returns `Ok(None)` when the file carries no EXIF or it cannot be parsed;
/// only failing to open the file is an error.
pub fn read_exif(path: &Path) -> std::io::Result<Option<Vec<u8>>> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    match ::exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) if exif.buf().len() as u64 == file_len => rebuild_primary_ifd(path, &exif),
        Ok(exif) => Ok(Some(exif.buf().to_vec())),
        Err(::exif::Error::NotFound(_)) => {
            debug!("No EXIF in {}", path.display());
            Ok(None)
        }
        Err(::exif::Error::Io(e)) => Err(e),
        Err(e) => {
            warn!("Ignoring unreadable EXIF in {}: {e}", path.display());
            Ok(None)
        }
    }
}

/// Tags that only describe the pixel layout of the file they came from.
const IMAGE_STRUCTURE_TAGS: &[::exif::Tag] = &[
    ::exif::Tag::ImageWidth,
    ::exif::Tag::ImageLength,
    ::exif::Tag::BitsPerSample,
    ::exif::Tag::Compression,
    ::exif::Tag::PhotometricInterpretation,
    ::exif::Tag::StripOffsets,
    ::exif::Tag::SamplesPerPixel,
    ::exif::Tag::RowsPerStrip,
    ::exif::Tag::StripByteCounts,
    ::exif::Tag::PlanarConfiguration,
];

fn rebuild_primary_ifd(path: &Path, exif: &::exif::Exif) -> std::io::Result<Option<Vec<u8>>> {
    let mut writer = ::exif::experimental::Writer::new();
    let mut pushed = 0;
    for field in exif.fields() {
        if field.ifd_num == ::exif::In::PRIMARY && !IMAGE_STRUCTURE_TAGS.contains(&field.tag) {
            writer.push_field(field);
            pushed += 1;
        }
    }
    if pushed == 0 {
        debug!("No EXIF beyond pixel layout in {}", path.display());
        return Ok(None);
    }

    let mut buf = Cursor::new(Vec::new());
    match writer.write(&mut buf, exif.little_endian()) {
        Ok(()) => Ok(Some(buf.into_inner())),
        Err(e) => {
            warn!("Cannot re-serialize EXIF from {}: {e}", path.display());
            Ok(None)
        }
    }
}

/// Embed a raw EXIF block into an encoded image, dispatching on its magic bytes.
///
/// Returns whether the block was embedded.
pub fn embed_exif(encoded: &mut Vec<u8>, tiff: &[u8]) -> bool {
    if encoded.starts_with(&[0xFF, 0xD8]) {
        insert_jpeg_app1(encoded, tiff)
    } else if encoded.starts_with(PNG_SIGNATURE) {
        insert_png_exif_chunk(encoded, tiff)
    } else {
        false
    }
}

// ---------------------------------------------------------------------------
// JPEG: APP1 segment
// ---------------------------------------------------------------------------

/// Walk the marker segments between SOI and SOS.
///
/// Yields `(marker, start, end)` with `start` at the 0xFF byte and `end`
/// one past the segment payload.
fn jpeg_segments(data: &[u8]) -> Vec<(u8, usize, usize)> {
    let mut segments = Vec::new();
    let mut pos = 2;
    while pos + 4 <= data.len() && data[pos] == 0xFF {
        let marker = data[pos + 1];
        // SOS (0xDA) means entropy-coded data starts here
        if marker == 0xDA {
            break;
        }
        // Markers without length field
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            pos += 2;
            continue;
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if len < 2 || pos + 2 + len > data.len() {
            break;
        }
        segments.push((marker, pos, pos + 2 + len));
        pos += 2 + len;
    }
    segments
}

fn insert_jpeg_app1(jpeg: &mut Vec<u8>, tiff: &[u8]) -> bool {
    let payload_len = EXIF_HEADER.len() + tiff.len();
    if payload_len + 2 > u16::MAX as usize {
        warn!(
            "Skipping EXIF: {} bytes do not fit in a JPEG segment",
            tiff.len()
        );
        return false;
    }

    // Drop an existing EXIF APP1 (XMP also lives in APP1, keep that)
    let existing = jpeg_segments(jpeg)
        .into_iter()
        .find(|&(marker, start, end)| {
            marker == 0xE1 && jpeg[start + 4..end].starts_with(EXIF_HEADER)
        });
    if let Some((_, start, end)) = existing {
        jpeg.drain(start..end);
    }

    // JFIF requires APP0 to come first
    let insert_pos = jpeg_segments(jpeg)
        .into_iter()
        .take_while(|&(marker, _, _)| marker == 0xE0)
        .last()
        .map_or(2, |(_, _, end)| end);

    let mut segment = Vec::with_capacity(payload_len + 4);
    segment.extend_from_slice(&[0xFF, 0xE1]);
    segment.extend_from_slice(&((payload_len + 2) as u16).to_be_bytes());
    segment.extend_from_slice(EXIF_HEADER);
    segment.extend_from_slice(tiff);
    jpeg.splice(insert_pos..insert_pos, segment);
    true
}

// ---------------------------------------------------------------------------
// PNG: eXIf chunk
// ---------------------------------------------------------------------------

fn insert_png_exif_chunk(png: &mut Vec<u8>, tiff: &[u8]) -> bool {
    if tiff.len() > i32::MAX as usize {
        return false;
    }

    let mut out = Vec::with_capacity(png.len() + tiff.len() + 12);
    out.extend_from_slice(PNG_SIGNATURE);

    let mut pos = PNG_SIGNATURE.len();
    let mut inserted = false;
    while pos + 12 <= png.len() {
        let chunk_len =
            u32::from_be_bytes([png[pos], png[pos + 1], png[pos + 2], png[pos + 3]]) as usize;
        let chunk_type = &png[pos + 4..pos + 8];
        let chunk_end = pos + 12 + chunk_len; // length + type + data + CRC
        if chunk_end > png.len() {
            return false;
        }

        if chunk_type == b"IDAT" && !inserted {
            write_png_chunk(&mut out, b"eXIf", tiff);
            inserted = true;
        }
        if chunk_type != b"eXIf" {
            out.extend_from_slice(&png[pos..chunk_end]);
        }
        pos = chunk_end;
    }

    if inserted {
        *png = out;
    }
    inserted
}

pub(crate) fn write_png_chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);
    out.extend_from_slice(&png_crc(chunk_type, data).to_be_bytes());
}

/// CRC-32 (ISO-HDLC) over chunk type and data, as PNG requires.
fn png_crc(chunk_type: &[u8], data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in chunk_type.iter().chain(data) {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
        }
    }
    crc ^ 0xFFFF_FFFF
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{encode_jpeg, encode_png, tiff_with_orientation};

    fn orientation_of(encoded: &[u8]) -> Option<u32> {
        let exif = ::exif::Reader::new()
            .read_from_container(&mut Cursor::new(encoded))
            .ok()?;
        exif.get_field(::exif::Tag::Orientation, ::exif::In::PRIMARY)?
            .value
            .get_uint(0)
    }

    #[test]
    fn png_crc_matches_known_iend() {
        assert_eq!(png_crc(b"IEND", &[]), 0xAE42_6082);
    }

    #[test]
    fn embeds_into_jpeg_after_jfif() {
        let mut jpeg = encode_jpeg(16, 16);
        let tiff = tiff_with_orientation(6);

        assert!(embed_exif(&mut jpeg, &tiff));
        assert_eq!(orientation_of(&jpeg), Some(6));

        let segments = jpeg_segments(&jpeg);
        let app1 = segments.iter().position(|s| s.0 == 0xE1).unwrap();
        assert!(segments[..app1].iter().all(|s| s.0 == 0xE0));
        image::load_from_memory(&jpeg).unwrap();
    }

    #[test]
    fn replaces_existing_jpeg_exif() {
        let mut jpeg = encode_jpeg(8, 8);
        assert!(embed_exif(&mut jpeg, &tiff_with_orientation(3)));
        assert!(embed_exif(&mut jpeg, &tiff_with_orientation(8)));

        let app1_count = jpeg_segments(&jpeg)
            .iter()
            .filter(|s| s.0 == 0xE1)
            .count();
        assert_eq!(app1_count, 1);
        assert_eq!(orientation_of(&jpeg), Some(8));
    }

    #[test]
    fn oversized_exif_is_skipped_for_jpeg() {
        let mut jpeg = encode_jpeg(8, 8);
        let before = jpeg.clone();
        assert!(!embed_exif(&mut jpeg, &vec![0u8; 70_000]));
        assert_eq!(jpeg, before);
    }

    #[test]
    fn embeds_png_chunk_before_idat() {
        let mut png = encode_png(8, 8);
        let tiff = tiff_with_orientation(6);
        assert!(embed_exif(&mut png, &tiff));

        let exif_at = png.windows(4).position(|w| w == b"eXIf").unwrap();
        let idat_at = png.windows(4).position(|w| w == b"IDAT").unwrap();
        assert!(exif_at < idat_at);
        assert_eq!(&png[exif_at + 4..exif_at + 4 + tiff.len()], &tiff[..]);

        // Decoder validates chunk CRCs
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!(img.width(), 8);
    }

    #[test]
    fn replaces_existing_png_chunk() {
        let mut png = encode_png(8, 8);
        assert!(embed_exif(&mut png, &tiff_with_orientation(3)));
        assert!(embed_exif(&mut png, &tiff_with_orientation(8)));
        assert_eq!(png.windows(4).filter(|w| *w == b"eXIf").count(), 1);
    }

    #[test]
    fn unknown_container_is_untouched() {
        let mut data = b"GIF89a....".to_vec();
        assert!(!embed_exif(&mut data, &tiff_with_orientation(1)));
        assert_eq!(data, b"GIF89a....");
    }

    #[test]
    fn read_exif_returns_tiff_block() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("tagged.jpg");
        let tiff = tiff_with_orientation(6);
        let mut jpeg = encode_jpeg(8, 8);
        embed_exif(&mut jpeg, &tiff);
        std::fs::write(&path, &jpeg).unwrap();

        assert_eq!(read_exif(&path).unwrap(), Some(tiff));
    }

    #[test]
    fn read_exif_from_tiff_leaves_pixels_behind() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("scan.tif");
        let mut tiff_file = tiff_with_orientation(6);
        tiff_file.extend_from_slice(&vec![0x7F; 70_000]);
        std::fs::write(&path, &tiff_file).unwrap();

        let block = read_exif(&path).unwrap().unwrap();
        assert!(block.len() < 1024, "block is {} bytes", block.len());

        let mut jpeg = encode_jpeg(8, 8);
        assert!(embed_exif(&mut jpeg, &block));
        assert_eq!(orientation_of(&jpeg), Some(6));
    }

    #[test]
    fn read_exif_without_metadata_is_none() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("plain.jpg");
        std::fs::write(&path, encode_jpeg(8, 8)).unwrap();

        assert_eq!(read_exif(&path).unwrap(), None);
    }

    #[test]
    fn read_exif_missing_file_errors() {
        assert!(read_exif(Path::new("/nonexistent/image.jpg")).is_err());
    }
}
