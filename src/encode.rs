//! Re-encoding captured rasters to compressed WebP.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::webp::{WebPEncoder, WebPQuality};
use thiserror::Error;

pub const DEFAULT_WEBP_QUALITY: u8 = 80;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Image re-encode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Failed to write WebP: {0}")]
    Write(#[from] std::io::Error),
}

/// Re-encode the raster at `source` as lossy WebP at `quality` (1-100),
/// writing to `target`. The source file is left in place.
pub fn encode_webp(source: &Path, target: &Path, quality: u8) -> Result<(), EncodeError> {
    if !source.exists() {
        return Err(EncodeError::NotFound(source.display().to_string()));
    }
    let rgba = image::open(source)?.to_rgba8();

    let writer = BufWriter::new(File::create(target)?);
    #[allow(deprecated)]
    let encoder = WebPEncoder::new_with_quality(writer, WebPQuality::lossy(quality));
    encoder.encode(
        rgba.as_raw(),
        rgba.width(),
        rgba.height(),
        image::ColorType::Rgba8,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbaImage};
    use tempfile::TempDir;

    #[test]
    fn encodes_png_to_webp_preserving_dimensions() {
        let dir = TempDir::new().expect("tempdir");
        let source = dir.path().join("shot.png");
        let target = dir.path().join("shot.webp");

        let img = RgbaImage::from_pixel(12, 7, image::Rgba([40, 90, 200, 255]));
        img.save(&source).expect("write source png");

        encode_webp(&source, &target, 80).expect("encode webp");

        assert!(target.exists());
        let decoded = image::open(&target).expect("decode webp");
        assert_eq!(decoded.dimensions(), (12, 7));
    }

    #[test]
    fn source_survives_encoding() {
        let dir = TempDir::new().expect("tempdir");
        let source = dir.path().join("shot.png");
        let target = dir.path().join("shot.webp");
        RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255]))
            .save(&source)
            .expect("write source png");

        encode_webp(&source, &target, 50).expect("encode webp");
        assert!(source.exists(), "encode must not consume the source");
    }

    #[test]
    fn missing_source_is_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let result = encode_webp(
            &dir.path().join("absent.png"),
            &dir.path().join("out.webp"),
            80,
        );
        assert!(matches!(result, Err(EncodeError::NotFound(_))));
    }

    #[test]
    fn unreadable_source_is_a_decode_error() {
        let dir = TempDir::new().expect("tempdir");
        let source = dir.path().join("junk.png");
        std::fs::write(&source, b"not an image").expect("write junk");
        let result = encode_webp(&source, &dir.path().join("out.webp"), 80);
        assert!(matches!(result, Err(EncodeError::Decode(_))));
    }
}
