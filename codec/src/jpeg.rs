//! JPEG probing, decoding and encoding.

use std::io::Write;

use image::ImageFormat;
use image::codecs::jpeg::JpegEncoder;
use log::debug;

use crate::{Bitmap, CodecError, Dimensions};

/// Highest JPEG quality setting.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Whether the bytes start like a JPEG stream.
#[must_use]
pub fn is_jpeg(bytes: &[u8]) -> bool {
    matches!(image::guess_format(bytes), Ok(ImageFormat::Jpeg))
}

/// Decode `bytes` strictly as JPEG into a working bitmap no larger than
/// `canvas`.
///
/// # Errors
/// Returns [`CodecError::UnsupportedSourceFormat`] if the bytes are not a
/// decodable JPEG stream.
pub fn try_decode_jpeg(bytes: &[u8], canvas: Dimensions) -> Result<Bitmap, CodecError> {
    if !is_jpeg(bytes) {
        return Err(CodecError::UnsupportedSourceFormat(
            "not a JPEG stream".into(),
        ));
    }
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .map_err(|e| CodecError::UnsupportedSourceFormat(e.to_string()))?;

    let bitmap = Bitmap::new(image);
    let native = bitmap.dimensions();
    if !native.fits_within(canvas) {
        debug!(
            "JPEG {}x{} exceeds the {}x{} working canvas, scaling down",
            native.width, native.height, canvas.width, canvas.height
        );
    }
    Ok(bitmap.fit_within(canvas))
}

/// Decode any supported image container at its native size.
///
/// # Errors
/// Returns [`CodecError::UnsupportedSourceFormat`] if the format is unknown
/// or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<Bitmap, CodecError> {
    image::load_from_memory(bytes)
        .map(Bitmap::new)
        .map_err(|e| CodecError::UnsupportedSourceFormat(e.to_string()))
}

/// Encode a bitmap as baseline JPEG at `quality` (clamped to 1..=100).
///
/// Alpha is dropped; JPEG has no transparency.
///
/// # Errors
/// Returns [`CodecError::EncodingFailed`] if encoding or writing fails.
pub fn encode_jpeg<W: Write>(bitmap: &Bitmap, quality: u8, out: W) -> Result<(), CodecError> {
    let quality = quality.clamp(1, MAX_JPEG_QUALITY);
    let rgb = bitmap.to_rgb8();
    JpegEncoder::new_with_quality(out, quality)
        .encode_image(&rgb)
        .map_err(|e| CodecError::EncodingFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::io::Cursor;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    fn encoded(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    const CANVAS: Dimensions = Dimensions::new(3552, 2448);

    #[test]
    fn jpeg_decodes_strictly() {
        let bytes = encoded(&gradient(64, 48), ImageFormat::Jpeg);
        assert!(is_jpeg(&bytes));
        let bitmap = try_decode_jpeg(&bytes, CANVAS).unwrap();
        assert_eq!(bitmap.dimensions(), Dimensions::new(64, 48));
    }

    #[test]
    fn png_is_not_jpeg() {
        let bytes = encoded(&gradient(64, 48), ImageFormat::Png);
        assert!(!is_jpeg(&bytes));
        assert!(matches!(
            try_decode_jpeg(&bytes, CANVAS),
            Err(CodecError::UnsupportedSourceFormat(_))
        ));
        assert_eq!(decode(&bytes).unwrap().dimensions(), Dimensions::new(64, 48));
    }

    #[test]
    fn truncated_jpeg_fails() {
        let bytes = encoded(&gradient(64, 48), ImageFormat::Jpeg);
        assert!(try_decode_jpeg(&bytes[..32], CANVAS).is_err());
    }

    #[test]
    fn garbage_fails_both_decoders() {
        let bytes = b"definitely not an image";
        assert!(try_decode_jpeg(bytes, CANVAS).is_err());
        assert!(matches!(
            decode(bytes),
            Err(CodecError::UnsupportedSourceFormat(_))
        ));
    }

    #[test]
    fn oversized_jpeg_scaled_to_canvas() {
        let bytes = encoded(&gradient(200, 100), ImageFormat::Jpeg);
        let bitmap = try_decode_jpeg(&bytes, Dimensions::new(100, 100)).unwrap();
        assert_eq!(bitmap.dimensions(), Dimensions::new(100, 50));
    }

    #[test]
    fn encode_keeps_dimensions_and_drops_alpha() {
        let rgba = DynamicImage::new_rgba8(30, 20);
        let mut out = Vec::new();
        encode_jpeg(&Bitmap::new(rgba), MAX_JPEG_QUALITY, &mut out).unwrap();
        assert!(is_jpeg(&out));
        let decoded = decode(&out).unwrap();
        assert_eq!(decoded.dimensions(), Dimensions::new(30, 20));
    }

    #[test]
    fn quality_is_clamped() {
        let bitmap = Bitmap::new(gradient(16, 16));
        let mut zero = Vec::new();
        let mut one = Vec::new();
        encode_jpeg(&bitmap, 0, &mut zero).unwrap();
        encode_jpeg(&bitmap, 1, &mut one).unwrap();
        assert_eq!(zero, one);
    }
}
