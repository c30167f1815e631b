//! Normalization of externally chosen photos into the photo context.

use std::io::{Read, Write};

use log::{debug, info, warn};
use viewfinder_codec::{self as codec, CodecError, Dimensions};

use crate::{ControllerConfig, PhotoContext, Result};

/// How an imported photo reached the image buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPath {
    /// The source was JPEG and was copied byte for byte.
    Verbatim,
    /// The source was another container and was re-encoded as JPEG.
    Transcoded,
}

/// Summary of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    /// Which path produced the image buffer.
    pub path: ImportPath,
    /// Size of the working bitmap the source decoded to.
    pub dimensions: Dimensions,
    /// Length of the JPEG stream now in the image buffer.
    pub bytes: usize,
}

/// Turns arbitrary image bytes into a JPEG stream in a [`PhotoContext`].
///
/// Imports never write a thumbnail; the thumbnail buffer is left empty.
#[derive(Debug, Clone, Copy)]
pub struct PhotoImporter {
    canvas: Dimensions,
    quality: u8,
}

impl PhotoImporter {
    /// Create an importer decoding JPEGs into `canvas` and transcoding other
    /// formats at `quality`.
    #[must_use]
    pub const fn new(canvas: Dimensions, quality: u8) -> Self {
        Self { canvas, quality }
    }

    /// Create an importer from controller settings.
    #[must_use]
    pub const fn from_config(config: &ControllerConfig) -> Self {
        Self::new(config.canvas_dimensions(), config.import_quality)
    }

    /// Import `source` into the context's image buffer.
    ///
    /// On success the buffer holds a JPEG stream positioned at its start.
    /// On failure both buffers are left empty.
    ///
    /// # Errors
    /// Returns [`CodecError::UnsupportedSourceFormat`] (wrapped in
    /// [`crate::Error`]) if the source decodes neither as JPEG nor as any
    /// other supported format.
    pub fn import(&self, source: &[u8], context: &PhotoContext) -> Result<ImportReport> {
        context.reset();
        match self.write_normalized(source, context) {
            Ok(report) => {
                context.rewind();
                info!(
                    "imported {}x{} photo ({:?}, {} bytes)",
                    report.dimensions.width, report.dimensions.height, report.path, report.bytes
                );
                Ok(report)
            }
            Err(e) => {
                context.reset();
                warn!("photo import failed: {e}");
                Err(e)
            }
        }
    }

    /// Read `reader` to the end and import the bytes.
    ///
    /// # Errors
    /// Fails if reading fails or as [`Self::import`] does.
    pub fn import_reader<R: Read>(&self, mut reader: R, context: &PhotoContext) -> Result<ImportReport> {
        let mut source = Vec::new();
        reader.read_to_end(&mut source)?;
        self.import(&source, context)
    }

    fn write_normalized(&self, source: &[u8], context: &PhotoContext) -> Result<ImportReport> {
        let mut sink = context.image().clone();
        match codec::try_decode_jpeg(source, self.canvas) {
            Ok(bitmap) => {
                sink.write_all(source)?;
                Ok(ImportReport {
                    path: ImportPath::Verbatim,
                    dimensions: bitmap.dimensions(),
                    bytes: source.len(),
                })
            }
            Err(CodecError::UnsupportedSourceFormat(reason)) => {
                debug!("not a JPEG source ({reason}), transcoding");
                let bitmap = codec::decode(source)?;
                codec::encode_jpeg(&bitmap, self.quality, &mut sink)?;
                Ok(ImportReport {
                    path: ImportPath::Transcoded,
                    dimensions: bitmap.dimensions(),
                    bytes: context.image().len(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 64])
        }));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn importer() -> PhotoImporter {
        PhotoImporter::from_config(&ControllerConfig::default())
    }

    #[test]
    fn jpeg_copied_verbatim() {
        let context = PhotoContext::new();
        let source = encoded(120, 90, ImageFormat::Jpeg);
        let report = importer().import(&source, &context).unwrap();
        assert_eq!(report.path, ImportPath::Verbatim);
        assert_eq!(report.dimensions, Dimensions::new(120, 90));
        assert_eq!(context.image().to_vec(), source);
        assert_eq!(context.image().position(), 0);
        assert!(context.thumbnail().is_empty());
    }

    #[test]
    fn png_transcoded_at_native_size() {
        let context = PhotoContext::new();
        let source = encoded(1024, 768, ImageFormat::Png);
        let report = importer().import(&source, &context).unwrap();
        assert_eq!(report.path, ImportPath::Transcoded);
        assert_eq!(report.dimensions, Dimensions::new(1024, 768));

        let jpeg = context.image().to_vec();
        assert!(codec::is_jpeg(&jpeg));
        assert_eq!(report.bytes, jpeg.len());
        assert_eq!(
            codec::decode(&jpeg).unwrap().dimensions(),
            Dimensions::new(1024, 768)
        );
    }

    #[test]
    fn smaller_photo_leaves_no_trailing_bytes() {
        let context = PhotoContext::new();
        importer()
            .import(&encoded(400, 300, ImageFormat::Jpeg), &context)
            .unwrap();
        let small = encoded(8, 6, ImageFormat::Jpeg);
        importer().import(&small, &context).unwrap();
        assert_eq!(context.image().to_vec(), small);
    }

    #[test]
    fn garbage_leaves_buffers_empty() {
        let context = PhotoContext::new();
        importer()
            .import(&encoded(16, 16, ImageFormat::Jpeg), &context)
            .unwrap();

        let err = importer().import(b"not a photo", &context).unwrap_err();
        assert!(matches!(
            err,
            Error::Codec(CodecError::UnsupportedSourceFormat(_))
        ));
        assert!(context.image().is_empty());
        assert!(context.thumbnail().is_empty());
    }

    #[test]
    fn reader_source() {
        let context = PhotoContext::new();
        let source = encoded(32, 24, ImageFormat::Png);
        let report = importer()
            .import_reader(Cursor::new(source), &context)
            .unwrap();
        assert_eq!(report.path, ImportPath::Transcoded);
    }
}
