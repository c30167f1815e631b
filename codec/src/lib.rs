//! Still image codec support.
//!
//! Photos enter a viewfinder pipeline either straight from the camera, as
//! JPEG, or from the photo library in whatever container the user picked.
//! This crate provides the pieces needed to normalize the latter: format
//! probing, a strict JPEG decode, a generic decode, and JPEG encoding.

#![warn(missing_docs)]

mod bitmap;
mod jpeg;

use thiserror::Error;

pub use bitmap::Bitmap;
pub use jpeg::{MAX_JPEG_QUALITY, decode, encode_jpeg, is_jpeg, try_decode_jpeg};

/// Common error type for codec operations.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The bytes are not an image this crate can decode.
    #[error("unsupported source format: {0}")]
    UnsupportedSourceFormat(String),
    /// Encoding failed.
    #[error("encoding failed: {0}")]
    EncodingFailed(String),
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether `self` fits inside `bounds` without scaling.
    #[must_use]
    pub const fn fits_within(self, bounds: Self) -> bool {
        self.width <= bounds.width && self.height <= bounds.height
    }
}
