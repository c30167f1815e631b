use std::fmt;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};

use crate::Dimensions;

/// A decoded image.
#[derive(Clone)]
pub struct Bitmap {
    image: DynamicImage,
}

impl Bitmap {
    /// Wrap a decoded image.
    #[must_use]
    pub const fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Pixel dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        let (width, height) = self.image.dimensions();
        Dimensions::new(width, height)
    }

    /// The pixels as 8-bit RGB, dropping any alpha channel.
    #[must_use]
    pub fn to_rgb8(&self) -> RgbImage {
        self.image.to_rgb8()
    }

    /// Scale down, keeping the aspect ratio, so the bitmap fits `canvas`.
    /// Bitmaps that already fit are returned unchanged.
    #[must_use]
    pub fn fit_within(self, canvas: Dimensions) -> Self {
        if self.dimensions().fits_within(canvas) {
            return self;
        }
        Self {
            image: self
                .image
                .resize(canvas.width, canvas.height, FilterType::Triangle),
        }
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("dimensions", &self.dimensions())
            .field("color", &self.image.color())
            .finish_non_exhaustive()
    }
}
