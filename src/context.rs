use viewfinder_camera::PhotoBuffer;

/// The current photo: a full JPEG stream and its thumbnail.
///
/// One context lives for the whole controller session. Captures and imports
/// reset it before writing; readers get clones of the buffer handles.
#[derive(Debug, Clone, Default)]
pub struct PhotoContext {
    image: PhotoBuffer,
    thumbnail: PhotoBuffer,
}

impl PhotoContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The full-image JPEG stream.
    #[must_use]
    pub const fn image(&self) -> &PhotoBuffer {
        &self.image
    }

    /// The thumbnail stream. Imports leave it empty.
    #[must_use]
    pub const fn thumbnail(&self) -> &PhotoBuffer {
        &self.thumbnail
    }

    /// Truncate both buffers and move them back to the start.
    pub fn reset(&self) {
        self.image.reset();
        self.thumbnail.reset();
    }

    /// Move both buffers back to the start for reading.
    pub fn rewind(&self) {
        self.image.rewind();
        self.thumbnail.rewind();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn clones_share_buffers() {
        let context = PhotoContext::new();
        let reader = context.clone();
        context.image().clone().write_all(b"jpeg").unwrap();
        assert_eq!(reader.image().to_vec(), b"jpeg");

        context.reset();
        assert!(reader.image().is_empty());
        assert_eq!(reader.image().position(), 0);
    }
}
