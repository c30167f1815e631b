//! Capture sequences: planned frames with their output sinks.

use crate::{CameraError, PhotoBuffer};

/// One frame of a capture sequence.
#[derive(Debug, Clone, Default)]
pub struct CaptureFrame {
    capture_stream: Option<PhotoBuffer>,
    thumbnail_stream: Option<PhotoBuffer>,
}

impl CaptureFrame {
    /// Bind the full-image and thumbnail sinks.
    pub fn bind(&mut self, capture: PhotoBuffer, thumbnail: PhotoBuffer) {
        self.capture_stream = Some(capture);
        self.thumbnail_stream = Some(thumbnail);
    }

    /// Sink for the full-resolution JPEG.
    #[must_use]
    pub const fn capture_stream(&self) -> Option<&PhotoBuffer> {
        self.capture_stream.as_ref()
    }

    /// Sink for the thumbnail JPEG.
    #[must_use]
    pub const fn thumbnail_stream(&self) -> Option<&PhotoBuffer> {
        self.thumbnail_stream.as_ref()
    }

    /// Whether both sinks are bound.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.capture_stream.is_some() && self.thumbnail_stream.is_some()
    }
}

/// A plan of frames to capture in one shot.
#[derive(Debug, Clone)]
pub struct CaptureSequence {
    frames: Vec<CaptureFrame>,
    prepared_for: Option<u64>,
}

impl CaptureSequence {
    /// Allocate `frame_count` unbound frames.
    ///
    /// # Errors
    /// Returns [`CameraError::InvalidSequence`] for a zero frame count.
    pub fn new(frame_count: usize) -> Result<Self, CameraError> {
        if frame_count == 0 {
            return Err(CameraError::InvalidSequence(
                "a sequence needs at least one frame".into(),
            ));
        }
        Ok(Self {
            frames: vec![CaptureFrame::default(); frame_count],
            prepared_for: None,
        })
    }

    /// The planned frames.
    #[must_use]
    pub fn frames(&self) -> &[CaptureFrame] {
        &self.frames
    }

    /// Mutable access to a frame, for binding sinks.
    pub fn frame_mut(&mut self, index: usize) -> Option<&mut CaptureFrame> {
        self.frames.get_mut(index)
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false; sequences hold at least one frame.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Whether every frame has both sinks bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.frames.iter().all(CaptureFrame::is_bound)
    }

    pub(crate) fn mark_prepared(&mut self, epoch: u64) {
        self.prepared_for = Some(epoch);
    }

    pub(crate) const fn prepared_for(&self) -> Option<u64> {
        self.prepared_for
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_frames_rejected() {
        assert!(matches!(
            CaptureSequence::new(0),
            Err(CameraError::InvalidSequence(_))
        ));
    }

    #[test]
    fn bound_only_when_every_frame_has_sinks() {
        let mut sequence = CaptureSequence::new(2).unwrap();
        assert!(!sequence.is_bound());
        sequence
            .frame_mut(0)
            .unwrap()
            .bind(PhotoBuffer::new(), PhotoBuffer::new());
        assert!(!sequence.is_bound());
        sequence
            .frame_mut(1)
            .unwrap()
            .bind(PhotoBuffer::new(), PhotoBuffer::new());
        assert!(sequence.is_bound());
        assert_eq!(sequence.len(), 2);
    }
}
