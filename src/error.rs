use thiserror::Error;
use viewfinder_camera::CameraError;
use viewfinder_codec::CodecError;

/// Errors reported by the viewfinder controller.
#[derive(Debug, Error)]
pub enum Error {
    /// A camera device operation failed.
    #[error(transparent)]
    Camera(#[from] CameraError),
    /// A photo could not be decoded or encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// Reading a photo source failed.
    #[error("failed to read photo source: {0}")]
    Io(#[from] std::io::Error),
    /// A capture is writing the photo buffers.
    #[error("a capture is in progress")]
    CaptureInProgress,
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, Error>;
