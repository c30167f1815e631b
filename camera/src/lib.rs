//! Camera device session and still capture.
//!
//! This crate owns everything that touches the physical camera: the
//! [`DeviceSession`] that holds the single open device handle, the
//! [`CaptureSequence`] plans that bind output sinks to frames, and the
//! capture [resolution selector](select_capture_resolution).
//!
//! Platform backends implement [`CameraDriver`] and [`DeviceHandle`]. The
//! `mock` feature provides an in-memory driver for tests, the `nokhwa`
//! feature a desktop webcam driver.

#![warn(missing_docs)]
// Device futures resume on the caller's flow and are never sent across threads.
#![allow(clippy::future_not_send)]

mod buffer;
mod driver;
mod selector;
mod sequence;
mod session;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

/// Platform-specific drivers.
pub mod sys;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use buffer::PhotoBuffer;
pub use driver::{CameraDriver, DeviceHandle};
pub use selector::{AspectRange, select_capture_resolution};
pub use sequence::{CaptureFrame, CaptureSequence};
pub use session::{DeviceSession, SessionState};

/// Errors that can occur with camera operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    /// The sensor could not be opened (busy, permission denied, missing).
    #[error("camera device unavailable: {0}")]
    DeviceUnavailable(String),
    /// The device rejected a preview or capture resolution.
    #[error("unsupported resolution {resolution}: {reason}")]
    UnsupportedResolution {
        /// The rejected resolution.
        resolution: Resolution,
        /// Reason reported by the device.
        reason: String,
    },
    /// Preparing or running a capture sequence failed.
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    /// No session is open.
    #[error("camera session is closed")]
    SessionClosed,
    /// A session is already open or opening; release it first.
    #[error("camera session is already open")]
    AlreadyOpen,
    /// The session was released while the operation was in flight.
    #[error("camera session was released during the operation")]
    StaleSession,
    /// The capture sequence is empty, unbound or not prepared.
    #[error("invalid capture sequence: {0}")]
    InvalidSequence(String),
}

/// Camera resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// The "no resolution" sentinel; means "keep the device default".
    pub const ZERO: Self = Self::new(0, 0);

    /// 640x480, the default preview size.
    pub const VGA: Self = Self::new(640, 480);

    /// Create a resolution.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height, `None` for a zero height.
    #[must_use]
    pub fn aspect_ratio(self) -> Option<f64> {
        (self.height != 0).then(|| f64::from(self.width) / f64::from(self.height))
    }

    /// Whether this is the [`Resolution::ZERO`] sentinel.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.width == 0 && self.height == 0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Which physical camera a session targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SensorLocation {
    /// Rear-facing main camera.
    #[default]
    Back,
    /// Front-facing camera.
    Front,
}

/// Rotation applied when encoding captured frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    /// Upright.
    #[default]
    Deg0,
    /// Quarter turn clockwise.
    Deg90,
    /// Half turn.
    Deg180,
    /// Three quarter turns clockwise.
    Deg270,
}

impl Rotation {
    /// The rotation in degrees.
    #[must_use]
    pub const fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Parse a multiple of 90 degrees; anything else is `None`.
    #[must_use]
    pub const fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }
}

/// Outcome of an autofocus pass. Not focusing is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusStatus {
    /// Focus settled.
    Focused,
    /// The device reported it could not focus.
    NotFocused,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_ratio_of_zero_height_is_none() {
        assert_eq!(Resolution::new(640, 0).aspect_ratio(), None);
        assert!(Resolution::ZERO.is_zero());
        assert!(!Resolution::VGA.is_zero());
    }

    #[test]
    fn rotation_degrees() {
        for rotation in [
            Rotation::Deg0,
            Rotation::Deg90,
            Rotation::Deg180,
            Rotation::Deg270,
        ] {
            assert_eq!(Rotation::from_degrees(rotation.degrees()), Some(rotation));
        }
        assert_eq!(Rotation::from_degrees(45), None);
    }

    #[test]
    fn resolution_display() {
        assert_eq!(Resolution::new(1280, 960).to_string(), "1280x960");
    }
}
