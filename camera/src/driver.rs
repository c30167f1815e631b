//! Hardware boundary implemented by platform backends.

use crate::{CameraError, CaptureSequence, FocusStatus, Resolution, Rotation, SensorLocation};

/// Entry point of a platform camera backend.
///
/// Futures returned by the async methods are polled on the caller's single
/// logical flow and need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait CameraDriver {
    /// Handle to an opened device.
    type Handle: DeviceHandle;

    /// Capture resolutions supported by a sensor, in device order.
    fn available_capture_resolutions(&self, sensor: SensorLocation) -> Vec<Resolution>;

    /// Whether the sensor supports autofocus.
    fn is_focus_supported(&self, sensor: SensorLocation) -> bool;

    /// Open a sensor at an initial resolution.
    ///
    /// # Errors
    /// Returns [`CameraError::DeviceUnavailable`] if the sensor cannot be
    /// opened.
    async fn open(
        &self,
        sensor: SensorLocation,
        initial: Resolution,
    ) -> Result<Self::Handle, CameraError>;
}

/// An opened camera device.
#[allow(async_fn_in_trait)]
pub trait DeviceHandle {
    /// Set the viewfinder resolution.
    ///
    /// # Errors
    /// Returns [`CameraError::UnsupportedResolution`] if rejected.
    async fn set_preview_resolution(&self, resolution: Resolution) -> Result<(), CameraError>;

    /// Set the still capture resolution.
    ///
    /// # Errors
    /// Returns [`CameraError::UnsupportedResolution`] if rejected.
    async fn set_capture_resolution(&self, resolution: Resolution) -> Result<(), CameraError>;

    /// Tag encoded frames with a rotation. Best effort.
    fn set_encode_rotation(&self, rotation: Rotation);

    /// Clear any locked autofocus parameters.
    fn reset_focus_lock(&self);

    /// Run autofocus until it settles or gives up.
    async fn focus(&self) -> FocusStatus;

    /// Prepare the device for a sequence.
    ///
    /// # Errors
    /// Returns [`CameraError::CaptureFailed`] on device failure.
    async fn prepare_capture(&self, sequence: &CaptureSequence) -> Result<(), CameraError>;

    /// Capture every frame into its bound sinks.
    ///
    /// # Errors
    /// Returns [`CameraError::CaptureFailed`] on device failure.
    async fn start_capture(&self, sequence: &CaptureSequence) -> Result<(), CameraError>;

    /// Release the device.
    fn close(&self);
}
