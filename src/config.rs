//! Controller configuration.

use serde::{Deserialize, Serialize};
use viewfinder_camera::{AspectRange, Resolution, SensorLocation};
use viewfinder_codec::{Dimensions, MAX_JPEG_QUALITY};
use viewfinder_sensor::Orientation;

/// Upper bound for decoding imported photos, covering every supported
/// camera output size.
pub const DEFAULT_WORKING_CANVAS: Resolution = Resolution::new(3552, 2448);

/// User-facing strings the controller hands to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    /// Progress text while the camera opens.
    pub initializing_camera: String,
    /// Notice when the camera cannot be opened or configured.
    pub camera_unavailable: String,
    /// Notice when a capture fails.
    pub capture_failed: String,
    /// Notice when the photo chooser cannot be shown.
    pub chooser_failed: String,
    /// Notice when a chosen photo cannot be imported.
    pub import_failed: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            initializing_camera: "Initializing camera...".into(),
            camera_unavailable: "The camera could not be started.".into(),
            capture_failed: "Taking the photo failed.".into(),
            chooser_failed: "An error occurred while choosing an image.".into(),
            import_failed: "The chosen image could not be opened.".into(),
        }
    }
}

/// Settings for a [`CaptureController`](crate::CaptureController).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Sensor opened on entry.
    pub sensor: SensorLocation,
    /// Initial and preview resolution.
    pub preview_resolution: Resolution,
    /// Aspect ratios acceptable for the capture resolution.
    pub aspect_range: AspectRange,
    /// Orientation assumed until the first orientation change arrives.
    pub initial_orientation: Orientation,
    /// Largest bitmap decoded when importing a JPEG.
    pub working_canvas: Resolution,
    /// JPEG quality used when transcoding imported photos.
    pub import_quality: u8,
    /// User-facing strings.
    pub messages: Messages,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            sensor: SensorLocation::Back,
            preview_resolution: Resolution::VGA,
            aspect_range: AspectRange::FOUR_BY_THREE,
            initial_orientation: Orientation::LandscapeLeft,
            working_canvas: DEFAULT_WORKING_CANVAS,
            import_quality: MAX_JPEG_QUALITY,
            messages: Messages::default(),
        }
    }
}

impl ControllerConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a different sensor.
    #[must_use]
    pub const fn with_sensor(mut self, sensor: SensorLocation) -> Self {
        self.sensor = sensor;
        self
    }

    /// Use a different preview resolution.
    #[must_use]
    pub const fn with_preview_resolution(mut self, resolution: Resolution) -> Self {
        self.preview_resolution = resolution;
        self
    }

    /// Accept a different range of capture aspect ratios.
    #[must_use]
    pub const fn with_aspect_range(mut self, range: AspectRange) -> Self {
        self.aspect_range = range;
        self
    }

    /// Assume a different orientation until the sensor reports one.
    #[must_use]
    pub const fn with_initial_orientation(mut self, orientation: Orientation) -> Self {
        self.initial_orientation = orientation;
        self
    }

    /// Use a different import working canvas.
    #[must_use]
    pub const fn with_working_canvas(mut self, canvas: Resolution) -> Self {
        self.working_canvas = canvas;
        self
    }

    /// Transcode imports at a different JPEG quality.
    #[must_use]
    pub const fn with_import_quality(mut self, quality: u8) -> Self {
        self.import_quality = quality;
        self
    }

    /// Replace the user-facing strings.
    #[must_use]
    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    /// The working canvas as codec dimensions.
    #[must_use]
    pub const fn canvas_dimensions(&self) -> Dimensions {
        Dimensions::new(self.working_canvas.width, self.working_canvas.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.sensor, SensorLocation::Back);
        assert_eq!(config.preview_resolution, Resolution::new(640, 480));
        assert_eq!(config.working_canvas, Resolution::new(3552, 2448));
        assert_eq!(config.import_quality, 100);
        assert_eq!(config.initial_orientation, Orientation::LandscapeLeft);
        assert_eq!(config.canvas_dimensions(), Dimensions::new(3552, 2448));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ControllerConfig = serde_json::from_str(
            r#"{ "sensor": "Front", "initial_orientation": "PortraitUp", "messages": { "capture_failed": "Nope" } }"#,
        )
        .unwrap();
        assert_eq!(config.sensor, SensorLocation::Front);
        assert_eq!(config.initial_orientation, Orientation::PortraitUp);
        assert_eq!(config.messages.capture_failed, "Nope");
        assert_eq!(
            config.messages.initializing_camera,
            Messages::default().initializing_camera
        );
        assert_eq!(config.aspect_range, AspectRange::FOUR_BY_THREE);
    }

    #[test]
    fn builder() {
        let config = ControllerConfig::new()
            .with_sensor(SensorLocation::Front)
            .with_import_quality(85);
        assert_eq!(config.sensor, SensorLocation::Front);
        assert_eq!(config.import_quality, 85);
    }
}
