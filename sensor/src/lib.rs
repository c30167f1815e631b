//! Device orientation for camera viewfinders.
//!
//! This crate classifies raw orientation readings into the three layouts a
//! viewfinder supports and turns periodic readings into a stream of
//! orientation changes.
//!
//! # Usage
//!
//! ```ignore
//! use futures::StreamExt;
//! use viewfinder_sensor::OrientationSensor;
//!
//! if OrientationSensor::is_available() {
//!     let mut changes = OrientationSensor::watch(250)?;
//!     while let Some(orientation) = changes.next().await {
//!         println!("now {orientation:?}");
//!     }
//! }
//! ```

#![warn(missing_docs)]

/// Platform-specific implementations.
mod sys;

use std::pin::Pin;

use futures::{Stream, StreamExt, future};
use serde::{Deserialize, Serialize};

/// A device orientation with an on-screen viewfinder layout.
///
/// Upside-down portrait has no layout and is never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Landscape with the top of the device on the left.
    #[default]
    LandscapeLeft,
    /// Landscape with the top of the device on the right.
    LandscapeRight,
    /// Upright portrait.
    PortraitUp,
}

impl Orientation {
    /// Classify a gravity vector given in device coordinates (x towards the
    /// right edge, y towards the top edge, z out of the screen).
    ///
    /// Returns `None` when the device lies flat or is upside down.
    #[must_use]
    pub fn from_gravity(x: f64, y: f64, z: f64) -> Option<Self> {
        let (ax, ay, az) = (x.abs(), y.abs(), z.abs());
        if az >= ax && az >= ay {
            return None;
        }
        if ax > ay {
            Some(if x < 0.0 {
                Self::LandscapeLeft
            } else {
                Self::LandscapeRight
            })
        } else if y < 0.0 {
            Some(Self::PortraitUp)
        } else {
            None
        }
    }

    /// Map an iio-sensor-proxy `AccelerometerOrientation` value.
    #[must_use]
    pub fn from_iio(name: &str) -> Option<Self> {
        match name {
            "normal" => Some(Self::PortraitUp),
            "right-up" => Some(Self::LandscapeLeft),
            "left-up" => Some(Self::LandscapeRight),
            _ => None,
        }
    }
}

/// Errors that can occur when reading orientation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SensorError {
    /// No orientation source on this device.
    #[error("orientation sensor not available")]
    NotAvailable,
    /// Sensor access permission denied.
    #[error("sensor permission denied")]
    PermissionDenied,
    /// An unknown error occurred.
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// A boxed stream of orientation changes.
pub type SensorStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

/// Reduce raw readings to supported orientation changes.
///
/// Unsupported readings (`None`) are skipped and repeats of the last
/// emitted orientation are dropped.
pub fn orientation_changes<S>(readings: S) -> impl Stream<Item = Orientation>
where
    S: Stream<Item = Option<Orientation>>,
{
    readings
        .filter_map(future::ready)
        .scan(None, |last: &mut Option<Orientation>, orientation| {
            let changed = *last != Some(orientation);
            *last = Some(orientation);
            future::ready(Some(changed.then_some(orientation)))
        })
        .filter_map(future::ready)
}

/// The platform orientation source.
#[derive(Debug)]
pub struct OrientationSensor;

impl OrientationSensor {
    /// Check if an orientation source is available.
    #[must_use]
    pub fn is_available() -> bool {
        sys::orientation_available()
    }

    /// Read the current orientation; `None` when flat or upside down.
    ///
    /// # Errors
    /// Returns a [`SensorError`] if the sensor is not available.
    pub async fn read() -> Result<Option<Orientation>, SensorError> {
        sys::orientation_read().await
    }

    /// Poll the sensor every `interval_ms` and yield orientation changes.
    ///
    /// # Errors
    /// Returns a [`SensorError`] if the sensor is not available.
    pub fn watch(interval_ms: u32) -> Result<SensorStream<Orientation>, SensorError> {
        let readings = sys::orientation_watch(interval_ms)?;
        Ok(Box::pin(orientation_changes(readings)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn gravity_classification() {
        assert_eq!(
            Orientation::from_gravity(0.0, -1.0, 0.1),
            Some(Orientation::PortraitUp)
        );
        assert_eq!(
            Orientation::from_gravity(-0.9, 0.2, 0.1),
            Some(Orientation::LandscapeLeft)
        );
        assert_eq!(
            Orientation::from_gravity(0.9, -0.2, 0.1),
            Some(Orientation::LandscapeRight)
        );
        assert_eq!(Orientation::from_gravity(0.0, 1.0, 0.0), None);
        assert_eq!(Orientation::from_gravity(0.1, 0.1, -1.0), None);
    }

    #[test]
    fn iio_names() {
        assert_eq!(Orientation::from_iio("normal"), Some(Orientation::PortraitUp));
        assert_eq!(
            Orientation::from_iio("right-up"),
            Some(Orientation::LandscapeLeft)
        );
        assert_eq!(
            Orientation::from_iio("left-up"),
            Some(Orientation::LandscapeRight)
        );
        assert_eq!(Orientation::from_iio("bottom-up"), None);
        assert_eq!(Orientation::from_iio("undefined"), None);
    }

    #[tokio::test]
    async fn changes_skip_repeats_and_unsupported() {
        let readings = stream::iter([
            Some(Orientation::PortraitUp),
            Some(Orientation::PortraitUp),
            None,
            Some(Orientation::LandscapeLeft),
            None,
            Some(Orientation::LandscapeLeft),
            Some(Orientation::PortraitUp),
        ]);
        let changes: Vec<_> = orientation_changes(readings).collect().await;
        assert_eq!(
            changes,
            vec![
                Orientation::PortraitUp,
                Orientation::LandscapeLeft,
                Orientation::PortraitUp,
            ]
        );
    }

    #[cfg(not(all(target_os = "linux", feature = "iio")))]
    #[tokio::test]
    async fn fallback_reports_unavailable() {
        assert!(!OrientationSensor::is_available());
        assert!(matches!(
            OrientationSensor::read().await,
            Err(SensorError::NotAvailable)
        ));
        assert!(OrientationSensor::watch(100).is_err());
    }
}
