//! # Viewfinder
//!
//! A camera viewfinder controller: it opens the camera, picks a 4:3 capture
//! resolution, runs focus-then-capture sequences, follows device rotation,
//! and imports photos chosen from storage. Every photo, captured or
//! imported, ends up as a JPEG stream (plus thumbnail for captures) in one
//! shared [`PhotoContext`].
//!
//! The hardware sits behind [`camera::CameraDriver`]; the page behind
//! [`ViewfinderUi`].
//!
//! ## Features
//!
//! - `mock`: in-memory camera driver for tests.
//! - `nokhwa`: desktop webcam driver.
//! - `iio`: Linux accelerometer orientation via iio-sensor-proxy.
//!
//! ## Example
//!
//! ```rust,ignore
//! use viewfinder::{CaptureController, ControllerConfig};
//!
//! async fn shoot(driver: impl viewfinder::camera::CameraDriver, ui: impl viewfinder::ViewfinderUi) {
//!     let controller = CaptureController::new(driver, ui, ControllerConfig::default());
//!     if controller.enter().await.is_ok() {
//!         let _ = controller.capture_with_focus().await;
//!     }
//!     controller.leave();
//! }
//! ```

#![warn(missing_docs)]
// Device futures resume on the UI flow and are never sent across threads.
#![allow(clippy::future_not_send)]

mod config;
mod context;
mod controller;
mod error;
mod import;
mod orientation;
mod ui;

pub use viewfinder_camera as camera;
pub use viewfinder_codec as codec;
pub use viewfinder_sensor as sensor;

pub use config::{ControllerConfig, DEFAULT_WORKING_CANVAS, Messages};
pub use context::PhotoContext;
pub use controller::{
    CaptureController, CaptureOutcome, CaptureState, ControllerEvent, FocusOutcome,
};
pub use error::{Error, Result};
pub use import::{ImportPath, ImportReport, PhotoImporter};
pub use orientation::{Layout, OrientationAdapter, Size, Thickness};
pub use ui::{ChooserUnavailable, PhotoChoice, ShutterBinding, ViewfinderUi};
