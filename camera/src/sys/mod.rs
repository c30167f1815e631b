//! Platform camera drivers.
//!
//! Mobile platforms provide their own [`CameraDriver`](crate::CameraDriver)
//! through the host application; desktop webcams are covered by the
//! `nokhwa` feature.

#[cfg(feature = "nokhwa")]
mod desktop;

#[cfg(feature = "nokhwa")]
pub use desktop::{DesktopDriver, DesktopHandle};
