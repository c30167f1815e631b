//! The UI port: everything the controller asks of the surrounding page.

use std::rc::Rc;

use thiserror::Error;

use crate::orientation::Layout;

/// The photo chooser could not be shown.
#[derive(Debug, Clone, Error)]
#[error("photo chooser unavailable: {0}")]
pub struct ChooserUnavailable(pub String);

/// Result of the external photo chooser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoChoice {
    /// The user backed out, or the chooser returned nothing.
    Cancelled,
    /// The encoded bytes of the chosen photo.
    Chosen(Vec<u8>),
}

impl PhotoChoice {
    /// Build from a chooser's success flag and optional photo.
    #[must_use]
    pub fn from_result(succeeded: bool, photo: Option<Vec<u8>>) -> Self {
        match photo {
            Some(bytes) if succeeded => Self::Chosen(bytes),
            _ => Self::Cancelled,
        }
    }
}

/// Whether the hardware shutter key callbacks are registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutterBinding {
    /// Half and full presses reach the controller.
    Attached,
    /// Presses are ignored.
    #[default]
    Detached,
}

/// Calls the controller issues outward. All are fire-and-forget.
pub trait ViewfinderUi {
    /// Enable or disable on-screen buttons and menu items.
    fn set_controls_enabled(&self, enabled: bool);

    /// Register or deregister the hardware shutter key callbacks.
    fn set_shutter_keys_attached(&self, attached: bool);

    /// Show an indeterminate progress indicator.
    fn show_progress(&self, message: &str);

    /// Hide the progress indicator.
    fn hide_progress(&self);

    /// Lay out the viewfinder for the current orientation.
    fn apply_layout(&self, layout: &Layout);

    /// Start the post-capture animation.
    fn play_capture_animation(&self);

    /// Reset the post-capture animation.
    fn stop_capture_animation(&self);

    /// Move on after a photo was captured.
    fn navigate_after_capture(&self);

    /// Move on after a photo was imported.
    fn navigate_after_import(&self);

    /// Tell the user something went wrong.
    fn show_notice(&self, message: &str);

    /// Open the external photo chooser; its result arrives later through
    /// [`CaptureController::photo_chosen`](crate::CaptureController::photo_chosen).
    ///
    /// # Errors
    /// Returns [`ChooserUnavailable`] if the chooser cannot be shown now.
    fn open_photo_chooser(&self) -> Result<(), ChooserUnavailable>;
}

impl<T: ViewfinderUi + ?Sized> ViewfinderUi for Rc<T> {
    fn set_controls_enabled(&self, enabled: bool) {
        (**self).set_controls_enabled(enabled);
    }

    fn set_shutter_keys_attached(&self, attached: bool) {
        (**self).set_shutter_keys_attached(attached);
    }

    fn show_progress(&self, message: &str) {
        (**self).show_progress(message);
    }

    fn hide_progress(&self) {
        (**self).hide_progress();
    }

    fn apply_layout(&self, layout: &Layout) {
        (**self).apply_layout(layout);
    }

    fn play_capture_animation(&self) {
        (**self).play_capture_animation();
    }

    fn stop_capture_animation(&self) {
        (**self).stop_capture_animation();
    }

    fn navigate_after_capture(&self) {
        (**self).navigate_after_capture();
    }

    fn navigate_after_import(&self) {
        (**self).navigate_after_import();
    }

    fn show_notice(&self, message: &str) {
        (**self).show_notice(message);
    }

    fn open_photo_chooser(&self) -> Result<(), ChooserUnavailable> {
        (**self).open_photo_chooser()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_successful_non_empty_results_are_chosen() {
        assert_eq!(
            PhotoChoice::from_result(true, Some(vec![1, 2])),
            PhotoChoice::Chosen(vec![1, 2])
        );
        assert_eq!(PhotoChoice::from_result(true, None), PhotoChoice::Cancelled);
        assert_eq!(
            PhotoChoice::from_result(false, Some(vec![1])),
            PhotoChoice::Cancelled
        );
    }
}
