//! Orientation-dependent layout and encoding rotation.

use std::cell::Cell;

use log::debug;
use viewfinder_camera::{CameraDriver, DeviceSession, Rotation};
use viewfinder_sensor::Orientation;

use crate::ui::ViewfinderUi;

/// Size of the preview canvas in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// Margins in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Thickness {
    /// Left margin.
    pub left: i32,
    /// Top margin.
    pub top: i32,
    /// Right margin.
    pub right: i32,
    /// Bottom margin.
    pub bottom: i32,
}

impl Thickness {
    /// Create margins.
    #[must_use]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Viewfinder geometry and encoding rotation for one orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Rotation of the preview and of encoded photos.
    pub rotation: Rotation,
    /// Preview canvas size.
    pub canvas: Size,
    /// Preview canvas margin.
    pub canvas_margin: Thickness,
    /// Title text margin.
    pub title_margin: Thickness,
    /// Whether the shade behind the title is shown.
    pub shade_visible: bool,
}

impl Layout {
    /// The layout for an orientation. Keeps the viewfinder centered and
    /// fully visible.
    #[must_use]
    pub const fn for_orientation(orientation: Orientation) -> Self {
        match orientation {
            Orientation::LandscapeLeft => Self {
                rotation: Rotation::Deg0,
                canvas: Size {
                    width: 640,
                    height: 480,
                },
                canvas_margin: Thickness::new(-60, 0, 0, 0),
                title_margin: Thickness::new(0, 0, 0, 0),
                shade_visible: true,
            },
            Orientation::PortraitUp => Self {
                rotation: Rotation::Deg90,
                canvas: Size {
                    width: 480,
                    height: 640,
                },
                canvas_margin: Thickness::new(0, -20, 0, 0),
                title_margin: Thickness::new(0, 0, 0, 0),
                shade_visible: false,
            },
            Orientation::LandscapeRight => Self {
                rotation: Rotation::Deg180,
                canvas: Size {
                    width: 640,
                    height: 480,
                },
                canvas_margin: Thickness::new(60, 0, 0, 0),
                title_margin: Thickness::new(60, 0, 0, 0),
                shade_visible: true,
            },
        }
    }
}

/// Applies orientation changes to the UI and the open camera session.
#[derive(Debug, Default)]
pub struct OrientationAdapter {
    current: Cell<Orientation>,
}

impl OrientationAdapter {
    /// Create an adapter that assumes `initial` until told otherwise.
    #[must_use]
    pub const fn new(initial: Orientation) -> Self {
        Self {
            current: Cell::new(initial),
        }
    }

    /// The device orientation last reported.
    pub fn current(&self) -> Orientation {
        self.current.get()
    }

    /// Compute the layout for `orientation`, hand it to the UI, and push the
    /// rotation into the session if one is open.
    pub fn apply<D, U>(
        &self,
        orientation: Orientation,
        session: &DeviceSession<D>,
        ui: &U,
    ) -> Layout
    where
        D: CameraDriver,
        U: ViewfinderUi + ?Sized,
    {
        let layout = Layout::for_orientation(orientation);
        ui.apply_layout(&layout);
        if session.is_open() {
            session.set_rotation_for_encoding(layout.rotation);
        } else {
            debug!("no camera session, layout only for {orientation:?}");
        }
        self.current.set(orientation);
        layout
    }

    /// Re-apply the current orientation, e.g. after the camera opened.
    pub fn reapply<D, U>(&self, session: &DeviceSession<D>, ui: &U) -> Layout
    where
        D: CameraDriver,
        U: ViewfinderUi + ?Sized,
    {
        self.apply(self.current(), session, ui)
    }
}
