//! Ownership of the single open camera device.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use log::{debug, error, info, warn};

use crate::{
    CameraDriver, CameraError, CaptureSequence, DeviceHandle, FocusStatus, Resolution, Rotation,
    SensorLocation,
};

/// Lifecycle of a [`DeviceSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No device is held.
    Closed,
    /// An open request is in flight.
    Opening,
    /// The device is open but resolutions are not set yet.
    Opened,
    /// The device is open and configured; captures may run.
    Configured,
}

struct Live<H> {
    handle: Rc<H>,
    sensor: SensorLocation,
    preview: Resolution,
    capture: Resolution,
    rotation: Rotation,
    configured: bool,
}

/// Owns the exclusive handle to one physical camera.
///
/// Every successful open and every release advances an epoch counter.
/// Async operations remember the epoch they started under and fail with
/// [`CameraError::StaleSession`] if the session was released meanwhile, so
/// a late device callback never acts on a newer session.
pub struct DeviceSession<D: CameraDriver> {
    driver: D,
    live: RefCell<Option<Live<D::Handle>>>,
    opening: Cell<bool>,
    epoch: Cell<u64>,
}

impl<D: CameraDriver> fmt::Debug for DeviceSession<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSession")
            .field("state", &self.state())
            .field("epoch", &self.epoch.get())
            .finish_non_exhaustive()
    }
}

impl<D: CameraDriver> DeviceSession<D> {
    /// Create a closed session over a driver.
    pub const fn new(driver: D) -> Self {
        Self {
            driver,
            live: RefCell::new(None),
            opening: Cell::new(false),
            epoch: Cell::new(0),
        }
    }

    /// The platform driver.
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Capture resolutions the driver reports for a sensor.
    pub fn available_capture_resolutions(&self, sensor: SensorLocation) -> Vec<Resolution> {
        self.driver.available_capture_resolutions(sensor)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        match &*self.live.borrow() {
            Some(live) if live.configured => SessionState::Configured,
            Some(_) => SessionState::Opened,
            None if self.opening.get() => SessionState::Opening,
            None => SessionState::Closed,
        }
    }

    /// Whether a device is held.
    pub fn is_open(&self) -> bool {
        self.live.borrow().is_some()
    }

    /// The current epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch.get()
    }

    /// Whether `epoch` still names the open session.
    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch.get() == epoch && self.is_open()
    }

    /// Sensor of the open session.
    pub fn sensor_location(&self) -> Option<SensorLocation> {
        self.inspect(|live| live.sensor)
    }

    /// Preview resolution of the open session.
    pub fn preview_resolution(&self) -> Option<Resolution> {
        self.inspect(|live| live.preview)
    }

    /// Capture resolution of the open session; [`Resolution::ZERO`] means
    /// the device default is in use.
    pub fn capture_resolution(&self) -> Option<Resolution> {
        self.inspect(|live| live.capture)
    }

    /// Rotation last pushed into the open session.
    pub fn rotation(&self) -> Option<Rotation> {
        self.inspect(|live| live.rotation)
    }

    /// Whether the open session's sensor supports autofocus.
    pub fn is_focus_supported(&self) -> bool {
        self.sensor_location()
            .is_some_and(|sensor| self.driver.is_focus_supported(sensor))
    }

    /// Open a sensor and return the new session's epoch.
    ///
    /// # Errors
    /// - [`CameraError::AlreadyOpen`] if a session is open or opening.
    /// - [`CameraError::DeviceUnavailable`] if the driver cannot open it.
    /// - [`CameraError::StaleSession`] if released while opening.
    pub async fn open(&self, sensor: SensorLocation, initial: Resolution) -> Result<u64, CameraError> {
        if self.opening.get() || self.is_open() {
            return Err(CameraError::AlreadyOpen);
        }

        let ticket = self.epoch.get();
        self.opening.set(true);
        info!("opening {sensor:?} camera at {initial}");

        let result = self.driver.open(sensor, initial).await;

        if self.epoch.get() != ticket {
            if let Ok(handle) = result {
                handle.close();
            }
            warn!("camera released while opening, discarding the new handle");
            return Err(CameraError::StaleSession);
        }
        self.opening.set(false);

        let handle = result.map_err(|e| {
            error!("failed to open {sensor:?} camera: {e}");
            match e {
                CameraError::DeviceUnavailable(_) => e,
                other => CameraError::DeviceUnavailable(other.to_string()),
            }
        })?;

        let epoch = ticket + 1;
        self.epoch.set(epoch);
        *self.live.borrow_mut() = Some(Live {
            handle: Rc::new(handle),
            sensor,
            preview: initial,
            capture: Resolution::ZERO,
            rotation: Rotation::Deg0,
            configured: false,
        });
        Ok(epoch)
    }

    /// Set the preview and capture resolutions.
    ///
    /// A [`Resolution::ZERO`] capture resolution keeps the device default.
    ///
    /// # Errors
    /// - [`CameraError::SessionClosed`] if nothing is open.
    /// - [`CameraError::UnsupportedResolution`] if the device rejects one.
    /// - [`CameraError::StaleSession`] if released meanwhile.
    pub async fn configure(&self, preview: Resolution, capture: Resolution) -> Result<(), CameraError> {
        let (handle, epoch) = self.current()?;

        let result = handle.set_preview_resolution(preview).await;
        self.ensure_current(epoch)?;
        result.map_err(|e| rejected(preview, e))?;

        if capture.is_zero() {
            debug!("no matching capture resolution, keeping the device default");
        } else {
            let result = handle.set_capture_resolution(capture).await;
            self.ensure_current(epoch)?;
            result.map_err(|e| rejected(capture, e))?;
        }

        if let Some(live) = self.live.borrow_mut().as_mut() {
            live.preview = preview;
            live.capture = capture;
            live.configured = true;
        }
        info!("camera configured: preview {preview}, capture {capture}");
        Ok(())
    }

    /// Push the encoding rotation into the open session; ignored when closed.
    pub fn set_rotation_for_encoding(&self, rotation: Rotation) {
        match self.live.borrow_mut().as_mut() {
            Some(live) => {
                live.rotation = rotation;
                live.handle.set_encode_rotation(rotation);
                debug!("encoding rotation set to {}", rotation.degrees());
            }
            None => debug!(
                "no open camera session, rotation {} not applied",
                rotation.degrees()
            ),
        }
    }

    /// Run autofocus.
    ///
    /// # Errors
    /// [`CameraError::SessionClosed`] or [`CameraError::StaleSession`].
    pub async fn focus(&self) -> Result<FocusStatus, CameraError> {
        let (handle, epoch) = self.current()?;
        let status = handle.focus().await;
        self.ensure_current(epoch)?;
        if status == FocusStatus::NotFocused {
            debug!("autofocus did not settle, continuing");
        }
        Ok(status)
    }

    /// Clear locked autofocus parameters; ignored when closed.
    pub fn reset_focus_lock(&self) {
        if let Some(live) = self.live.borrow().as_ref() {
            live.handle.reset_focus_lock();
        }
    }

    /// Allocate a capture plan of `frame_count` unbound frames.
    ///
    /// # Errors
    /// [`CameraError::SessionClosed`] or [`CameraError::InvalidSequence`].
    pub fn create_capture_sequence(&self, frame_count: usize) -> Result<CaptureSequence, CameraError> {
        if !self.is_open() {
            return Err(CameraError::SessionClosed);
        }
        CaptureSequence::new(frame_count)
    }

    /// Prepare a bound sequence. Must complete before [`Self::start_capture`].
    ///
    /// # Errors
    /// - [`CameraError::InvalidSequence`] if unbound or not configured.
    /// - [`CameraError::CaptureFailed`] on device failure.
    /// - [`CameraError::SessionClosed`] or [`CameraError::StaleSession`].
    pub async fn prepare(&self, sequence: &mut CaptureSequence) -> Result<(), CameraError> {
        let (handle, epoch) = self.current()?;
        if self.state() != SessionState::Configured {
            return Err(CameraError::InvalidSequence(
                "camera session is not configured".into(),
            ));
        }
        if !sequence.is_bound() {
            return Err(CameraError::InvalidSequence(
                "every frame needs capture and thumbnail sinks".into(),
            ));
        }

        let result = handle.prepare_capture(sequence).await;
        self.ensure_current(epoch)?;
        result.map_err(capture_failed)?;
        sequence.mark_prepared(epoch);
        Ok(())
    }

    /// Capture a prepared sequence into its sinks.
    ///
    /// # Errors
    /// - [`CameraError::InvalidSequence`] if not prepared on this session.
    /// - [`CameraError::CaptureFailed`] on device failure.
    /// - [`CameraError::SessionClosed`] or [`CameraError::StaleSession`].
    pub async fn start_capture(&self, sequence: &CaptureSequence) -> Result<(), CameraError> {
        let (handle, epoch) = self.current()?;
        if sequence.prepared_for() != Some(epoch) {
            return Err(CameraError::InvalidSequence(
                "sequence was not prepared on this session".into(),
            ));
        }

        let result = handle.start_capture(sequence).await;
        self.ensure_current(epoch)?;
        result.map_err(capture_failed)
    }

    /// Release the device. Releasing a closed session does nothing.
    pub fn release(&self) {
        let released = self.live.borrow_mut().take();
        if let Some(live) = released {
            live.handle.close();
            self.epoch.set(self.epoch.get() + 1);
            info!("released {:?} camera", live.sensor);
        } else if self.opening.replace(false) {
            self.epoch.set(self.epoch.get() + 1);
            info!("cancelled pending camera open");
        } else {
            debug!("release on closed camera session ignored");
        }
    }

    fn inspect<T>(&self, f: impl FnOnce(&Live<D::Handle>) -> T) -> Option<T> {
        self.live.borrow().as_ref().map(f)
    }

    fn current(&self) -> Result<(Rc<D::Handle>, u64), CameraError> {
        self.live
            .borrow()
            .as_ref()
            .map(|live| (Rc::clone(&live.handle), self.epoch.get()))
            .ok_or(CameraError::SessionClosed)
    }

    fn ensure_current(&self, epoch: u64) -> Result<(), CameraError> {
        if self.is_current(epoch) {
            Ok(())
        } else {
            warn!("discarding result from released camera session (epoch {epoch})");
            Err(CameraError::StaleSession)
        }
    }
}

impl<D: CameraDriver> Drop for DeviceSession<D> {
    fn drop(&mut self) {
        self.release();
    }
}

fn rejected(resolution: Resolution, error: CameraError) -> CameraError {
    match error {
        CameraError::UnsupportedResolution { .. } => error,
        other => CameraError::UnsupportedResolution {
            resolution,
            reason: other.to_string(),
        },
    }
}

fn capture_failed(error: CameraError) -> CameraError {
    match error {
        CameraError::CaptureFailed(_) => error,
        other => CameraError::CaptureFailed(other.to_string()),
    }
}
