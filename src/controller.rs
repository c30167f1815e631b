//! The capture controller: lifecycle, focus and capture state machine,
//! orientation handling and photo import.

use std::cell::{Cell, RefCell};
use std::fmt;

use async_channel::{Receiver, Sender};
use log::{debug, error, info, warn};
use viewfinder_camera::{
    CameraDriver, CameraError, DeviceSession, FocusStatus, Resolution, SessionState,
    select_capture_resolution,
};
use viewfinder_sensor::Orientation;

use crate::import::{ImportPath, ImportReport, PhotoImporter};
use crate::orientation::{Layout, OrientationAdapter};
use crate::ui::{PhotoChoice, ShutterBinding, ViewfinderUi};
use crate::{ControllerConfig, Error, PhotoContext, Result};

/// Capture state machine states. Every transition ends back in `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    /// Ready for focus and capture requests.
    #[default]
    Idle,
    /// Autofocus is running.
    Focusing,
    /// A capture sequence is in flight.
    Capturing,
}

/// How a capture request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The photo is in the context's buffers.
    Completed,
    /// Another capture was in flight; nothing happened.
    Ignored,
    /// The camera was released while capturing; the result was dropped.
    Discarded,
}

/// How a focus request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    /// Autofocus settled.
    Focused,
    /// Autofocus ran but could not settle.
    NotFocused,
    /// The sensor has no autofocus; no device call was made.
    Unsupported,
    /// The controller was not idle; nothing happened.
    Ignored,
    /// The camera was released while focusing; the result was dropped.
    Discarded,
}

/// Notifications broadcast to [`CaptureController::subscribe`] receivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// The camera opened and was configured with this capture resolution.
    CameraReady {
        /// Selected capture resolution, [`Resolution::ZERO`] for the device
        /// default.
        capture: Resolution,
    },
    /// A captured photo is ready in the context.
    CaptureCompleted,
    /// A capture failed on the device.
    CaptureFailed(String),
    /// A chosen photo was imported into the context.
    ImportCompleted(ImportPath),
    /// A chosen photo could not be imported.
    ImportFailed(String),
    /// The layout was switched to a new orientation.
    OrientationChanged(Orientation),
}

/// Drives one camera viewfinder page.
///
/// The controller is single-threaded: its futures are `!Send`, its state
/// lives in cells, and device callbacks resume on the caller's flow. Only
/// one capture may be in flight; a request while busy is ignored. Results
/// of device operations that finish after the camera was released are
/// discarded; if no camera is open by then, the controller returns to
/// `Idle` with the busy flag cleared.
pub struct CaptureController<D: CameraDriver, U: ViewfinderUi> {
    config: ControllerConfig,
    session: DeviceSession<D>,
    ui: U,
    context: PhotoContext,
    importer: PhotoImporter,
    orientation: OrientationAdapter,
    state: Cell<CaptureState>,
    busy: Cell<bool>,
    shutter: Cell<ShutterBinding>,
    subscribers: RefCell<Vec<Sender<ControllerEvent>>>,
}

impl<D: CameraDriver, U: ViewfinderUi> fmt::Debug for CaptureController<D, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureController")
            .field("session", &self.session)
            .field("state", &self.state.get())
            .field("busy", &self.busy.get())
            .field("shutter", &self.shutter.get())
            .field("orientation", &self.orientation.current())
            .finish_non_exhaustive()
    }
}

impl<D: CameraDriver, U: ViewfinderUi> CaptureController<D, U> {
    /// Create a controller with a fresh photo context.
    pub fn new(driver: D, ui: U, config: ControllerConfig) -> Self {
        Self::with_context(driver, ui, PhotoContext::new(), config)
    }

    /// Create a controller writing photos into an existing context.
    pub fn with_context(driver: D, ui: U, context: PhotoContext, config: ControllerConfig) -> Self {
        Self {
            importer: PhotoImporter::from_config(&config),
            orientation: OrientationAdapter::new(config.initial_orientation),
            config,
            session: DeviceSession::new(driver),
            ui,
            context,
            state: Cell::new(CaptureState::Idle),
            busy: Cell::new(false),
            shutter: Cell::new(ShutterBinding::Detached),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    /// The page became visible: open and configure the camera.
    ///
    /// Any previous session is released first. On failure the progress
    /// indicator is hidden, a notice is shown and controls stay disabled.
    ///
    /// # Errors
    /// - [`CameraError::DeviceUnavailable`] if the sensor cannot be opened.
    /// - [`CameraError::UnsupportedResolution`] if configuration is rejected.
    /// - [`CameraError::StaleSession`] if [`Self::leave`] ran meanwhile; no
    ///   notice is shown in that case.
    pub async fn enter(&self) -> Result<()> {
        self.session.release();
        self.busy.set(false);
        self.state.set(CaptureState::Idle);
        self.ui.set_controls_enabled(false);
        self.ui.show_progress(&self.config.messages.initializing_camera);

        let result = self.initialize_camera().await;
        self.ui.hide_progress();

        match result {
            Ok(capture) => {
                self.ui.set_controls_enabled(true);
                self.set_shutter(ShutterBinding::Attached);
                self.ui.stop_capture_animation();
                self.emit(ControllerEvent::CameraReady { capture });
                Ok(())
            }
            Err(CameraError::StaleSession) => {
                debug!("camera initialization outlived the page, discarding");
                Err(CameraError::StaleSession.into())
            }
            Err(e) => {
                error!("camera initialization failed: {e}");
                self.ui.show_notice(&self.config.messages.camera_unavailable);
                Err(e.into())
            }
        }
    }

    /// The page is going away: release the camera and detach the shutter.
    pub fn leave(&self) {
        self.session.release();
        self.busy.set(false);
        self.state.set(CaptureState::Idle);
        self.ui.set_controls_enabled(false);
        self.set_shutter(ShutterBinding::Detached);
        info!("viewfinder left");
    }

    /// Switch the layout, and the encoding rotation if a camera is open.
    pub fn on_orientation_changed(&self, orientation: Orientation) -> Layout {
        let layout = self.orientation.apply(orientation, &self.session, &self.ui);
        self.emit(ControllerEvent::OrientationChanged(orientation));
        layout
    }

    /// Run autofocus if the controller is idle and the sensor supports it.
    ///
    /// # Errors
    /// [`CameraError::SessionClosed`] if no configured camera is open.
    pub async fn request_focus(&self) -> Result<FocusOutcome> {
        if self.busy.get() || self.state.get() != CaptureState::Idle {
            debug!("focus requested while {:?}, ignored", self.state.get());
            return Ok(FocusOutcome::Ignored);
        }
        self.ensure_configured()?;
        if !self.session.is_focus_supported() {
            debug!("sensor has no autofocus");
            return Ok(FocusOutcome::Unsupported);
        }

        let epoch = self.session.epoch();
        self.ui.set_controls_enabled(false);
        self.state.set(CaptureState::Focusing);

        let result = self.session.focus().await;
        if matches!(result, Err(CameraError::StaleSession)) || !self.session.is_current(epoch) {
            debug!("focus finished after the camera was released, discarding");
            self.settle_discarded();
            return Ok(FocusOutcome::Discarded);
        }

        // A capture may have started while focusing; it owns state and controls.
        if self.state.get() == CaptureState::Focusing {
            self.state.set(CaptureState::Idle);
            self.ui.set_controls_enabled(true);
        }
        match result? {
            FocusStatus::Focused => Ok(FocusOutcome::Focused),
            FocusStatus::NotFocused => Ok(FocusOutcome::NotFocused),
        }
    }

    /// Capture one photo into the context's buffers.
    ///
    /// On success the buffers are rewound, the capture animation plays and
    /// the UI navigates on. On failure a notice is shown and controls are
    /// re-enabled.
    ///
    /// # Errors
    /// - [`CameraError::SessionClosed`] if no configured camera is open;
    ///   the buffers and controls are left untouched.
    /// - [`CameraError::CaptureFailed`] if the device fails.
    pub async fn request_capture(&self) -> Result<CaptureOutcome> {
        if self.busy.get() {
            debug!("capture already in flight, request ignored");
            return Ok(CaptureOutcome::Ignored);
        }
        self.ensure_configured()?;

        let epoch = self.session.epoch();
        self.busy.set(true);
        self.state.set(CaptureState::Capturing);
        self.ui.set_controls_enabled(false);

        let result = self.run_capture().await;
        if matches!(result, Err(CameraError::StaleSession)) || !self.session.is_current(epoch) {
            warn!("capture finished after the camera was released, discarding");
            self.settle_discarded();
            return Ok(CaptureOutcome::Discarded);
        }

        self.busy.set(false);
        self.state.set(CaptureState::Idle);
        self.session.reset_focus_lock();

        match result {
            Ok(()) => {
                self.context.rewind();
                info!("captured {} byte photo", self.context.image().len());
                self.ui.play_capture_animation();
                self.emit(ControllerEvent::CaptureCompleted);
                self.ui.navigate_after_capture();
                Ok(CaptureOutcome::Completed)
            }
            Err(e) => {
                error!("capture failed: {e}");
                self.ui.show_notice(&self.config.messages.capture_failed);
                self.ui.set_controls_enabled(true);
                self.emit(ControllerEvent::CaptureFailed(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// The on-screen capture button: focus, then capture.
    ///
    /// # Errors
    /// As [`Self::request_focus`] and [`Self::request_capture`].
    pub async fn capture_with_focus(&self) -> Result<CaptureOutcome> {
        let focus = self.request_focus().await?;
        if focus == FocusOutcome::Discarded {
            return Ok(CaptureOutcome::Discarded);
        }
        self.request_capture().await
    }

    /// Hardware shutter half press.
    ///
    /// # Errors
    /// As [`Self::request_focus`].
    pub async fn on_shutter_half_pressed(&self) -> Result<FocusOutcome> {
        if self.shutter.get() == ShutterBinding::Detached {
            debug!("shutter detached, half press ignored");
            return Ok(FocusOutcome::Ignored);
        }
        self.request_focus().await
    }

    /// Hardware shutter full press.
    ///
    /// # Errors
    /// As [`Self::request_capture`].
    pub async fn on_shutter_pressed(&self) -> Result<CaptureOutcome> {
        if self.shutter.get() == ShutterBinding::Detached {
            debug!("shutter detached, press ignored");
            return Ok(CaptureOutcome::Ignored);
        }
        self.request_capture().await
    }

    /// Ask the UI to open the photo chooser. Returns whether it opened.
    pub fn choose_photo(&self) -> bool {
        match self.ui.open_photo_chooser() {
            Ok(()) => true,
            Err(e) => {
                warn!("{e}");
                self.ui.show_notice(&self.config.messages.chooser_failed);
                false
            }
        }
    }

    /// Handle the photo chooser's result.
    ///
    /// `Cancelled` does nothing and returns `Ok(None)`.
    ///
    /// # Errors
    /// - [`Error::CaptureInProgress`] while a capture owns the buffers.
    /// - [`Error::Codec`] if the photo cannot be decoded; a notice is shown
    ///   and the buffers are left empty.
    pub fn photo_chosen(&self, choice: PhotoChoice) -> Result<Option<ImportReport>> {
        let PhotoChoice::Chosen(source) = choice else {
            debug!("photo chooser cancelled");
            return Ok(None);
        };
        if self.busy.get() {
            warn!("photo chosen during a capture, ignored");
            return Err(Error::CaptureInProgress);
        }

        match self.importer.import(&source, &self.context) {
            Ok(report) => {
                self.ui.play_capture_animation();
                self.emit(ControllerEvent::ImportCompleted(report.path));
                self.ui.navigate_after_import();
                Ok(Some(report))
            }
            Err(e) => {
                self.ui.show_notice(&self.config.messages.import_failed);
                self.emit(ControllerEvent::ImportFailed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> Receiver<ControllerEvent> {
        let (tx, rx) = async_channel::unbounded();
        self.subscribers.borrow_mut().push(tx);
        rx
    }

    /// Current state machine state.
    pub fn state(&self) -> CaptureState {
        self.state.get()
    }

    /// Whether a capture is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    /// Whether shutter keys reach the controller.
    pub fn shutter_binding(&self) -> ShutterBinding {
        self.shutter.get()
    }

    /// The orientation the layout was last computed for.
    pub fn orientation(&self) -> Orientation {
        self.orientation.current()
    }

    /// The camera session.
    pub const fn session(&self) -> &DeviceSession<D> {
        &self.session
    }

    /// The photo buffers captures and imports write to.
    pub const fn context(&self) -> &PhotoContext {
        &self.context
    }

    /// The UI port.
    pub const fn ui(&self) -> &U {
        &self.ui
    }

    /// Settings in use.
    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    async fn initialize_camera(&self) -> std::result::Result<Resolution, CameraError> {
        let sensor = self.config.sensor;
        let preview = self.config.preview_resolution;
        let available = self.session.available_capture_resolutions(sensor);
        let capture = select_capture_resolution(&available, self.config.aspect_range);

        self.session.open(sensor, preview).await?;
        if let Err(e) = self.session.configure(preview, capture).await {
            if e != CameraError::StaleSession {
                self.session.release();
            }
            return Err(e);
        }
        self.orientation.reapply(&self.session, &self.ui);
        Ok(capture)
    }

    async fn run_capture(&self) -> std::result::Result<(), CameraError> {
        self.context.reset();
        let mut sequence = self.session.create_capture_sequence(1)?;
        for frame in 0..sequence.len() {
            if let Some(frame) = sequence.frame_mut(frame) {
                frame.bind(
                    self.context.image().clone(),
                    self.context.thumbnail().clone(),
                );
            }
        }
        self.session.prepare(&mut sequence).await?;
        self.session.start_capture(&sequence).await
    }

    fn ensure_configured(&self) -> std::result::Result<(), CameraError> {
        match self.session.state() {
            SessionState::Configured => Ok(()),
            state => {
                debug!("camera is {state:?}, request rejected");
                Err(CameraError::SessionClosed)
            }
        }
    }

    // A reopened session belongs to a newer request; leave its flags alone.
    fn settle_discarded(&self) {
        if !self.session.is_open() {
            self.busy.set(false);
            self.state.set(CaptureState::Idle);
        }
    }

    fn set_shutter(&self, binding: ShutterBinding) {
        if self.shutter.replace(binding) != binding {
            self.ui
                .set_shutter_keys_attached(binding == ShutterBinding::Attached);
        }
    }

    fn emit(&self, event: ControllerEvent) {
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.try_send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::ChooserUnavailable;
    use std::rc::Rc;
    use viewfinder_camera::SensorLocation;
    use viewfinder_camera::mock::{MockCall, MockCamera, MockStep};

    #[derive(Debug, Default)]
    struct Ui {
        log: RefCell<Vec<String>>,
        chooser_broken: Cell<bool>,
    }

    impl Ui {
        fn push(&self, entry: impl Into<String>) {
            self.log.borrow_mut().push(entry.into());
        }

        fn has(&self, entry: &str) -> bool {
            self.log.borrow().iter().any(|e| e == entry)
        }
    }

    impl ViewfinderUi for Ui {
        fn set_controls_enabled(&self, enabled: bool) {
            self.push(format!("controls {enabled}"));
        }
        fn set_shutter_keys_attached(&self, attached: bool) {
            self.push(format!("shutter {attached}"));
        }
        fn show_progress(&self, message: &str) {
            self.push(format!("progress {message}"));
        }
        fn hide_progress(&self) {
            self.push("hide progress");
        }
        fn apply_layout(&self, layout: &Layout) {
            self.push(format!("layout {}", layout.rotation.degrees()));
        }
        fn play_capture_animation(&self) {
            self.push("animate");
        }
        fn stop_capture_animation(&self) {
            self.push("stop animation");
        }
        fn navigate_after_capture(&self) {
            self.push("navigate capture");
        }
        fn navigate_after_import(&self) {
            self.push("navigate import");
        }
        fn show_notice(&self, message: &str) {
            self.push(format!("notice {message}"));
        }
        fn open_photo_chooser(&self) -> std::result::Result<(), ChooserUnavailable> {
            if self.chooser_broken.get() {
                Err(ChooserUnavailable("busy".into()))
            } else {
                self.push("chooser");
                Ok(())
            }
        }
    }

    fn controller(camera: &MockCamera) -> CaptureController<MockCamera, Rc<Ui>> {
        CaptureController::new(camera.clone(), Rc::new(Ui::default()), ControllerConfig::default())
    }

    #[tokio::test]
    async fn enter_opens_and_configures() {
        let camera = MockCamera::new();
        let controller = controller(&camera);
        let events = controller.subscribe();

        controller.enter().await.unwrap();

        assert_eq!(
            controller.session().capture_resolution(),
            Some(Resolution::new(1280, 960))
        );
        assert_eq!(controller.shutter_binding(), ShutterBinding::Attached);
        assert!(controller.ui().has("progress Initializing camera..."));
        assert!(controller.ui().has("controls true"));
        assert_eq!(
            events.try_recv().unwrap(),
            ControllerEvent::CameraReady {
                capture: Resolution::new(1280, 960)
            }
        );
    }

    #[tokio::test]
    async fn configure_failure_releases_camera() {
        let camera = MockCamera::new().fail_at(MockStep::CaptureResolution);
        let controller = controller(&camera);

        let err = controller.enter().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Camera(CameraError::UnsupportedResolution { .. })
        ));
        assert!(!controller.session().is_open());
        assert_eq!(camera.count(MockCall::Close), 1);
        assert!(controller.ui().has("hide progress"));
        assert!(!controller.ui().has("controls true"));
        assert_eq!(controller.shutter_binding(), ShutterBinding::Detached);
    }

    #[tokio::test]
    async fn capture_fills_context_and_resets_focus_lock() {
        let camera = MockCamera::new();
        let controller = controller(&camera);
        controller.enter().await.unwrap();

        let outcome = controller.request_capture().await.unwrap();
        assert_eq!(outcome, CaptureOutcome::Completed);
        assert_eq!(controller.context().image().to_vec(), camera.frame_bytes());
        assert_eq!(
            controller.context().thumbnail().to_vec(),
            camera.thumbnail_bytes()
        );
        assert_eq!(controller.context().image().position(), 0);
        assert_eq!(camera.count(MockCall::ResetFocusLock), 1);
        assert!(controller.ui().has("navigate capture"));
        assert_eq!(controller.state(), CaptureState::Idle);
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn capture_failure_reenables_controls() {
        let camera = MockCamera::new();
        let controller = controller(&camera);
        controller.enter().await.unwrap();
        let _failing = camera.clone().fail_at(MockStep::Capture);

        let err = controller.request_capture().await.unwrap_err();
        assert!(matches!(err, Error::Camera(CameraError::CaptureFailed(_))));
        assert!(!controller.is_busy());
        assert_eq!(controller.state(), CaptureState::Idle);
        assert!(controller.ui().has("notice Taking the photo failed."));
        assert!(!controller.ui().has("animate"));
        assert!(!controller.ui().has("navigate capture"));
        assert_eq!(
            controller.ui().log.borrow().last().map(String::as_str),
            Some("controls true")
        );
    }

    #[tokio::test]
    async fn front_sensor_focus_is_unsupported() {
        let camera = MockCamera::new();
        let controller = CaptureController::new(
            camera.clone(),
            Rc::new(Ui::default()),
            ControllerConfig::default().with_sensor(SensorLocation::Front),
        );
        controller.enter().await.unwrap();

        let outcome = controller.request_focus().await.unwrap();
        assert_eq!(outcome, FocusOutcome::Unsupported);
        assert_eq!(camera.count(MockCall::Focus), 0);
        assert_eq!(controller.state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn capture_without_camera_is_an_error() {
        let camera = MockCamera::new();
        let controller = controller(&camera);
        assert!(matches!(
            controller.request_capture().await,
            Err(Error::Camera(CameraError::SessionClosed))
        ));
        assert!(!controller.is_busy());
    }

    #[test]
    fn chooser_failure_shows_notice() {
        let camera = MockCamera::new();
        let controller = controller(&camera);
        assert!(controller.choose_photo());

        controller.ui().chooser_broken.set(true);
        assert!(!controller.choose_photo());
        assert!(
            controller
                .ui()
                .has("notice An error occurred while choosing an image.")
        );
    }

    #[test]
    fn cancelled_choice_does_nothing() {
        let camera = MockCamera::new();
        let controller = controller(&camera);
        assert_eq!(controller.photo_chosen(PhotoChoice::Cancelled).unwrap(), None);
        assert!(controller.ui().log.borrow().is_empty());
    }
}
