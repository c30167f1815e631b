//! In-memory camera driver for tests.
//!
//! [`MockCamera`] records every device call, can fail any async step on
//! request, and can hold `open`, `focus` or `start_capture` until a test
//! releases them through a gate channel. Clones share state, so a test keeps
//! one clone for inspection and hands another to the code under test.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::rc::Rc;

use async_channel::{Receiver, Sender};

use crate::{
    CameraDriver, CameraError, CaptureSequence, DeviceHandle, FocusStatus, Resolution, Rotation,
    SensorLocation,
};

/// A recorded device call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockCall {
    /// `CameraDriver::open`.
    Open(SensorLocation, Resolution),
    /// `DeviceHandle::set_preview_resolution`.
    SetPreviewResolution(Resolution),
    /// `DeviceHandle::set_capture_resolution`.
    SetCaptureResolution(Resolution),
    /// `DeviceHandle::set_encode_rotation`.
    SetEncodeRotation(Rotation),
    /// `DeviceHandle::reset_focus_lock`.
    ResetFocusLock,
    /// `DeviceHandle::focus`.
    Focus,
    /// `DeviceHandle::prepare_capture` with the frame count.
    PrepareCapture(usize),
    /// `DeviceHandle::start_capture` with the frame count.
    StartCapture(usize),
    /// `DeviceHandle::close`.
    Close,
}

/// An async step that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockStep {
    /// Opening the device.
    Open,
    /// Setting the preview resolution.
    PreviewResolution,
    /// Setting the capture resolution.
    CaptureResolution,
    /// Preparing a capture sequence.
    Prepare,
    /// Running a capture sequence.
    Capture,
}

#[derive(Debug)]
struct MockState {
    resolutions: Vec<Resolution>,
    focus: HashMap<SensorLocation, bool>,
    focus_status: FocusStatus,
    failures: HashSet<MockStep>,
    calls: Vec<MockCall>,
    frame: Vec<u8>,
    thumbnail: Vec<u8>,
    rotation: Option<Rotation>,
    open_gate: Option<Receiver<()>>,
    focus_gate: Option<Receiver<()>>,
    capture_gate: Option<Receiver<()>>,
}

/// Recording camera driver.
#[derive(Debug, Clone)]
pub struct MockCamera {
    state: Rc<RefCell<MockState>>,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCamera {
    /// A back camera with autofocus and a front camera without, both
    /// offering 640x480, 1280x960, 800x600 and 1280x720.
    #[must_use]
    pub fn new() -> Self {
        let state = MockState {
            resolutions: vec![
                Resolution::new(640, 480),
                Resolution::new(1280, 960),
                Resolution::new(800, 600),
                Resolution::new(1280, 720),
            ],
            focus: HashMap::from([(SensorLocation::Back, true), (SensorLocation::Front, false)]),
            focus_status: FocusStatus::Focused,
            failures: HashSet::new(),
            calls: Vec::new(),
            // SOI, a short APP0 marker, EOI.
            frame: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x02, 0xFF, 0xD9],
            thumbnail: vec![0xFF, 0xD8, 0xFF, 0xD9],
            rotation: None,
            open_gate: None,
            focus_gate: None,
            capture_gate: None,
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// Replace the advertised capture resolutions.
    #[must_use]
    pub fn with_resolutions(self, resolutions: Vec<Resolution>) -> Self {
        self.state.borrow_mut().resolutions = resolutions;
        self
    }

    /// Set autofocus support for a sensor.
    #[must_use]
    pub fn with_focus_support(self, sensor: SensorLocation, supported: bool) -> Self {
        self.state.borrow_mut().focus.insert(sensor, supported);
        self
    }

    /// Make autofocus report that it could not focus.
    #[must_use]
    pub fn with_focus_status(self, status: FocusStatus) -> Self {
        self.state.borrow_mut().focus_status = status;
        self
    }

    /// Bytes written into the capture and thumbnail sinks.
    #[must_use]
    pub fn with_frame(self, frame: Vec<u8>, thumbnail: Vec<u8>) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.frame = frame;
            state.thumbnail = thumbnail;
        }
        self
    }

    /// Fail a step until [`Self::recover`] is called.
    #[must_use]
    pub fn fail_at(self, step: MockStep) -> Self {
        self.state.borrow_mut().failures.insert(step);
        self
    }

    /// Stop failing a step.
    pub fn recover(&self, step: MockStep) {
        self.state.borrow_mut().failures.remove(&step);
    }

    /// Hold every `open` until a message arrives on the returned sender.
    #[must_use]
    pub fn gate_open(&self) -> Sender<()> {
        let (tx, rx) = async_channel::unbounded();
        self.state.borrow_mut().open_gate = Some(rx);
        tx
    }

    /// Hold every `focus` until a message arrives on the returned sender.
    #[must_use]
    pub fn gate_focus(&self) -> Sender<()> {
        let (tx, rx) = async_channel::unbounded();
        self.state.borrow_mut().focus_gate = Some(rx);
        tx
    }

    /// Hold every `start_capture` until a message arrives on the returned
    /// sender.
    #[must_use]
    pub fn gate_capture(&self) -> Sender<()> {
        let (tx, rx) = async_channel::unbounded();
        self.state.borrow_mut().capture_gate = Some(rx);
        tx
    }

    /// Calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.borrow().calls.clone()
    }

    /// Number of times a call was recorded.
    #[must_use]
    pub fn count(&self, call: MockCall) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|recorded| **recorded == call)
            .count()
    }

    /// Number of `start_capture` calls, whatever the frame count.
    #[must_use]
    pub fn capture_count(&self) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| matches!(call, MockCall::StartCapture(_)))
            .count()
    }

    /// Last rotation pushed into any handle.
    #[must_use]
    pub fn rotation(&self) -> Option<Rotation> {
        self.state.borrow().rotation
    }

    /// Bytes written into each capture sink.
    #[must_use]
    pub fn frame_bytes(&self) -> Vec<u8> {
        self.state.borrow().frame.clone()
    }

    /// Bytes written into each thumbnail sink.
    #[must_use]
    pub fn thumbnail_bytes(&self) -> Vec<u8> {
        self.state.borrow().thumbnail.clone()
    }

    fn record(&self, call: MockCall) {
        self.state.borrow_mut().calls.push(call);
    }

    fn fails(&self, step: MockStep) -> bool {
        self.state.borrow().failures.contains(&step)
    }
}

async fn pass(gate: Option<Receiver<()>>) {
    if let Some(gate) = gate {
        // A closed gate lets everything through.
        let _ = gate.recv().await;
    }
}

impl CameraDriver for MockCamera {
    type Handle = MockHandle;

    fn available_capture_resolutions(&self, _sensor: SensorLocation) -> Vec<Resolution> {
        self.state.borrow().resolutions.clone()
    }

    fn is_focus_supported(&self, sensor: SensorLocation) -> bool {
        self.state
            .borrow()
            .focus
            .get(&sensor)
            .copied()
            .unwrap_or(false)
    }

    async fn open(
        &self,
        sensor: SensorLocation,
        initial: Resolution,
    ) -> Result<MockHandle, CameraError> {
        self.record(MockCall::Open(sensor, initial));
        let gate = self.state.borrow().open_gate.clone();
        pass(gate).await;

        if self.fails(MockStep::Open) {
            return Err(CameraError::DeviceUnavailable(format!(
                "{sensor:?} sensor is busy"
            )));
        }
        Ok(MockHandle {
            camera: self.clone(),
            closed: Cell::new(false),
        })
    }
}

/// Handle returned by [`MockCamera`].
#[derive(Debug)]
pub struct MockHandle {
    camera: MockCamera,
    closed: Cell<bool>,
}

impl MockHandle {
    fn check(&self, step: MockStep) -> Result<(), CameraError> {
        if self.closed.get() {
            return Err(CameraError::SessionClosed);
        }
        if self.camera.fails(step) {
            return Err(CameraError::CaptureFailed(format!("injected {step:?} failure")));
        }
        Ok(())
    }

    fn resolution(&self, step: MockStep, resolution: Resolution) -> Result<(), CameraError> {
        self.check(step).map_err(|e| CameraError::UnsupportedResolution {
            resolution,
            reason: e.to_string(),
        })
    }
}

impl DeviceHandle for MockHandle {
    async fn set_preview_resolution(&self, resolution: Resolution) -> Result<(), CameraError> {
        self.camera.record(MockCall::SetPreviewResolution(resolution));
        self.resolution(MockStep::PreviewResolution, resolution)
    }

    async fn set_capture_resolution(&self, resolution: Resolution) -> Result<(), CameraError> {
        self.camera.record(MockCall::SetCaptureResolution(resolution));
        self.resolution(MockStep::CaptureResolution, resolution)
    }

    fn set_encode_rotation(&self, rotation: Rotation) {
        self.camera.record(MockCall::SetEncodeRotation(rotation));
        self.camera.state.borrow_mut().rotation = Some(rotation);
    }

    fn reset_focus_lock(&self) {
        self.camera.record(MockCall::ResetFocusLock);
    }

    async fn focus(&self) -> FocusStatus {
        self.camera.record(MockCall::Focus);
        let gate = self.camera.state.borrow().focus_gate.clone();
        pass(gate).await;
        self.camera.state.borrow().focus_status
    }

    async fn prepare_capture(&self, sequence: &CaptureSequence) -> Result<(), CameraError> {
        self.camera.record(MockCall::PrepareCapture(sequence.len()));
        self.check(MockStep::Prepare)
    }

    async fn start_capture(&self, sequence: &CaptureSequence) -> Result<(), CameraError> {
        self.camera.record(MockCall::StartCapture(sequence.len()));
        let gate = self.camera.state.borrow().capture_gate.clone();
        pass(gate).await;
        self.check(MockStep::Capture)?;

        let (frame, thumbnail) = {
            let state = self.camera.state.borrow();
            (state.frame.clone(), state.thumbnail.clone())
        };
        for planned in sequence.frames() {
            let sinks = planned.capture_stream().zip(planned.thumbnail_stream());
            let Some((capture, thumb)) = sinks else {
                return Err(CameraError::InvalidSequence("unbound frame".into()));
            };
            write_sink(capture, &frame)?;
            write_sink(thumb, &thumbnail)?;
        }
        Ok(())
    }

    fn close(&self) {
        if !self.closed.replace(true) {
            self.camera.record(MockCall::Close);
        }
    }
}

fn write_sink(sink: &crate::PhotoBuffer, bytes: &[u8]) -> Result<(), CameraError> {
    sink.clone()
        .write_all(bytes)
        .map_err(|e| CameraError::CaptureFailed(e.to_string()))
}
