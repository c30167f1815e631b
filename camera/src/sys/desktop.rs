//! Desktop webcam driver using nokhwa.
//!
//! Desktops have no front/back notion: the back sensor maps to the first
//! webcam and the front sensor to the second. Webcams expose no autofocus
//! control, and the encoding rotation is applied to the pixels before the
//! JPEG is written.

use std::cell::{Cell, RefCell};
use std::io::Write;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use log::{debug, warn};
use nokhwa::Camera as NokhwaCamera;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};

use crate::{
    CameraDriver, CameraError, CaptureSequence, DeviceHandle, FocusStatus, PhotoBuffer,
    Resolution, Rotation, SensorLocation,
};

const JPEG_QUALITY: u8 = 90;
const THUMBNAIL_WIDTH: u32 = 160;

const fn camera_index(sensor: SensorLocation) -> CameraIndex {
    match sensor {
        SensorLocation::Back => CameraIndex::Index(0),
        SensorLocation::Front => CameraIndex::Index(1),
    }
}

fn to_nokhwa(resolution: Resolution) -> nokhwa::utils::Resolution {
    nokhwa::utils::Resolution::new(resolution.width, resolution.height)
}

/// Driver for webcams reachable through nokhwa.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopDriver;

impl CameraDriver for DesktopDriver {
    type Handle = DesktopHandle;

    fn available_capture_resolutions(&self, sensor: SensorLocation) -> Vec<Resolution> {
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);
        let formats = NokhwaCamera::new(camera_index(sensor), requested)
            .and_then(|mut camera| camera.compatible_camera_formats());

        match formats {
            Ok(formats) => {
                let mut resolutions: Vec<Resolution> = Vec::new();
                for format in formats {
                    let res = format.resolution();
                    let res = Resolution::new(res.width(), res.height());
                    if !resolutions.contains(&res) {
                        resolutions.push(res);
                    }
                }
                resolutions
            }
            Err(e) => {
                warn!("failed to query {sensor:?} webcam formats: {e}");
                Vec::new()
            }
        }
    }

    fn is_focus_supported(&self, _sensor: SensorLocation) -> bool {
        false
    }

    async fn open(
        &self,
        sensor: SensorLocation,
        initial: Resolution,
    ) -> Result<DesktopHandle, CameraError> {
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::HighestResolution(
            to_nokhwa(initial),
        ));
        let camera = NokhwaCamera::new(camera_index(sensor), requested)
            .map_err(|e| CameraError::DeviceUnavailable(e.to_string()))?;

        let current = camera.resolution();
        let preview = Resolution::new(current.width(), current.height());
        debug!("opened {sensor:?} webcam at {preview}");

        Ok(DesktopHandle {
            camera: RefCell::new(Some(camera)),
            preview: Cell::new(preview),
            capture: Cell::new(Resolution::ZERO),
            rotation: Cell::new(Rotation::Deg0),
        })
    }
}

/// An open webcam.
#[derive(Debug)]
pub struct DesktopHandle {
    camera: RefCell<Option<NokhwaCamera>>,
    preview: Cell<Resolution>,
    capture: Cell<Resolution>,
    rotation: Cell<Rotation>,
}

impl DesktopHandle {
    fn with_camera<T>(
        &self,
        f: impl FnOnce(&mut NokhwaCamera) -> Result<T, CameraError>,
    ) -> Result<T, CameraError> {
        let mut guard = self.camera.borrow_mut();
        let camera = guard.as_mut().ok_or(CameraError::SessionClosed)?;
        f(camera)
    }

    fn set_resolution(&self, resolution: Resolution) -> Result<(), CameraError> {
        self.with_camera(|camera| {
            camera
                .set_resolution(to_nokhwa(resolution))
                .map_err(|e| CameraError::UnsupportedResolution {
                    resolution,
                    reason: e.to_string(),
                })
        })
    }

    fn grab(&self) -> Result<RgbImage, CameraError> {
        self.with_camera(|camera| {
            if !camera.is_stream_open() {
                camera
                    .open_stream()
                    .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
            }
            let frame = camera
                .frame()
                .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
            let size = frame.resolution();
            let decoded = frame
                .decode_image::<RgbFormat>()
                .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
            RgbImage::from_raw(size.width(), size.height(), decoded.into_raw())
                .ok_or_else(|| CameraError::CaptureFailed("frame size mismatch".into()))
        })
    }
}

/// Height of a `THUMBNAIL_WIDTH` wide thumbnail keeping the aspect ratio,
/// at least one pixel.
fn thumbnail_height(width: u32, height: u32) -> u32 {
    let scaled = u64::from(height) * u64::from(THUMBNAIL_WIDTH) / u64::from(width.max(1));
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

fn rotate(image: RgbImage, rotation: Rotation) -> RgbImage {
    match rotation {
        Rotation::Deg0 => image,
        Rotation::Deg90 => image::imageops::rotate90(&image),
        Rotation::Deg180 => image::imageops::rotate180(&image),
        Rotation::Deg270 => image::imageops::rotate270(&image),
    }
}

fn write_jpeg(sink: &PhotoBuffer, image: &RgbImage) -> Result<(), CameraError> {
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY)
        .encode_image(image)
        .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
    sink.clone()
        .write_all(&encoded)
        .map_err(|e| CameraError::CaptureFailed(e.to_string()))
}

impl DeviceHandle for DesktopHandle {
    async fn set_preview_resolution(&self, resolution: Resolution) -> Result<(), CameraError> {
        self.set_resolution(resolution)?;
        self.preview.set(resolution);
        Ok(())
    }

    async fn set_capture_resolution(&self, resolution: Resolution) -> Result<(), CameraError> {
        // Webcams stream at one size; the capture size is applied per shot.
        self.capture.set(resolution);
        Ok(())
    }

    fn set_encode_rotation(&self, rotation: Rotation) {
        self.rotation.set(rotation);
    }

    fn reset_focus_lock(&self) {}

    async fn focus(&self) -> FocusStatus {
        FocusStatus::NotFocused
    }

    async fn prepare_capture(&self, _sequence: &CaptureSequence) -> Result<(), CameraError> {
        let capture = self.capture.get();
        if !capture.is_zero() && capture != self.preview.get() {
            self.set_resolution(capture)
                .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        }
        Ok(())
    }

    async fn start_capture(&self, sequence: &CaptureSequence) -> Result<(), CameraError> {
        let result = sequence.frames().iter().try_for_each(|planned| {
            let image = rotate(self.grab()?, self.rotation.get());
            let height = thumbnail_height(image.width(), image.height());
            let thumbnail = image::imageops::thumbnail(&image, THUMBNAIL_WIDTH, height);

            if let Some(sink) = planned.capture_stream() {
                write_jpeg(sink, &image)?;
            }
            if let Some(sink) = planned.thumbnail_stream() {
                write_jpeg(sink, &thumbnail)?;
            }
            Ok(())
        });

        let preview = self.preview.get();
        let capture = self.capture.get();
        if !capture.is_zero() && capture != preview {
            if let Err(e) = self.set_resolution(preview) {
                warn!("failed to restore webcam preview resolution: {e}");
            }
        }
        result
    }

    fn close(&self) {
        let released = self.camera.borrow_mut().take();
        if let Some(mut camera) = released {
            if let Err(e) = camera.stop_stream() {
                warn!("failed to stop webcam stream: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumbnail_keeps_aspect_ratio() {
        assert_eq!(thumbnail_height(640, 480), 120);
        assert_eq!(thumbnail_height(480, 640), 213);
    }

    #[test]
    fn thumbnail_height_saturates() {
        assert_eq!(thumbnail_height(1, u32::MAX), u32::MAX);
        assert_eq!(thumbnail_height(0, 10), 1600);
        assert_eq!(thumbnail_height(10_000, 1), 1);
    }
}
