//! Capture device adapters.
//!
//! A [`CaptureDevice`] hands out at most one live [`CameraSession`] at a time.
//! The session owns the underlying stream and stops it when released or
//! dropped, so every exit path of a flow closes the camera.
//!
//! ## Implementations
//!
//! - [`DirectoryCamera`] - replays still images from a directory as a stream
//! - [`MockCamera`] - scripted device for tests (denial, warm-up, accounting)

mod directory;
mod mock;

pub use directory::DirectoryCamera;
pub use mock::{MockCamera, MockCameraStats};

use async_trait::async_trait;
use image::RgbImage;
use tracing::debug;

use crate::error::DeviceError;

/// A still frame taken from a live stream, at the stream's native size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    image: RgbImage,
}

impl RawFrame {
    /// Wrap a pixel buffer. Returns `None` for zero-sized buffers, which is
    /// what a stream reports before its video metrics are known.
    pub fn new(image: RgbImage) -> Option<Self> {
        if image.width() == 0 || image.height() == 0 {
            return None;
        }
        Some(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

/// A live capture stream produced by a device.
pub trait CameraStream: Send {
    /// Grab the current frame, or `None` if no frame is available yet.
    fn snapshot(&mut self) -> Option<RawFrame>;

    /// Stop all tracks. Called exactly once by [`CameraSession`].
    fn stop(&mut self);
}

/// Trait for camera devices.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Open the device and start streaming.
    ///
    /// This may prompt for permission and should be awaited.
    async fn acquire(&self) -> Result<CameraSession, DeviceError>;

    /// Human-readable device name for logs.
    fn name(&self) -> &str;
}

/// Exclusive ownership of an open capture stream.
///
/// Releasing is idempotent and also happens on drop.
pub struct CameraSession {
    stream: Option<Box<dyn CameraStream>>,
    device: String,
}

impl CameraSession {
    pub fn new(device: impl Into<String>, stream: Box<dyn CameraStream>) -> Self {
        Self {
            stream: Some(stream),
            device: device.into(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Grab a still frame. Returns `None` once released or while the stream
    /// is still warming up.
    pub fn snapshot(&mut self) -> Option<RawFrame> {
        self.stream.as_mut().and_then(|stream| stream.snapshot())
    }

    /// Stop the stream. Safe to call any number of times.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            debug!(device = %self.device, "Camera released");
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("device", &self.device)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Release whatever session is held in `slot`, if any.
pub fn release(slot: &mut Option<CameraSession>) {
    if let Some(mut session) = slot.take() {
        session.release();
    }
}
