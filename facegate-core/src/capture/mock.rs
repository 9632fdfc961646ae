//! Mock camera for testing.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use image::{ImageBuffer, Rgb, RgbImage};

use super::{CameraSession, CameraStream, CaptureDevice, RawFrame};
use crate::error::DeviceError;

/// Counters describing how a [`MockCamera`] has been used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockCameraStats {
    /// Successful acquisitions.
    pub acquisitions: usize,
    /// Streams stopped.
    pub releases: usize,
    /// Streams currently open.
    pub open_streams: usize,
    /// Highest number of simultaneously open streams.
    pub peak_open_streams: usize,
    /// Frames handed out.
    pub snapshots: usize,
}

#[derive(Debug, Default)]
struct MockState {
    stats: MockCameraStats,
    failure: Option<DeviceError>,
}

/// Mock camera producing deterministic synthetic frames.
/// WARNING: test double only, no real device is touched!
#[derive(Clone)]
pub struct MockCamera {
    state: Arc<Mutex<MockState>>,
    width: u32,
    height: u32,
    warmup_frames: usize,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::with_size(64, 48)
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            width,
            height,
            warmup_frames: 0,
        }
    }

    /// Every acquisition fails with `error` until [`MockCamera::allow`] is called.
    pub fn failing(error: DeviceError) -> Self {
        let camera = Self::new();
        camera.lock().failure = Some(error);
        camera
    }

    /// Each new stream reports "not ready" for its first `frames` snapshots.
    pub fn with_warmup(mut self, frames: usize) -> Self {
        self.warmup_frames = frames;
        self
    }

    /// Clear a configured acquisition failure.
    pub fn allow(&self) {
        self.lock().failure = None;
    }

    pub fn deny(&self, error: DeviceError) {
        self.lock().failure = Some(error);
    }

    pub fn stats(&self) -> MockCameraStats {
        self.lock().stats
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned lock only means a test panicked mid-update; the counters are still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureDevice for MockCamera {
    async fn acquire(&self) -> Result<CameraSession, DeviceError> {
        let mut state = self.lock();
        if let Some(error) = state.failure.clone() {
            return Err(error);
        }

        state.stats.acquisitions += 1;
        state.stats.open_streams += 1;
        state.stats.peak_open_streams = state.stats.peak_open_streams.max(state.stats.open_streams);

        let stream = MockStream {
            state: Arc::clone(&self.state),
            width: self.width,
            height: self.height,
            warmup_remaining: self.warmup_frames,
            frame_index: 0,
        };
        Ok(CameraSession::new(self.name(), Box::new(stream)))
    }

    fn name(&self) -> &str {
        "mock-camera"
    }
}

struct MockStream {
    state: Arc<Mutex<MockState>>,
    width: u32,
    height: u32,
    warmup_remaining: usize,
    frame_index: u32,
}

impl CameraStream for MockStream {
    fn snapshot(&mut self) -> Option<RawFrame> {
        if self.warmup_remaining > 0 {
            self.warmup_remaining -= 1;
            return RawFrame::new(RgbImage::new(0, 0));
        }

        let frame = RawFrame::new(synthetic_frame(self.width, self.height, self.frame_index))?;
        self.frame_index += 1;
        self.state.lock().unwrap_or_else(|e| e.into_inner()).stats.snapshots += 1;
        Some(frame)
    }

    fn stop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.stats.releases += 1;
        state.stats.open_streams = state.stats.open_streams.saturating_sub(1);
    }
}

/// Gradient pattern shifted by `index` so consecutive frames differ.
fn synthetic_frame(width: u32, height: u32, index: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        let r = ((x * 255) / width.max(1)) as u8;
        let g = ((y * 255) / height.max(1)) as u8;
        let b = (index.wrapping_mul(40) % 256) as u8;
        Rgb([r, g, b])
    })
}
