//! Capture device backed by a directory of still images.
//!
//! Each stream replays the PNG/JPEG files of the directory in file-name order,
//! one file per snapshot, wrapping around at the end. This stands in for a
//! webcam on headless machines and in end-to-end tests.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::{CameraSession, CameraStream, CaptureDevice, RawFrame};
use crate::error::DeviceError;

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// A camera that streams still images from a directory.
#[derive(Debug, Clone)]
pub struct DirectoryCamera {
    root: PathBuf,
    name: String,
}

impl DirectoryCamera {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = format!("directory:{}", root.display());
        Self { root, name }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn list_frames(&self) -> Result<Vec<PathBuf>, DeviceError> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DeviceError::NoDevice,
            ErrorKind::PermissionDenied => DeviceError::PermissionDenied,
            _ => DeviceError::Stream(format!("{}: {e}", self.root.display())),
        })?;

        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_frame_file(path))
            .collect();
        frames.sort();

        if frames.is_empty() {
            return Err(DeviceError::NoDevice);
        }
        Ok(frames)
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| FRAME_EXTENSIONS.contains(&ext.as_str()))
}

#[async_trait]
impl CaptureDevice for DirectoryCamera {
    #[instrument(level = "debug", skip(self), fields(root = %self.root.display()))]
    async fn acquire(&self) -> Result<CameraSession, DeviceError> {
        let frames = self.list_frames()?;
        info!(frames = frames.len(), "Directory camera opened");

        let stream = DirectoryStream { frames, next: 0 };
        Ok(CameraSession::new(self.name.clone(), Box::new(stream)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

struct DirectoryStream {
    frames: Vec<PathBuf>,
    next: usize,
}

impl CameraStream for DirectoryStream {
    fn snapshot(&mut self) -> Option<RawFrame> {
        let path = self.frames.get(self.next % self.frames.len().max(1))?.clone();
        self.next = self.next.wrapping_add(1);

        match image::open(&path) {
            Ok(image) => {
                debug!(path = %path.display(), "Frame loaded");
                RawFrame::new(image.to_rgb8())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to decode frame");
                None
            }
        }
    }

    fn stop(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_frame(dir: &Path, name: &str, width: u32, height: u32) {
        let image = RgbImage::from_pixel(width, height, Rgb([120, 80, 40]));
        image.save(dir.join(name)).unwrap();
    }

    #[tokio::test]
    async fn test_missing_directory_is_no_device() {
        let temp = TempDir::new().unwrap();
        let camera = DirectoryCamera::new(temp.path().join("absent"));
        assert_eq!(camera.acquire().await.unwrap_err(), DeviceError::NoDevice);
    }

    #[tokio::test]
    async fn test_directory_without_images_is_no_device() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("notes.txt"), b"not a frame").unwrap();
        let camera = DirectoryCamera::new(temp.path());
        assert_eq!(camera.acquire().await.unwrap_err(), DeviceError::NoDevice);
    }

    #[tokio::test]
    async fn test_frames_replayed_in_order_and_wrap() {
        let temp = TempDir::new().unwrap();
        write_frame(temp.path(), "a.png", 8, 6);
        write_frame(temp.path(), "b.png", 10, 4);

        let camera = DirectoryCamera::new(temp.path());
        let mut session = camera.acquire().await.unwrap();

        let sizes: Vec<_> = (0..3)
            .map(|_| {
                let frame = session.snapshot().unwrap();
                (frame.width(), frame.height())
            })
            .collect();
        assert_eq!(sizes, vec![(8, 6), (10, 4), (8, 6)]);

        session.release();
        assert!(session.snapshot().is_none());
    }

    #[test]
    fn test_frame_extensions() {
        assert!(is_frame_file(Path::new("face.JPG")));
        assert!(is_frame_file(Path::new("face.png")));
        assert!(!is_frame_file(Path::new("face.gif")));
        assert!(!is_frame_file(Path::new("face")));
    }
}
