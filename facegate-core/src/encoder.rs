//! Still-frame encoding.
//!
//! Frames are encoded as baseline JPEG and wrapped in a `data:` URI so each
//! image is a self-contained string that can be embedded in a JSON body.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use serde::{Deserialize, Serialize};

use crate::capture::RawFrame;
use crate::error::{FacegateError, Result};

/// MIME type of every encoded image.
pub const IMAGE_MIME: &str = "image/jpeg";

/// Default JPEG quality (1-100), matching common browser canvas defaults.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// An encoded still image as a `data:image/jpeg;base64,...` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedImage(String);

impl EncodedImage {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The base64 payload after the data URI header.
    pub fn payload(&self) -> &str {
        self.0
            .split_once(',')
            .map(|(_, payload)| payload)
            .unwrap_or_default()
    }

    /// Decode the payload back into JPEG bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.payload())
            .map_err(|e| FacegateError::Encoding(format!("Invalid image payload: {e}")))
    }
}

impl std::fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Payloads run to tens of kilobytes; logs only need the size.
        write!(f, "{} ({} bytes base64)", IMAGE_MIME, self.payload().len())
    }
}

/// Encodes raw frames into [`EncodedImage`]s.
#[derive(Debug, Clone, Copy)]
pub struct ImageEncoder {
    quality: u8,
}

impl ImageEncoder {
    pub fn new() -> Self {
        Self::with_quality(DEFAULT_JPEG_QUALITY)
    }

    /// Create an encoder with the given JPEG quality, clamped to 1-100.
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode a frame at its native dimensions.
    ///
    /// Deterministic: the same pixels and quality always produce the same string.
    pub fn encode(&self, frame: &RawFrame) -> Result<EncodedImage> {
        let mut jpeg = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut jpeg, self.quality);
        frame
            .image()
            .write_with_encoder(encoder)
            .map_err(|e| FacegateError::Encoding(format!("JPEG encoding failed: {e}")))?;

        Ok(EncodedImage(format!(
            "data:{IMAGE_MIME};base64,{}",
            BASE64.encode(&jpeg)
        )))
    }
}

impl Default for ImageEncoder {
    fn default() -> Self {
        Self::new()
    }
}
