use crate::config::CameraConfig;
use crate::error::CaptureError;
use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};

/// A single encoded frame pulled from a camera stream.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Encoded JPEG bytes
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,
}

/// An open hardware stream. Dropping the box without calling `shutdown()` is
/// not enough to release the device on every backend.
#[async_trait]
pub trait CameraStream: Send {
    /// Pull the next frame from the device.
    async fn next_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Release the underlying hardware handle.
    async fn shutdown(&mut self);
}

/// The host platform's media API, behind a seam so the pipeline can be driven
/// without hardware.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    async fn open(&self, config: &CameraConfig) -> Result<Box<dyn CameraStream>, CaptureError>;
}

/// Where a still image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSource {
    Camera,
    File,
}

/// An encoded still image ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    data: String,
    captured_at: DateTime<Utc>,
    source: CaptureSource,
}

impl CapturedImage {
    /// Encode a camera frame into a submission-ready still.
    pub fn from_frame(frame: &Frame) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(&frame.data),
            captured_at: frame.captured_at,
            source: CaptureSource::Camera,
        }
    }

    /// Accept an already-encoded image, e.g. from local file selection. A
    /// `data:image/...;base64,` prefix is stripped if present. This path never
    /// touches the camera session.
    pub fn from_encoded<S: Into<String>>(encoded: S) -> Self {
        let encoded = encoded.into();
        let data = match encoded.split_once(',') {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest.to_string(),
            _ => encoded,
        };
        Self {
            data,
            captured_at: Utc::now(),
            source: CaptureSource::File,
        }
    }

    /// Read and encode an image file from disk.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            captured_at: Utc::now(),
            source: CaptureSource::File,
        })
    }

    /// The base64 payload, without any data-URL prefix.
    pub fn as_base64(&self) -> &str {
        &self.data
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn source(&self) -> CaptureSource {
        self.source
    }
}
