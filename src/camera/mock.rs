use crate::camera::device::{CameraDevice, CameraStream, Frame};
use crate::config::CameraConfig;
use crate::error::CaptureError;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tracing::debug;

/// How the mock device should answer `open()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockBehavior {
    Grant,
    Deny,
    Absent,
}

/// Mock camera device for running the console without real hardware. Produces
/// synthetic MJPEG frames at the configured frame rate.
pub struct MockCameraDevice {
    behavior: MockBehavior,
}

impl MockCameraDevice {
    /// A device that grants access and streams synthetic frames.
    pub fn new() -> Self {
        Self {
            behavior: MockBehavior::Grant,
        }
    }

    /// A device that refuses access, as if the operator denied the permission
    /// prompt.
    pub fn denying() -> Self {
        Self {
            behavior: MockBehavior::Deny,
        }
    }

    /// A device that behaves as if no camera is attached.
    pub fn unavailable() -> Self {
        Self {
            behavior: MockBehavior::Absent,
        }
    }
}

impl Default for MockCameraDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraDevice for MockCameraDevice {
    async fn open(&self, config: &CameraConfig) -> Result<Box<dyn CameraStream>, CaptureError> {
        match self.behavior {
            MockBehavior::Grant => {
                debug!(
                    "Opening mock camera {} ({}x{} @ {}fps)",
                    config.index, config.resolution.0, config.resolution.1, config.fps
                );
                Ok(Box::new(MockCameraStream::new(config)))
            }
            MockBehavior::Deny => Err(CaptureError::PermissionDenied),
            MockBehavior::Absent => Err(CaptureError::DeviceUnavailable {
                details: format!("no camera at index {}", config.index),
            }),
        }
    }
}

struct MockCameraStream {
    width: u32,
    height: u32,
    frame_counter: u64,
    interval: tokio::time::Interval,
}

impl MockCameraStream {
    fn new(config: &CameraConfig) -> Self {
        let frame_interval = Duration::from_millis(1000 / config.fps.max(1) as u64);
        Self {
            width: config.resolution.0,
            height: config.resolution.1,
            frame_counter: 0,
            interval: tokio::time::interval(frame_interval),
        }
    }
}

#[async_trait]
impl CameraStream for MockCameraStream {
    async fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        self.interval.tick().await;

        let frame_id = self.frame_counter;
        self.frame_counter += 1;

        // Minimal JFIF header followed by a varying payload and EOI marker, so
        // consecutive frames differ the way a live feed would
        let mut data = vec![
            0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x01,
            0x00, 0x48, 0x00, 0x48, 0x00, 0x00,
        ];
        let pattern_size = 1000 + (frame_id % 500) as usize;
        let pattern_byte = (frame_id % 256) as u8;
        data.extend(vec![pattern_byte; pattern_size]);
        data.extend_from_slice(&[0xFF, 0xD9]);

        Ok(Frame {
            data,
            width: self.width,
            height: self.height,
            captured_at: Utc::now(),
        })
    }

    async fn shutdown(&mut self) {
        debug!("Mock camera stream released after {} frames", self.frame_counter);
    }
}
