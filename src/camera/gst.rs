use crate::camera::device::{CameraDevice, CameraStream, Frame};
use crate::config::CameraConfig;
use crate::error::CaptureError;
use async_trait::async_trait;
use chrono::Utc;
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// GStreamer-backed camera device for real hardware (v4l2, MJPEG).
pub struct GstCameraDevice;

impl GstCameraDevice {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GstCameraDevice {
    fn default() -> Self {
        Self::new()
    }
}

fn open_error(details: String) -> CaptureError {
    if details.contains("Permission denied") {
        CaptureError::PermissionDenied
    } else {
        CaptureError::DeviceUnavailable { details }
    }
}

fn pipeline_string(config: &CameraConfig) -> String {
    let (width, height) = config.resolution;
    format!(
        "v4l2src device=/dev/video{} io-mode=mmap do-timestamp=true ! \
         image/jpeg,width={},height={},framerate={}/1 ! \
         queue max-size-buffers=4 leaky=downstream ! \
         appsink name=sink sync=false max-buffers=4 drop=true emit-signals=false",
        config.index, width, height, config.fps
    )
}

#[async_trait]
impl CameraDevice for GstCameraDevice {
    async fn open(&self, config: &CameraConfig) -> Result<Box<dyn CameraStream>, CaptureError> {
        gstreamer::init().map_err(|e| open_error(format!("GStreamer init failed: {}", e)))?;

        let desc = pipeline_string(config);
        info!("Creating GStreamer pipeline: {}", desc);

        let pipeline = gstreamer::parse::launch(&desc)
            .map_err(|e| open_error(format!("failed to create pipeline: {}", e)))?
            .downcast::<Pipeline>()
            .map_err(|_| open_error("failed to downcast to Pipeline".to_string()))?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| open_error("appsink element missing from pipeline".to_string()))?
            .downcast::<AppSink>()
            .map_err(|_| open_error("failed to downcast to AppSink".to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let sample = appsink
                        .pull_sample()
                        .map_err(|_| gstreamer::FlowError::Eos)?;
                    let _ = tx.send(sample);
                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| open_error(format!("failed to start pipeline: {}", e)))?;

        debug!("GStreamer pipeline playing");
        Ok(Box::new(GstCameraStream {
            pipeline,
            samples: rx,
        }))
    }
}

struct GstCameraStream {
    pipeline: Pipeline,
    samples: mpsc::UnboundedReceiver<gstreamer::Sample>,
}

#[async_trait]
impl CameraStream for GstCameraStream {
    async fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        let sample = self
            .samples
            .recv()
            .await
            .ok_or_else(|| CaptureError::DeviceUnavailable {
                details: "camera stream ended".to_string(),
            })?;

        let buffer = sample.buffer().ok_or_else(|| CaptureError::DeviceUnavailable {
            details: "no buffer in sample".to_string(),
        })?;
        let caps = sample.caps().ok_or_else(|| CaptureError::DeviceUnavailable {
            details: "no caps in sample".to_string(),
        })?;
        let video_info = VideoInfo::from_caps(caps).map_err(|e| CaptureError::DeviceUnavailable {
            details: format!("failed to read video info: {}", e),
        })?;

        let map = buffer
            .map_readable()
            .map_err(|e| CaptureError::DeviceUnavailable {
                details: format!("failed to map buffer: {}", e),
            })?;

        Ok(Frame {
            data: map.as_slice().to_vec(),
            width: video_info.width(),
            height: video_info.height(),
            captured_at: Utc::now(),
        })
    }

    async fn shutdown(&mut self) {
        let _ = self.pipeline.set_state(gstreamer::State::Null);
        debug!("GStreamer pipeline released");
    }
}
