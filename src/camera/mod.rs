mod device;
mod mock;
mod pipeline;

#[cfg(all(feature = "hardware-camera", target_os = "linux"))]
mod gst;


pub use device::{CameraDevice, CameraStream, CaptureSource, CapturedImage, Frame};
pub use mock::MockCameraDevice;
pub use pipeline::{CapturePipeline, SessionState};

#[cfg(all(feature = "hardware-camera", target_os = "linux"))]
pub use gst::GstCameraDevice;
