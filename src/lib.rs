pub mod api;
pub mod camera;
pub mod config;
pub mod error;
pub mod events;
pub mod input;
pub mod kiosk;
pub mod router;
pub mod store;
pub mod workflows;

#[cfg(test)]
mod testutil;

pub use api::{ApiClient, Gateway};
pub use camera::{CameraDevice, CapturePipeline, CapturedImage, MockCameraDevice, SessionState};
pub use config::KioskConfig;
pub use error::{ApiError, CaptureError, KioskError, Result, WorkflowError};
pub use events::{EventBus, KioskEvent};
pub use input::{KeyInputHandler, KioskCommand};
pub use kiosk::KioskController;
pub use router::{ViewId, ViewRouter};
pub use store::{FraudOverview, ViewStore};
pub use workflows::{
    AlertResolution, AlertResolutionWorkflow, CheckInWorkflow, Confirmer, RegistrationForm,
    RegistrationOutcome, RegistrationWorkflow, StaticConfirmer, VerificationWorkflow, WorkflowKind,
};

#[cfg(all(feature = "hardware-camera", target_os = "linux"))]
pub use camera::GstCameraDevice;
