use thiserror::Error;

/// Errors returned by the remote service gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The service answered with a non-2xx status. `message` carries the
    /// server-provided `error` field when the body had one.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The request never produced a response (DNS, refused, timeout).
    #[error("request failed: {cause}")]
    Transport { cause: String },

    /// The service answered 2xx but the body did not match the contract.
    #[error("invalid response payload: {details}")]
    Decode { details: String },
}

/// Errors produced by the camera capture pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("camera access denied")]
    PermissionDenied,

    #[error("camera unavailable: {details}")]
    DeviceUnavailable { details: String },

    #[error("{operation} is not valid while the camera session is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
}

/// Errors surfaced at the submission workflow boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("a submission of this kind is already in progress")]
    AlreadyInProgress,

    #[error("no live capture available - start the camera before verifying")]
    MissingCapture,

    #[error("invalid {field}: {reason}")]
    ValidationFailed {
        field: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

impl WorkflowError {
    pub fn validation<S: Into<String>>(field: &'static str, reason: S) -> Self {
        Self::ValidationFailed {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    #[error("failed to publish event: {details}")]
    PublishFailed { details: String },
}

#[derive(Error, Debug)]
pub enum KioskError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Gateway error: {0}")]
    Api(#[from] ApiError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("System error: {message}")]
    System { message: String },
}

impl KioskError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, KioskError>;
