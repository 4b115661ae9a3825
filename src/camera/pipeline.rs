use crate::camera::device::{CameraDevice, CameraStream, CapturedImage, Frame};
use crate::config::CameraConfig;
use crate::error::CaptureError;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Externally observable state of the camera session. At most one session
/// exists process-wide; the pipeline owns it exclusively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Inactive,
    Requesting,
    Active,
    Error(String),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Inactive => "inactive",
            SessionState::Requesting => "requesting",
            SessionState::Active => "active",
            SessionState::Error(_) => "error",
        }
    }
}

struct ActiveSession {
    cancel: CancellationToken,
    pump: tokio::task::JoinHandle<()>,
}

/// Camera capture lifecycle:
///
/// ```text
/// Inactive --start()--> Requesting --granted--> Active
/// Requesting --denied/error--> Error
/// Active --stop()--> Inactive
/// Active --snapshot()--> Active, returns CapturedImage
/// Error --start()--> Requesting   (retry allowed)
/// ```
///
/// While `Active`, a pump task streams frames from the device into a
/// latest-frame slot; `snapshot()` encodes whatever the preview is currently
/// showing, so a capture always reflects the live feed at confirmation time.
pub struct CapturePipeline {
    device: Arc<dyn CameraDevice>,
    config: CameraConfig,
    state: Arc<RwLock<SessionState>>,
    session: Mutex<Option<ActiveSession>>,
    latest: Arc<RwLock<Option<Frame>>>,
}

impl CapturePipeline {
    pub fn new(device: Arc<dyn CameraDevice>, config: CameraConfig) -> Self {
        Self {
            device,
            config,
            state: Arc::new(RwLock::new(SessionState::Inactive)),
            session: Mutex::new(None),
            latest: Arc::new(RwLock::new(None)),
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn is_active(&self) -> bool {
        matches!(*self.state.read(), SessionState::Active)
    }

    /// Request camera access and start the preview stream. Idempotent: calling
    /// while a session is already active or being requested is a no-op.
    pub async fn start(&self) -> Result<(), CaptureError> {
        let mut session = self.session.lock().await;

        match &*self.state.read() {
            SessionState::Active | SessionState::Requesting => {
                debug!("Camera session already running, start() is a no-op");
                return Ok(());
            }
            SessionState::Inactive | SessionState::Error(_) => {}
        }

        // A pump left over from a session that died mid-stream must be
        // reaped before requesting a new device handle
        if let Some(stale) = session.take() {
            stale.cancel.cancel();
            let _ = tokio::time::timeout(Duration::from_secs(3), stale.pump).await;
        }

        *self.state.write() = SessionState::Requesting;
        info!("Requesting camera device {}", self.config.index);

        let stream = match self.device.open(&self.config).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Camera access failed: {}", e);
                *self.state.write() = SessionState::Error(e.to_string());
                return Err(e);
            }
        };

        let cancel = CancellationToken::new();
        let pump = tokio::spawn(run_preview_pump(
            stream,
            Arc::clone(&self.latest),
            Arc::clone(&self.state),
            cancel.clone(),
        ));

        *session = Some(ActiveSession { cancel, pump });
        *self.state.write() = SessionState::Active;
        info!("Camera session active");

        Ok(())
    }

    /// Capture the current preview frame. Valid only while `Active`.
    pub fn snapshot(&self) -> Result<CapturedImage, CaptureError> {
        {
            let state = self.state.read();
            if !matches!(*state, SessionState::Active) {
                return Err(CaptureError::InvalidState {
                    operation: "snapshot",
                    state: state.name(),
                });
            }
        }

        let latest = self.latest.read();
        let frame = latest.as_ref().ok_or_else(|| CaptureError::DeviceUnavailable {
            details: "no frame received from the camera yet".to_string(),
        })?;

        debug!(
            "Snapshot taken ({}x{}, {} bytes)",
            frame.width,
            frame.height,
            frame.data.len()
        );
        Ok(CapturedImage::from_frame(frame))
    }

    /// Stop the preview stream and release the hardware handle. Valid and
    /// idempotent from every state; always leaves the session `Inactive`.
    pub async fn stop(&self) {
        let mut session = self.session.lock().await;

        if let Some(active) = session.take() {
            active.cancel.cancel();
            match tokio::time::timeout(Duration::from_secs(3), active.pump).await {
                Ok(Ok(())) => debug!("Preview pump completed"),
                Ok(Err(e)) => warn!("Preview pump join failed: {}", e),
                Err(_) => warn!("Preview pump did not stop within timeout"),
            }
        }

        *self.latest.write() = None;
        *self.state.write() = SessionState::Inactive;
        info!("Camera session released");
    }

    /// Wait until the preview has produced at least one frame. Useful right
    /// after `start()`, before the first `snapshot()`.
    pub async fn wait_for_preview(&self, timeout: Duration) -> Result<(), CaptureError> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            {
                let state = self.state.read();
                if !matches!(*state, SessionState::Active) {
                    return Err(CaptureError::InvalidState {
                        operation: "wait_for_preview",
                        state: state.name(),
                    });
                }
            }
            if self.latest.read().is_some() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(CaptureError::DeviceUnavailable {
                    details: "no frame received before the preview timeout".to_string(),
                });
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

async fn run_preview_pump(
    mut stream: Box<dyn CameraStream>,
    latest: Arc<RwLock<Option<Frame>>>,
    state: Arc<RwLock<SessionState>>,
    cancel: CancellationToken,
) {
    debug!("Preview pump started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            frame = stream.next_frame() => match frame {
                Ok(frame) => {
                    *latest.write() = Some(frame);
                }
                Err(e) => {
                    warn!("Camera stream failed: {}", e);
                    *state.write() = SessionState::Error(e.to_string());
                    break;
                }
            }
        }
    }

    stream.shutdown().await;
    debug!("Preview pump stopped");
}
