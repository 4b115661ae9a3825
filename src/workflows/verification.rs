use crate::api::{Gateway, VerifyRequest, VerifyResponse};
use crate::camera::CapturePipeline;
use crate::error::{CaptureError, WorkflowError};
use crate::events::{EventBus, KioskEvent};
use crate::router::{ViewId, ViewRouter};
use crate::store::ViewStore;
use crate::workflows::{InFlightGuard, WorkflowKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

/// Verifies an employee against the live camera feed. The snapshot is taken at
/// submission time, so the payload reflects what the preview showed when the
/// operator confirmed. The camera session stays active afterwards; only
/// leaving the verification view releases it.
pub struct VerificationWorkflow {
    gateway: Arc<dyn Gateway>,
    pipeline: Arc<CapturePipeline>,
    router: Arc<ViewRouter>,
    store: Arc<ViewStore>,
    events: Arc<EventBus>,
    in_flight: Arc<AtomicBool>,
}

impl VerificationWorkflow {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        pipeline: Arc<CapturePipeline>,
        router: Arc<ViewRouter>,
        store: Arc<ViewStore>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            gateway,
            pipeline,
            router,
            store,
            events,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn submit(&self, employee_id: i64) -> Result<VerifyResponse, WorkflowError> {
        let _guard = InFlightGuard::claim(&self.in_flight)?;

        if employee_id <= 0 {
            return Err(WorkflowError::validation(
                "employee_id",
                "must be a positive id",
            ));
        }

        // Live capture is a precondition: no session, no network call
        let snapshot = match self.pipeline.snapshot() {
            Ok(snapshot) => snapshot,
            Err(CaptureError::InvalidState { .. }) => {
                return Err(WorkflowError::MissingCapture);
            }
            Err(other) => return Err(other.into()),
        };

        let request = VerifyRequest {
            employee_id,
            biometric_data: snapshot.as_base64().to_string(),
        };

        let result = self.gateway.verify(&request).await;

        match result {
            Ok(response) => {
                // The view may have changed while the request was in flight;
                // a stale result must not touch another view's display state
                if self.router.active() == ViewId::Verification {
                    self.store.set_verification(response.clone());
                    self.events
                        .publish_lossy(KioskEvent::DataLoaded {
                            view: ViewId::Verification,
                            timestamp: SystemTime::now(),
                        })
                        .await;
                } else {
                    debug!("Verification finished after leaving the view, result dropped");
                }

                info!(
                    "Verification for employee {}: {} ({:.1}% confidence)",
                    employee_id,
                    if response.verified { "match" } else { "no match" },
                    response.confidence
                );
                self.events
                    .publish_lossy(KioskEvent::SubmissionCompleted {
                        kind: WorkflowKind::Verification,
                        success: true,
                    })
                    .await;
                Ok(response)
            }
            Err(e) => {
                self.events
                    .publish_lossy(KioskEvent::SubmissionCompleted {
                        kind: WorkflowKind::Verification,
                        success: false,
                    })
                    .await;
                Err(e.into())
            }
        }
    }
}
