use crate::api::{AttendanceRecord, CheckInRequest, Gateway};
use crate::error::WorkflowError;
use crate::events::{EventBus, KioskEvent};
use crate::router::ViewId;
use crate::workflows::{InFlightGuard, WorkflowKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Records attendance for an already-verified employee. Degenerate workflow:
/// no capture, no confirmation, one POST, dashboard reload on success.
pub struct CheckInWorkflow {
    gateway: Arc<dyn Gateway>,
    events: Arc<EventBus>,
    in_flight: Arc<AtomicBool>,
    location: String,
    device_id: String,
}

impl CheckInWorkflow {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        events: Arc<EventBus>,
        location: String,
        device_id: String,
    ) -> Self {
        Self {
            gateway,
            events,
            in_flight: Arc::new(AtomicBool::new(false)),
            location,
            device_id,
        }
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn submit(
        &self,
        employee_id: i64,
        verification_method: &str,
    ) -> Result<Option<AttendanceRecord>, WorkflowError> {
        let _guard = InFlightGuard::claim(&self.in_flight)?;

        if employee_id <= 0 {
            return Err(WorkflowError::validation(
                "employee_id",
                "must be a positive id",
            ));
        }

        let request = CheckInRequest {
            employee_id,
            verification_method: verification_method.to_string(),
            location: self.location.clone(),
            device_id: self.device_id.clone(),
        };

        let response = match self.gateway.check_in(&request).await {
            Ok(response) => response,
            Err(e) => {
                self.events
                    .publish_lossy(KioskEvent::SubmissionCompleted {
                        kind: WorkflowKind::CheckIn,
                        success: false,
                    })
                    .await;
                return Err(e.into());
            }
        };

        info!("Check-in recorded for employee {}", employee_id);

        self.events
            .publish_lossy(KioskEvent::SubmissionCompleted {
                kind: WorkflowKind::CheckIn,
                success: true,
            })
            .await;
        self.events
            .publish_lossy(KioskEvent::ReloadRequested {
                view: ViewId::Dashboard,
            })
            .await;

        Ok(response.log)
    }
}
