use crate::api::{FraudAlert, Gateway, ResolveRequest};
use crate::error::WorkflowError;
use crate::events::{EventBus, KioskEvent};
use crate::router::ViewId;
use crate::workflows::{Confirmer, InFlightGuard, WorkflowKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub enum AlertResolution {
    /// The operator declined the confirmation; nothing was sent.
    Cancelled,
    Resolved { alert: Option<FraudAlert> },
}

/// Marks one fraud alert resolved. No capture step; the payload is a fixed
/// `resolved` status plus an optional investigation note. Resolving an alert
/// changes both the fraud view and the dashboard aggregates, so success
/// reloads both.
pub struct AlertResolutionWorkflow {
    gateway: Arc<dyn Gateway>,
    events: Arc<EventBus>,
    in_flight: Arc<AtomicBool>,
}

impl AlertResolutionWorkflow {
    pub fn new(gateway: Arc<dyn Gateway>, events: Arc<EventBus>) -> Self {
        Self {
            gateway,
            events,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn resolve(
        &self,
        alert_id: i64,
        notes: Option<String>,
        confirmer: &dyn Confirmer,
    ) -> Result<AlertResolution, WorkflowError> {
        // Confirmation happens before anything is claimed or sent
        let prompt = format!("Resolve fraud alert #{}?", alert_id);
        if !confirmer.confirm(&prompt).await {
            info!("Alert {} resolution cancelled by operator", alert_id);
            return Ok(AlertResolution::Cancelled);
        }

        let _guard = InFlightGuard::claim(&self.in_flight)?;

        let request = ResolveRequest {
            status: "resolved".to_string(),
            notes,
        };

        let response = match self.gateway.resolve_alert(alert_id, &request).await {
            Ok(response) => response,
            Err(e) => {
                self.events
                    .publish_lossy(KioskEvent::SubmissionCompleted {
                        kind: WorkflowKind::AlertResolution,
                        success: false,
                    })
                    .await;
                return Err(e.into());
            }
        };

        info!("Alert {} marked resolved", alert_id);

        self.events
            .publish_lossy(KioskEvent::SubmissionCompleted {
                kind: WorkflowKind::AlertResolution,
                success: true,
            })
            .await;
        self.events
            .publish_lossy(KioskEvent::ReloadRequested {
                view: ViewId::Fraud,
            })
            .await;
        self.events
            .publish_lossy(KioskEvent::ReloadRequested {
                view: ViewId::Dashboard,
            })
            .await;

        Ok(AlertResolution::Resolved {
            alert: response.alert,
        })
    }
}
