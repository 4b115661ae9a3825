use crate::api::{EmployeeRecord, Gateway, RegisterRequest};
use crate::camera::CapturedImage;
use crate::error::WorkflowError;
use crate::events::{EventBus, KioskEvent};
use crate::router::ViewId;
use crate::workflows::{InFlightGuard, WorkflowKind};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Operator-entered registration fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationForm {
    pub name: String,
    pub national_id: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationOutcome {
    pub employee: Option<EmployeeRecord>,
    pub duplicates_found: u32,
}

impl RegistrationOutcome {
    /// A non-zero duplicate count is an advisory, not a failure: the
    /// registration went through, but the service flagged similar records.
    pub fn duplicates_advisory(&self) -> Option<String> {
        if self.duplicates_found == 0 {
            return None;
        }
        Some(format!(
            "{} possible duplicate record(s) flagged for review",
            self.duplicates_found
        ))
    }
}

/// The kiosk has no fingerprint reader; registrations carry a locally
/// synthesized placeholder token instead of real biometric data.
pub fn synthesize_fingerprint_token() -> String {
    format!("fp-{}", Uuid::new_v4().simple())
}

/// Registers a new employee: optional photo (camera snapshot or local file),
/// placeholder fingerprint token, one POST, dashboard reload on success.
pub struct RegistrationWorkflow {
    gateway: Arc<dyn Gateway>,
    events: Arc<EventBus>,
    in_flight: Arc<AtomicBool>,
    pending_photo: Mutex<Option<CapturedImage>>,
    operator: String,
}

impl RegistrationWorkflow {
    pub fn new(gateway: Arc<dyn Gateway>, events: Arc<EventBus>, operator: String) -> Self {
        Self {
            gateway,
            events,
            in_flight: Arc::new(AtomicBool::new(false)),
            pending_photo: Mutex::new(None),
            operator,
        }
    }

    /// Attach a photo to the next submission. Replaces any previous one.
    pub fn attach_photo(&self, photo: CapturedImage) {
        *self.pending_photo.lock() = Some(photo);
    }

    /// Drop the pending photo without submitting.
    pub fn discard_photo(&self) {
        *self.pending_photo.lock() = None;
    }

    pub fn has_photo(&self) -> bool {
        self.pending_photo.lock().is_some()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn submit(
        &self,
        form: &RegistrationForm,
    ) -> Result<RegistrationOutcome, WorkflowError> {
        let _guard = InFlightGuard::claim(&self.in_flight)?;

        let name = form.name.trim();
        if name.is_empty() {
            return Err(WorkflowError::validation("name", "must not be empty"));
        }

        let photo = self.pending_photo.lock().clone();
        let request = RegisterRequest {
            name: name.to_string(),
            national_id: form.national_id.clone(),
            department: form.department.clone(),
            position: form.position.clone(),
            phone: form.phone.clone(),
            email: form.email.clone(),
            photo_data: photo.as_ref().map(|p| p.as_base64().to_string()),
            fingerprint_data: synthesize_fingerprint_token(),
            created_by: self.operator.clone(),
        };

        let response = match self.gateway.register(&request).await {
            Ok(response) => response,
            Err(e) => {
                // Keep the form's photo so the operator can retry without
                // re-capturing
                self.events
                    .publish_lossy(KioskEvent::SubmissionCompleted {
                        kind: WorkflowKind::Registration,
                        success: false,
                    })
                    .await;
                return Err(e.into());
            }
        };

        // The attempt's capture is spent once the service accepted it
        *self.pending_photo.lock() = None;

        info!(
            "Registered employee{} ({} duplicates flagged)",
            response
                .employee
                .as_ref()
                .map(|e| format!(" {}", e.name))
                .unwrap_or_default(),
            response.duplicates_found
        );

        let outcome = RegistrationOutcome {
            employee: response.employee,
            duplicates_found: response.duplicates_found,
        };

        if let Some(advisory) = outcome.duplicates_advisory() {
            self.events
                .publish_lossy(KioskEvent::Advisory { message: advisory })
                .await;
        }
        self.events
            .publish_lossy(KioskEvent::SubmissionCompleted {
                kind: WorkflowKind::Registration,
                success: true,
            })
            .await;
        self.events
            .publish_lossy(KioskEvent::ReloadRequested {
                view: ViewId::Dashboard,
            })
            .await;

        Ok(outcome)
    }
}
