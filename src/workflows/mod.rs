mod alerts;
mod checkin;
mod registration;
mod verification;

#[cfg(test)]
mod tests;

pub use alerts::{AlertResolution, AlertResolutionWorkflow};
pub use checkin::CheckInWorkflow;
pub use registration::{
    synthesize_fingerprint_token, RegistrationForm, RegistrationOutcome, RegistrationWorkflow,
};
pub use verification::VerificationWorkflow;

use crate::error::WorkflowError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The user-initiated submission pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    Registration,
    Verification,
    CheckIn,
    AlertResolution,
}

impl WorkflowKind {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowKind::Registration => "registration",
            WorkflowKind::Verification => "verification",
            WorkflowKind::CheckIn => "check-in",
            WorkflowKind::AlertResolution => "alert resolution",
        }
    }
}

/// Claims a workflow's one-submission-at-a-time flag. The flag is released on
/// drop, so every exit path out of a submission (success, API failure, early
/// validation return) restores it.
pub(crate) struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    pub(crate) fn claim(flag: &Arc<AtomicBool>) -> Result<Self, WorkflowError> {
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(WorkflowError::AlreadyInProgress);
        }
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Asks the operator to approve an action before it runs. The terminal binary
/// prompts interactively; tests answer statically.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// A confirmer with a fixed answer.
pub struct StaticConfirmer(pub bool);

#[async_trait]
impl Confirmer for StaticConfirmer {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
