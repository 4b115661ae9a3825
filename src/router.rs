use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// One top-level screen of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewId {
    Dashboard,
    Registration,
    Verification,
    Employees,
    Fraud,
}

impl ViewId {
    pub const ALL: [ViewId; 5] = [
        ViewId::Dashboard,
        ViewId::Registration,
        ViewId::Verification,
        ViewId::Employees,
        ViewId::Fraud,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ViewId::Dashboard => "dashboard",
            ViewId::Registration => "registration",
            ViewId::Verification => "verification",
            ViewId::Employees => "employees",
            ViewId::Fraud => "fraud",
        }
    }

    /// Views that fetch remote data on activation.
    pub fn loads_data(&self) -> bool {
        matches!(self, ViewId::Dashboard | ViewId::Employees | ViewId::Fraud)
    }

    /// Views whose teardown must release the camera.
    pub fn holds_camera(&self) -> bool {
        matches!(self, ViewId::Verification)
    }
}

/// A committed decision to move from one view to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationPlan {
    pub from: ViewId,
    pub to: ViewId,
}

/// Holds the single active view and hands out activation generations. Each
/// commit bumps the generation; a data load started under an older generation
/// must not touch display state when it completes (stale-result guard).
///
/// Activation itself is driven by one control loop at a time; the router only
/// guards reads from concurrently running load and submission tasks.
pub struct ViewRouter {
    active: RwLock<ViewId>,
    generation: AtomicU64,
}

impl ViewRouter {
    pub fn new() -> Self {
        Self {
            active: RwLock::new(ViewId::Dashboard),
            generation: AtomicU64::new(1),
        }
    }

    pub fn active(&self) -> ViewId {
        *self.active.read()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    /// Plan a move to `to`. Re-activating the current view is a no-op.
    pub fn plan(&self, to: ViewId) -> Option<ActivationPlan> {
        let from = *self.active.read();
        if from == to {
            debug!("View {} already active, skipping activation", to.name());
            return None;
        }
        Some(ActivationPlan { from, to })
    }

    /// Commit a planned activation after its teardown has run. Returns the new
    /// activation generation for the setup fetches.
    pub fn commit(&self, plan: ActivationPlan) -> u64 {
        *self.active.write() = plan.to;
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(
            "View changed {} -> {} (generation {})",
            plan.from.name(),
            plan.to.name(),
            generation
        );
        generation
    }
}

impl Default for ViewRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_view_is_dashboard() {
        let router = ViewRouter::new();
        assert_eq!(router.active(), ViewId::Dashboard);
    }

    #[test]
    fn test_reactivating_current_view_is_noop() {
        let router = ViewRouter::new();
        assert!(router.plan(ViewId::Dashboard).is_none());
        assert_eq!(router.generation(), 1);
    }

    #[test]
    fn test_commit_changes_view_and_bumps_generation() {
        let router = ViewRouter::new();
        let plan = router.plan(ViewId::Verification).unwrap();
        assert_eq!(plan.from, ViewId::Dashboard);

        let generation = router.commit(plan);
        assert_eq!(router.active(), ViewId::Verification);
        assert_eq!(generation, 2);
        assert!(router.is_current(generation));
    }

    #[test]
    fn test_stale_generation_detected() {
        let router = ViewRouter::new();
        let first = router.commit(router.plan(ViewId::Employees).unwrap());
        let second = router.commit(router.plan(ViewId::Fraud).unwrap());

        assert!(!router.is_current(first));
        assert!(router.is_current(second));
    }

    #[test]
    fn test_view_hooks() {
        assert!(ViewId::Dashboard.loads_data());
        assert!(ViewId::Employees.loads_data());
        assert!(ViewId::Fraud.loads_data());
        assert!(!ViewId::Registration.loads_data());
        assert!(!ViewId::Verification.loads_data());

        assert!(ViewId::Verification.holds_camera());
        assert!(!ViewId::Dashboard.holds_camera());
    }
}
