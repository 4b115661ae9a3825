use crate::api::{DashboardStats, EmployeePage, FraudAlert, GhostWorker, VerifyResponse};
use crate::router::ViewId;
use parking_lot::RwLock;

/// Everything the fraud view displays: pending alerts plus the ghost-worker
/// table, fetched separately but rendered together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FraudOverview {
    pub alerts: Vec<FraudAlert>,
    pub ghost_workers: Vec<GhostWorker>,
}

/// Per-view data slices. Slices are read-only projections of API responses:
/// replaced wholesale on reload, cleared when the owning view is torn down,
/// never mutated in place.
#[derive(Default)]
pub struct ViewStore {
    dashboard: RwLock<Option<DashboardStats>>,
    employees: RwLock<Option<EmployeePage>>,
    fraud: RwLock<Option<FraudOverview>>,
    verification: RwLock<Option<VerifyResponse>>,
}

impl ViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_dashboard(&self, stats: DashboardStats) {
        *self.dashboard.write() = Some(stats);
    }

    pub fn dashboard(&self) -> Option<DashboardStats> {
        self.dashboard.read().clone()
    }

    pub fn set_employees(&self, page: EmployeePage) {
        *self.employees.write() = Some(page);
    }

    pub fn employees(&self) -> Option<EmployeePage> {
        self.employees.read().clone()
    }

    pub fn set_fraud(&self, overview: FraudOverview) {
        *self.fraud.write() = Some(overview);
    }

    pub fn fraud(&self) -> Option<FraudOverview> {
        self.fraud.read().clone()
    }

    pub fn set_verification(&self, result: VerifyResponse) {
        *self.verification.write() = Some(result);
    }

    pub fn verification(&self) -> Option<VerifyResponse> {
        self.verification.read().clone()
    }

    /// Discard the slice owned by a view when that view is torn down.
    pub fn clear_view(&self, view: ViewId) {
        match view {
            ViewId::Dashboard => *self.dashboard.write() = None,
            ViewId::Employees => *self.employees.write() = None,
            ViewId::Fraud => *self.fraud.write() = None,
            ViewId::Verification => *self.verification.write() = None,
            ViewId::Registration => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stats(total_employees: u64) -> DashboardStats {
        DashboardStats {
            total_employees,
            total_attendance: 0,
            pending_duplicates: 0,
            total_claims: 0,
            ghost_workers_count: 0,
            recent_attendance: vec![],
            recent_registrations: vec![],
        }
    }

    #[test]
    fn test_replace_on_reload() {
        let store = ViewStore::new();
        assert!(store.dashboard().is_none());

        store.set_dashboard(sample_stats(5));
        store.set_dashboard(sample_stats(9));
        assert_eq!(store.dashboard().unwrap().total_employees, 9);
    }

    #[test]
    fn test_clear_view_discards_owned_slice() {
        let store = ViewStore::new();
        store.set_dashboard(sample_stats(3));
        store.set_fraud(FraudOverview::default());

        store.clear_view(ViewId::Dashboard);
        assert!(store.dashboard().is_none());
        // Other slices are untouched
        assert!(store.fraud().is_some());
    }
}
