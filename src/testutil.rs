//! Shared test doubles for the gateway seam.

use crate::api::*;
use crate::error::ApiError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;

pub fn sample_employee(id: i64, name: &str) -> EmployeeRecord {
    EmployeeRecord {
        id,
        digital_id: format!("d-{}", id),
        name: name.to_string(),
        national_id: None,
        department: Some("Operations".to_string()),
        position: None,
        phone: None,
        email: None,
        photo_path: None,
        registration_date: Some("2024-01-15T08:30:00".to_string()),
        status: "active".to_string(),
    }
}

pub fn sample_alert(id: i64) -> FraudAlert {
    FraudAlert {
        id,
        employee_id_1: 1,
        employee_id_2: 2,
        employee_1_name: Some("A".to_string()),
        employee_2_name: Some("B".to_string()),
        similarity_score: 92.0,
        matching_factors: Some("[\"name\"]".to_string()),
        alert_date: None,
        status: "pending".to_string(),
        investigation_notes: None,
    }
}

/// In-memory gateway that records calls, serves canned responses, and can be
/// scripted to fail or to hold requests open until released.
#[derive(Default)]
pub struct MockGateway {
    calls: Mutex<Vec<String>>,
    fail_with: Mutex<Option<ApiError>>,
    gate: Mutex<Option<Arc<Notify>>>,
    pub duplicates_found: Mutex<u32>,
    pub stats: Mutex<DashboardStats>,
    pub employees: Mutex<Vec<EmployeeRecord>>,
    pub alerts: Mutex<Vec<FraudAlert>>,
    pub verify_response: Mutex<VerifyResponse>,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            verify_response: Mutex::new(VerifyResponse {
                employee: Some(sample_employee(1, "Amina Yusuf")),
                verified: true,
                confidence: 88.5,
            }),
            ..Self::default()
        })
    }

    /// All future calls fail with `error`.
    pub fn fail_with(&self, error: ApiError) {
        *self.fail_with.lock() = Some(error);
    }

    pub fn clear_failure(&self) {
        *self.fail_with.lock() = None;
    }

    /// Hold every call open until the returned handle is notified.
    pub fn hold(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock() = Some(Arc::clone(&notify));
        notify
    }

    pub fn release(&self) {
        if let Some(gate) = self.gate.lock().take() {
            gate.notify_waiters();
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == name).count()
    }

    async fn enter(&self, name: &str) -> Result<(), ApiError> {
        self.calls.lock().push(name.to_string());
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(error) = self.fail_with.lock().clone() {
            return Err(error);
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.enter("dashboard_stats").await?;
        Ok(self.stats.lock().clone())
    }

    async fn employees(&self, page: u32, per_page: u32) -> Result<EmployeePage, ApiError> {
        self.enter("employees").await?;
        let employees = self.employees.lock().clone();
        Ok(EmployeePage {
            total: employees.len() as u64,
            pages: 1,
            current_page: page.min(1),
            employees: employees
                .into_iter()
                .take(per_page as usize)
                .collect(),
        })
    }

    async fn fraud_alerts(&self) -> Result<AlertList, ApiError> {
        self.enter("fraud_alerts").await?;
        Ok(AlertList {
            alerts: self.alerts.lock().clone(),
        })
    }

    async fn ghost_workers(&self) -> Result<GhostWorkerReport, ApiError> {
        self.enter("ghost_workers").await?;
        Ok(GhostWorkerReport::default())
    }

    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        self.enter("register").await?;
        Ok(RegisterResponse {
            success: true,
            employee: Some(sample_employee(100, &request.name)),
            duplicates_found: *self.duplicates_found.lock(),
            duplicate_alerts: vec![],
        })
    }

    async fn verify(&self, _request: &VerifyRequest) -> Result<VerifyResponse, ApiError> {
        self.enter("verify").await?;
        Ok(self.verify_response.lock().clone())
    }

    async fn check_in(&self, request: &CheckInRequest) -> Result<CheckInResponse, ApiError> {
        self.enter("check_in").await?;
        Ok(CheckInResponse {
            success: true,
            log: Some(AttendanceRecord {
                id: 1,
                employee_id: request.employee_id,
                employee_name: None,
                check_in_time: Some("2024-03-01T09:00:00".to_string()),
                verification_method: Some(request.verification_method.clone()),
                confidence_score: Some(100.0),
                location: Some(request.location.clone()),
            }),
        })
    }

    async fn resolve_alert(
        &self,
        _alert_id: i64,
        _request: &ResolveRequest,
    ) -> Result<ResolveResponse, ApiError> {
        self.enter("resolve_alert").await?;
        Ok(ResolveResponse {
            success: true,
            alert: None,
        })
    }

    async fn generate_sample_data(
        &self,
        request: &SampleDataRequest,
    ) -> Result<SampleDataResponse, ApiError> {
        self.enter("generate_sample_data").await?;
        Ok(SampleDataResponse {
            success: true,
            employees_created: request.num_employees,
        })
    }
}
