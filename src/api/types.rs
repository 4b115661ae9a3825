use serde::{Deserialize, Serialize};

/// Aggregate counts shown on the dashboard view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_employees: u64,
    #[serde(default)]
    pub total_attendance: u64,
    #[serde(default)]
    pub pending_duplicates: u64,
    #[serde(default)]
    pub total_claims: u64,
    #[serde(default)]
    pub ghost_workers_count: u64,
    #[serde(default)]
    pub recent_attendance: Vec<AttendanceRecord>,
    #[serde(default)]
    pub recent_registrations: Vec<EmployeeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub employee_id: i64,
    pub employee_name: Option<String>,
    pub check_in_time: Option<String>,
    pub verification_method: Option<String>,
    pub confidence_score: Option<f64>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: i64,
    pub digital_id: String,
    pub name: String,
    pub national_id: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub photo_path: Option<String>,
    pub registration_date: Option<String>,
    pub status: String,
}

/// One page of the employee roster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeePage {
    #[serde(default)]
    pub employees: Vec<EmployeeRecord>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub current_page: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudAlert {
    pub id: i64,
    pub employee_id_1: i64,
    pub employee_id_2: i64,
    pub employee_1_name: Option<String>,
    pub employee_2_name: Option<String>,
    pub similarity_score: f64,
    pub matching_factors: Option<String>,
    pub alert_date: Option<String>,
    pub status: String,
    pub investigation_notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertList {
    #[serde(default)]
    pub alerts: Vec<FraudAlert>,
}

/// One entry in the ghost-worker table. The detection semantics belong to the
/// remote service; the client only displays what it is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GhostWorker {
    pub employee: EmployeeRecord,
    pub reason: String,
    pub days_since_registration: Option<i64>,
    pub days_since_attendance: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GhostWorkerReport {
    #[serde(default)]
    pub ghost_workers: Vec<GhostWorker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_data: Option<String>,
    pub fingerprint_data: String,
    pub created_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateAdvisory {
    pub existing_employee: String,
    pub similarity_score: f64,
    #[serde(default)]
    pub matching_factors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub success: bool,
    pub employee: Option<EmployeeRecord>,
    #[serde(default)]
    pub duplicates_found: u32,
    #[serde(default)]
    pub duplicate_alerts: Vec<DuplicateAdvisory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub employee_id: i64,
    pub biometric_data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub employee: Option<EmployeeRecord>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInRequest {
    pub employee_id: i64,
    pub verification_method: String,
    pub location: String,
    pub device_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckInResponse {
    #[serde(default)]
    pub success: bool,
    pub log: Option<AttendanceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolveResponse {
    #[serde(default)]
    pub success: bool,
    pub alert: Option<FraudAlert>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleDataRequest {
    pub num_employees: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleDataResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub employees_created: u32,
}
