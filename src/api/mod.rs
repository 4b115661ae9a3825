mod client;
mod types;

pub use client::{ApiClient, Gateway};
pub use types::{
    AlertList, AttendanceRecord, CheckInRequest, CheckInResponse, DashboardStats,
    DuplicateAdvisory, EmployeePage, EmployeeRecord, FraudAlert, GhostWorker, GhostWorkerReport,
    RegisterRequest, RegisterResponse, ResolveRequest, ResolveResponse, SampleDataRequest,
    SampleDataResponse, VerifyRequest, VerifyResponse,
};
