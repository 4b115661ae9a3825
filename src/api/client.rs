use crate::api::types::*;
use crate::config::ApiConfig;
use crate::error::ApiError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, trace};
use uuid::Uuid;

/// The remote verification service, seen through its HTTP contract. Workflows
/// and the controller talk to this trait so tests can substitute a mock.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError>;
    async fn employees(&self, page: u32, per_page: u32) -> Result<EmployeePage, ApiError>;
    async fn fraud_alerts(&self) -> Result<AlertList, ApiError>;
    async fn ghost_workers(&self) -> Result<GhostWorkerReport, ApiError>;
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError>;
    async fn verify(&self, request: &VerifyRequest) -> Result<VerifyResponse, ApiError>;
    async fn check_in(&self, request: &CheckInRequest) -> Result<CheckInResponse, ApiError>;
    async fn resolve_alert(
        &self,
        alert_id: i64,
        request: &ResolveRequest,
    ) -> Result<ResolveResponse, ApiError>;
    async fn generate_sample_data(
        &self,
        request: &SampleDataRequest,
    ) -> Result<SampleDataResponse, ApiError>;
}

/// Thin typed wrapper over the remote service. One independent HTTP request
/// per call; no retries, no caching, no shared mutable state.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Transport {
                cause: e.to_string(),
            })?;

        Ok(Self {
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(config.timeout_ms.max(250)),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        trace!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("x-request-id", format!("req_{}", Uuid::new_v4().simple()))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Transport {
                cause: e.to_string(),
            })?;

        decode_response(response).await
    }

    async fn post_json<Req, Res>(&self, path: &str, payload: &Req) -> Result<Res, ApiError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let url = self.endpoint(path);
        trace!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .header("x-request-id", format!("req_{}", Uuid::new_v4().simple()))
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| ApiError::Transport {
                cause: e.to_string(),
            })?;

        decode_response(response).await
    }
}

#[async_trait]
impl Gateway for ApiClient {
    async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.get_json("/api/analytics/dashboard").await
    }

    async fn employees(&self, page: u32, per_page: u32) -> Result<EmployeePage, ApiError> {
        self.get_json(&format!("/api/employees?page={}&per_page={}", page, per_page))
            .await
    }

    async fn fraud_alerts(&self) -> Result<AlertList, ApiError> {
        self.get_json("/api/duplicates").await
    }

    async fn ghost_workers(&self) -> Result<GhostWorkerReport, ApiError> {
        self.get_json("/api/fraud/ghost-workers").await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        self.post_json("/api/register", request).await
    }

    async fn verify(&self, request: &VerifyRequest) -> Result<VerifyResponse, ApiError> {
        self.post_json("/api/verify", request).await
    }

    async fn check_in(&self, request: &CheckInRequest) -> Result<CheckInResponse, ApiError> {
        self.post_json("/api/check-in", request).await
    }

    async fn resolve_alert(
        &self,
        alert_id: i64,
        request: &ResolveRequest,
    ) -> Result<ResolveResponse, ApiError> {
        self.post_json(&format!("/api/duplicates/{}/resolve", alert_id), request)
            .await
    }

    async fn generate_sample_data(
        &self,
        request: &SampleDataRequest,
    ) -> Result<SampleDataResponse, ApiError> {
        self.post_json("/api/generate-sample-data", request).await
    }
}

async fn decode_response<T>(response: reqwest::Response) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let bytes = response.bytes().await.map_err(|e| ApiError::Transport {
        cause: e.to_string(),
    })?;

    if !status.is_success() {
        return Err(http_error(status.as_u16(), &bytes));
    }

    serde_json::from_slice::<T>(&bytes).map_err(|e| ApiError::Decode {
        details: e.to_string(),
    })
}

/// Build an `ApiError::Http` from a non-2xx response body. The service is
/// expected to put a human-readable message in an `error` field, but a body
/// without one (or without valid JSON at all) must not break the caller.
fn http_error(status: u16, body: &[u8]) -> ApiError {
    let message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("request failed with HTTP status {}", status));

    debug!("HTTP {}: {}", status, message);
    ApiError::Http { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: base_url.to_string(),
            timeout_ms: 1_000,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_normalizes_trailing_slash() {
        let client = test_client("http://kiosk-api.internal:5000/");
        assert_eq!(
            client.endpoint("/api/register"),
            "http://kiosk-api.internal:5000/api/register"
        );
        assert_eq!(
            client.endpoint("api/register"),
            "http://kiosk-api.internal:5000/api/register"
        );
    }

    #[test]
    fn test_http_error_uses_server_message() {
        let err = http_error(400, br#"{"error": "duplicate email"}"#);
        assert_eq!(
            err,
            ApiError::Http {
                status: 400,
                message: "duplicate email".to_string(),
            }
        );
        // Display carries the server message through verbatim
        assert_eq!(err.to_string(), "duplicate email");
    }

    #[test]
    fn test_http_error_falls_back_without_error_field() {
        let err = http_error(500, br#"{"detail": "boom"}"#);
        assert_eq!(
            err.to_string(),
            "request failed with HTTP status 500"
        );
    }

    #[test]
    fn test_http_error_survives_non_json_body() {
        let err = http_error(502, b"<html>Bad Gateway</html>");
        match err {
            ApiError::Http { status, message } => {
                assert_eq!(status, 502);
                assert!(message.contains("502"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_register_response_decodes_duplicates() {
        let body = br#"{
            "success": true,
            "employee": {
                "id": 7,
                "digital_id": "d-7",
                "name": "Amina Yusuf",
                "national_id": null,
                "department": "Finance",
                "position": null,
                "phone": null,
                "email": null,
                "photo_path": null,
                "registration_date": "2024-03-01T09:00:00",
                "status": "active"
            },
            "duplicates_found": 2,
            "duplicate_alerts": [
                {"existing_employee": "A. Yusuf", "similarity_score": 91.5, "matching_factors": ["name", "photo"]}
            ]
        }"#;
        let response: RegisterResponse = serde_json::from_slice(body).unwrap();
        assert!(response.success);
        assert_eq!(response.duplicates_found, 2);
        assert_eq!(response.employee.unwrap().name, "Amina Yusuf");
        assert_eq!(response.duplicate_alerts[0].matching_factors.len(), 2);
    }

    #[test]
    fn test_dashboard_stats_tolerates_missing_sections() {
        let body = br#"{"total_employees": 12, "total_attendance": 480}"#;
        let stats: DashboardStats = serde_json::from_slice(body).unwrap();
        assert_eq!(stats.total_employees, 12);
        assert_eq!(stats.pending_duplicates, 0);
        assert!(stats.recent_attendance.is_empty());
    }
}
