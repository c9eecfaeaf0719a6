use seolink_core::{RedirectConfig, StorageStatus};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ListRedirectsResponse {
    pub redirects: Vec<RedirectConfig>,
    /// `{"status":"connected"}` or `{"status":"degraded","reason":...}`.
    pub storage: StorageStatus,
}

#[derive(Serialize)]
pub struct PublicUrlResponse {
    pub url: String,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}
