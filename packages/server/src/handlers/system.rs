use axum::Json;
use chrono::Utc;

use crate::models::system::{HealthResponse, ServiceInfo};

#[utoipa::path(
    get,
    path = "/",
    tag = "System",
    operation_id = "serviceInfo",
    summary = "Service identity and version",
    responses((status = 200, description = "Service info", body = ServiceInfo)),
)]
pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Lumina Gallery API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    operation_id = "health",
    summary = "Liveness check",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
    })
}
