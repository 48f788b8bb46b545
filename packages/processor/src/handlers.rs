use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use common::processing::ProcessRequest;
use serde_json::json;

use crate::error::ProcessorError;
use crate::processor::ThumbnailProcessor;

/// HTTP invocation surface of the processor.
pub fn router(processor: Arc<ThumbnailProcessor>) -> Router {
    Router::new()
        .route("/invoke", post(invoke))
        .route("/health", get(health))
        .with_state(processor)
}

async fn invoke(
    State(processor): State<Arc<ThumbnailProcessor>>,
    Json(request): Json<ProcessRequest>,
) -> Response {
    match processor.process(&request).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => {
            tracing::error!(image_id = %request.image_id, error = %e, "Image processing failed");
            let status = match e {
                ProcessorError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}
