use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::service::GalleryError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NOT_FOUND`,
    /// `UPLOAD_FAILED`, `METADATA_WRITE_FAILED`, `DOWNLOAD_FAILED`,
    /// `DELETE_FAILED`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Only image files are allowed")]
    pub message: String,
}

/// Application-level error type.
///
/// Server-side variants carry internal detail that is logged, never returned.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    UploadFailed(String),
    MetadataWriteFailed(String),
    DownloadFailed(String),
    DeleteFailed(String),
    Internal(String),
}

impl AppError {
    fn server_error(code: &'static str, message: &str, detail: String) -> (StatusCode, ErrorBody) {
        tracing::error!(code, "{}", detail);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody {
                code,
                message: message.into(),
            },
        )
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::UploadFailed(detail) => {
                Self::server_error("UPLOAD_FAILED", "Failed to upload image", detail)
            }
            AppError::MetadataWriteFailed(detail) => Self::server_error(
                "METADATA_WRITE_FAILED",
                "Failed to save image metadata",
                detail,
            ),
            AppError::DownloadFailed(detail) => {
                Self::server_error("DOWNLOAD_FAILED", "Failed to download image", detail)
            }
            AppError::DeleteFailed(detail) => {
                Self::server_error("DELETE_FAILED", "Failed to delete image", detail)
            }
            AppError::Internal(detail) => {
                Self::server_error("INTERNAL_ERROR", "An unexpected error occurred", detail)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<GalleryError> for AppError {
    fn from(err: GalleryError) -> Self {
        let detail = err.to_string();
        match err {
            GalleryError::InvalidRequest(msg) => AppError::Validation(msg),
            GalleryError::NotFound(_) => AppError::NotFound("Image not found".into()),
            GalleryError::UploadFailed(_) => AppError::UploadFailed(detail),
            GalleryError::MetadataWriteFailed(_) => AppError::MetadataWriteFailed(detail),
            GalleryError::DownloadFailed(_) => AppError::DownloadFailed(detail),
            GalleryError::DeleteFailed(_) => AppError::DeleteFailed(detail),
            GalleryError::MetadataRead(_) => AppError::Internal(detail),
        }
    }
}
