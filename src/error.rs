use axum::{Json, http::StatusCode, response::IntoResponse};
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

use crate::types::envelope::ApiEnvelope;

#[derive(Debug, ThisError)]
pub enum VisionError {
    /// Client supplied a field that breaks one of the vision rules.
    #[error("{0}")]
    Validation(String),

    #[error("Vision not found")]
    NotFound,

    #[error("Database error: {0}")]
    Storage(SqlxError),

    /// The `visions` table does not exist yet; the request may be retried.
    #[error("visions table is not ready")]
    SchemaNotReady,

    /// No storage handle was supplied at startup.
    #[error("storage is not configured")]
    NotConfigured,
}

impl From<SqlxError> for VisionError {
    fn from(e: SqlxError) -> Self {
        match &e {
            SqlxError::Database(db) if db.message().contains("no such table") => {
                VisionError::SchemaNotReady
            }
            _ => VisionError::Storage(e),
        }
    }
}

impl VisionError {
    pub fn status(&self) -> StatusCode {
        match self {
            VisionError::Validation(_) => StatusCode::BAD_REQUEST,
            VisionError::NotFound => StatusCode::NOT_FOUND,
            VisionError::SchemaNotReady => StatusCode::SERVICE_UNAVAILABLE,
            VisionError::Storage(_) | VisionError::NotConfigured => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for VisionError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = match self {
            VisionError::Validation(reason) => {
                ApiEnvelope::failure("Validation error", Some(reason))
            }
            VisionError::NotFound => ApiEnvelope::failure("Vision not found", None),
            VisionError::SchemaNotReady => ApiEnvelope::failure(
                "Service unavailable",
                Some("Storage is still initializing; retry shortly.".to_string()),
            ),
            VisionError::NotConfigured => ApiEnvelope::failure(
                "Storage not configured",
                Some("Storage is not configured.".to_string()),
            ),
            VisionError::Storage(_) => ApiEnvelope::failure(
                "Internal server error",
                Some("An internal server error occurred.".to_string()),
            ),
        };
        (status, Json(body)).into_response()
    }
}
