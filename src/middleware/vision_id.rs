use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use crate::error::VisionError;

/// The `{id}` path segment, parsed as a vision id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisionId(pub i64);

impl<S> FromRequestParts<S> for VisionId
where
    S: Send + Sync,
{
    type Rejection = VisionError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| VisionError::Validation(e.body_text()))?;
        raw.trim()
            .parse::<i64>()
            .map(VisionId)
            .map_err(|_| VisionError::Validation(format!("id must be an integer, got `{raw}`")))
    }
}
