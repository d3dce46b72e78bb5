use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::VisionError;

/// `Json<T>` whose rejections become validation envelopes instead of plain text.
pub struct VisionJson<T>(pub T);

impl<S, T> FromRequest<S> for VisionJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = VisionError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| VisionError::Validation(e.body_text()))?;
        Ok(VisionJson(value))
    }
}
