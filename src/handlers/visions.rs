use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{info, warn};

use crate::db::{NewVision, Vision, VisionUpdate};
use crate::error::VisionError;
use crate::middleware::{VisionId, VisionJson};
use crate::router::VisionsState;
use crate::service::ImageEmbed;
use crate::types::ApiEnvelope;

type VisionResponse = Json<ApiEnvelope<Vision>>;
type VisionListResponse = Json<ApiEnvelope<Vec<Vision>>>;

fn log_failure(op: &'static str, key: &str, err: &VisionError) {
    match err {
        VisionError::Validation(_) | VisionError::NotFound => {
            info!(op, key, error = %err, "request rejected");
        }
        _ => warn!(op, key, error = %err, "request failed"),
    }
}

/// GET /api/visions
pub async fn list_visions(
    State(state): State<VisionsState>,
) -> Result<VisionListResponse, VisionError> {
    let visions = state
        .repository()?
        .get_all()
        .await
        .inspect_err(|e| log_failure("list_visions", "*", e))?;
    Ok(Json(ApiEnvelope::list(visions)))
}

/// GET /api/visions/{id}
pub async fn get_vision(
    State(state): State<VisionsState>,
    VisionId(id): VisionId,
) -> Result<VisionResponse, VisionError> {
    let vision = state
        .repository()?
        .get_by_id(id)
        .await
        .and_then(|v| v.ok_or(VisionError::NotFound))
        .inspect_err(|e| log_failure("get_vision", &id.to_string(), e))?;
    Ok(Json(ApiEnvelope::ok(vision)))
}

/// POST /api/visions
///
/// When only `image_url` is given the image is fetched and inlined as
/// `image_data`; a failed fetch leaves `image_data` empty.
pub async fn create_vision(
    State(state): State<VisionsState>,
    VisionJson(input): VisionJson<NewVision>,
) -> Result<(StatusCode, VisionResponse), VisionError> {
    let repo = state.repository()?;
    let mut input = input.normalized();
    let key = input.title.clone().unwrap_or_default();
    input
        .validate()
        .inspect_err(|e| log_failure("create_vision", &key, e))?;

    if input.image_data.is_none()
        && let Some(url) = input.image_url.as_deref()
    {
        match state.embedder.embed(url).await {
            ImageEmbed::Embedded(data) => input.image_data = Some(data),
            ImageEmbed::SkippedFetch(reason) => {
                warn!(op = "create_vision", image_url = url, reason = %reason, "image not embedded");
            }
        }
    }

    let vision = repo
        .create(input)
        .await
        .inspect_err(|e| log_failure("create_vision", &key, e))?;
    info!(id = vision.id, category = %vision.category, "vision created");
    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::ok(vision).with_message("Vision created successfully")),
    ))
}

/// PUT /api/visions/{id}
pub async fn update_vision(
    State(state): State<VisionsState>,
    VisionId(id): VisionId,
    VisionJson(changes): VisionJson<VisionUpdate>,
) -> Result<VisionResponse, VisionError> {
    let vision = state
        .repository()?
        .update(id, changes)
        .await
        .and_then(|v| v.ok_or(VisionError::NotFound))
        .inspect_err(|e| log_failure("update_vision", &id.to_string(), e))?;
    Ok(Json(
        ApiEnvelope::ok(vision).with_message("Vision updated successfully"),
    ))
}

/// DELETE /api/visions/{id}
pub async fn delete_vision(
    State(state): State<VisionsState>,
    VisionId(id): VisionId,
) -> Result<VisionResponse, VisionError> {
    let vision = state
        .repository()?
        .delete(id)
        .await
        .and_then(|v| v.ok_or(VisionError::NotFound))
        .inspect_err(|e| log_failure("delete_vision", &id.to_string(), e))?;
    info!(id, "vision deleted");
    Ok(Json(
        ApiEnvelope::ok(vision).with_message("Vision deleted successfully"),
    ))
}

/// GET /api/visions/category/{category}
pub async fn list_by_category(
    State(state): State<VisionsState>,
    Path(category): Path<String>,
) -> Result<VisionListResponse, VisionError> {
    let visions = state
        .repository()?
        .get_by_category(&category)
        .await
        .inspect_err(|e| log_failure("list_by_category", &category, e))?;
    Ok(Json(ApiEnvelope::list(visions).with_category(category)))
}

/// GET /api/visions/creator/{address}
pub async fn list_by_creator(
    State(state): State<VisionsState>,
    Path(address): Path<String>,
) -> Result<VisionListResponse, VisionError> {
    let visions = state
        .repository()?
        .get_by_creator(&address)
        .await
        .inspect_err(|e| log_failure("list_by_creator", &address, e))?;
    Ok(Json(ApiEnvelope::list(visions).with_creator(address)))
}
