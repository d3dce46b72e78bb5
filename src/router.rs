use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::db::VisionRepository;
use crate::error::VisionError;
use crate::handlers::{health, visions};
use crate::service::ImageEmbedder;

/// Shared handler state. Cloned per request; the pool inside is reference-counted.
#[derive(Clone)]
pub struct VisionsState {
    repository: Option<VisionRepository>,
    pub embedder: ImageEmbedder,
    started_at: Instant,
}

impl VisionsState {
    pub fn new(repository: VisionRepository, embedder: ImageEmbedder) -> Self {
        Self {
            repository: Some(repository),
            embedder,
            started_at: Instant::now(),
        }
    }

    /// State for a process started without a storage URL; vision routes
    /// answer with the not-configured envelope.
    pub fn unconfigured(embedder: ImageEmbedder) -> Self {
        Self {
            repository: None,
            embedder,
            started_at: Instant::now(),
        }
    }

    pub fn repository(&self) -> Result<&VisionRepository, VisionError> {
        self.repository.as_ref().ok_or(VisionError::NotConfigured)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

pub fn visions_router(state: VisionsState) -> Router {
    Router::new()
        .route("/", get(health::service_info))
        .route("/health", get(health::health))
        .route(
            "/api/visions",
            get(visions::list_visions).post(visions::create_vision),
        )
        .route(
            "/api/visions/{id}",
            get(visions::get_vision)
                .put(visions::update_vision)
                .delete(visions::delete_vision),
        )
        .route(
            "/api/visions/category/{category}",
            get(visions::list_by_category),
        )
        .route(
            "/api/visions/creator/{address}",
            get(visions::list_by_creator),
        )
        .with_state(state)
}

/// CORS for the browser frontend. No origins configured means any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| {
            HeaderValue::from_str(o)
                .inspect_err(|e| warn!(origin = %o, error = %e, "ignoring invalid CORS origin"))
                .ok()
        })
        .collect();
    base.allow_origin(parsed)
}
