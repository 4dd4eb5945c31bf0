//! HTTP boundary
//!
//! A thin axum layer that extracts inbound fields, hands them to the
//! [`Pipeline`] and shapes the outcome into a JSON envelope or a raw image
//! body. Every failure becomes `{"success": false, "error": ...}`.

mod form;
mod handlers;

use crate::pipeline::Pipeline;
use crate::presets::PresetKind;
use crate::Error;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;

/// Uploads larger than this are rejected by axum before reaching a handler.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
}

pub fn router(pipeline: Arc<Pipeline>) -> Router {
    let state = AppState { pipeline };

    let mut router = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/presets", get(handlers::list_presets))
        .route("/api/chat", post(handlers::chat))
        .route("/api/generate-image", post(handlers::generate_image))
        .route("/images/{name}", get(handlers::serve_image));

    for kind in [
        PresetKind::Figurine,
        PresetKind::Hijab,
        PresetKind::Sdmtinggi,
        PresetKind::Hitam,
    ] {
        router = router.route(&format!("/api/{}", kind.name()), handlers::transform_route(kind));
    }

    router
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Pipeline error rendered as the failure envelope.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::MediaFetch(_) | Error::Generation(_) | Error::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::warn!("Request rejected: {}", self.0);
        }

        (
            status,
            Json(serde_json::json!({
                "success": false,
                "error": self.0.to_string(),
            })),
        )
            .into_response()
    }
}
