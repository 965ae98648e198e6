//! HTTP route handlers for the RingCaptcha server.

use std::time::Duration;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use ring_common::RingError;

use crate::state::AppState;

mod health;
mod image;
mod rpc;

/// Slack on top of the synthesis timeout before the HTTP layer gives up
const REQUEST_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let request_timeout = state.config.captcha.compose_timeout() + REQUEST_TIMEOUT_SLACK;

    Router::new()
        // Health & Status
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))

        // Captcha API
        .route("/rpc", post(rpc::rpc_handler))
        .route("/image", get(image::get_image))

        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())

        // Add shared state
        .with_state(state)
}

/// Service error rendered as an HTTP response
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] RingError);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::warn!(error = %self.0, "Request failed");
        }

        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}
