//! Plain HTTP image endpoint: GET /image?id={task_id}

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use ring_common::RingError;
use ring_common::constants::image_format;

use super::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    id: Option<String>,
}

/// Serve the PNG of a live captcha when images are stored
pub async fn get_image(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
) -> Result<Response, ApiError> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or(RingError::IdNotSet)?;

    let manager = state.manager.clone();
    let task_id = id.clone();
    let bytes = tokio::task::spawn_blocking(move || manager.get_image(&task_id))
        .await
        .map_err(|e| RingError::Internal(e.to_string()))??;

    tracing::debug!(task_id = %id, size = bytes.len(), "Serving captcha image");

    Ok((
        [
            (header::CONTENT_TYPE, image_format::MIME_TYPE.to_string()),
            (header::SERVER, state.config.server_name.clone()),
        ],
        bytes,
    )
        .into_response())
}
