use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use mediaquery_core::{AppError, MediaEntry};
use mediaquery_infra::ErrorResponse;

#[utoipa::path(
    get,
    path = "/{name}",
    tag = "media",
    params(
        ("name" = String, Path, description = "Object key; may contain '/'")
    ),
    responses(
        (status = 200, description = "Media found", body = MediaEntry),
        (status = 404, description = "Media not found", body = ErrorResponse),
        (status = 503, description = "Catalog unavailable", body = ErrorResponse)
    )
)]
pub async fn get_media(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let entry = state
        .catalog
        .get(&name)
        .await?
        .ok_or_else(|| AppError::media_not_found(&name))?;

    Ok(Json(entry))
}
