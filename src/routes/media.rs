use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{MediaDetails, MediaKind},
};

use super::AppState;

/// Handler for single-media detail lookup
pub async fn details(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
) -> AppResult<Json<MediaDetails>> {
    let kind: MediaKind = kind.parse()?;
    let details = state.catalog.media_details(kind, id).await?;
    Ok(Json(details))
}
