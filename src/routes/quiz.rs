use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{QuizResults, QuizSubmission},
    services::quiz,
};

use super::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub quiz_instance_id: Uuid,
}

/// Handler for quiz submission
pub async fn submit(
    State(state): State<AppState>,
    Json(submission): Json<QuizSubmission>,
) -> AppResult<(StatusCode, Json<SubmitResponse>)> {
    let quiz_instance_id = quiz::submit_quiz(state.store, state.catalog, submission).await?;
    Ok((StatusCode::CREATED, Json(SubmitResponse { quiz_instance_id })))
}

/// Handler for quiz results retrieval
pub async fn results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<QuizResults>> {
    let results = quiz::quiz_results(state.store, id).await?;
    Ok(Json(results))
}
