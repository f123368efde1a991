use std::sync::Arc;

use uuid::Uuid;

use crate::db::QuizStore;
use crate::error::AppResult;
use crate::models::{QuizResults, QuizSubmission, TimeBucket};
use crate::services::catalog::CatalogClient;
use crate::services::{fetcher, frequency, query, reducer, tiers};

/// Processes one quiz submission end to end.
///
/// Aggregation, classification and query building run sequentially; the
/// catalog fetches they produce run in parallel. The instance is created
/// before any recommendation work so the caller gets a valid identifier
/// even when every fetch fails, in which case the stored tiers are empty.
pub async fn submit_quiz(
    store: Arc<dyn QuizStore>,
    catalog: Arc<dyn CatalogClient>,
    submission: QuizSubmission,
) -> AppResult<Uuid> {
    let aggregation = frequency::aggregate(store.as_ref(), &submission.answers).await?;

    let instance_id = store.create_instance().await?;

    for answer in &submission.answers {
        store
            .record_answer(instance_id, answer.question_id, answer.answer_id)
            .await?;
    }
    for signal in &aggregation.occurrences {
        store.record_genre_frequency(instance_id, signal, 1).await?;
    }

    let buckets = tiers::classify(&aggregation.frequencies);

    let language = store.language_code(&submission.language).await?;

    let available_time = TimeBucket::from_label(&submission.available_time);
    if available_time.is_none() {
        tracing::warn!(
            label = %submission.available_time,
            "Unrecognized available-time answer, applying no runtime cap"
        );
    }

    let queries = query::build_queries(&buckets, submission.media_type, &language, available_time);

    let outcome = fetcher::fetch_candidates(catalog, queries).await;
    let recommendations = reducer::reduce(outcome.candidates);

    store
        .store_recommendations(instance_id, &recommendations)
        .await?;

    tracing::info!(
        instance_id = %instance_id,
        high = recommendations.high.len(),
        medium = recommendations.medium.len(),
        low = recommendations.low.len(),
        failed_queries = outcome.failures.len(),
        "Quiz submission processed"
    );

    Ok(instance_id)
}

/// Returns the recorded recommendations for a quiz instance.
pub async fn quiz_results(store: Arc<dyn QuizStore>, instance_id: Uuid) -> AppResult<QuizResults> {
    let recommendations = store.get_results(instance_id).await?;
    Ok(QuizResults {
        quiz_instance_id: instance_id,
        recommendations,
    })
}
