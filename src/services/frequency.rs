use std::collections::HashSet;

use crate::db::QuizStore;
use crate::error::{AppError, AppResult};
use crate::models::{AnswerSelection, GenreFrequencyMap, GenreSignal};

/// Genre signals aggregated from one quiz submission
#[derive(Debug, Clone, Default)]
pub struct GenreAggregation {
    /// Occurrence count per external genre id
    pub frequencies: GenreFrequencyMap,
    /// Every genre occurrence in submission order, with repetition.
    /// An answer tagged with three genres contributes three entries.
    pub occurrences: Vec<GenreSignal>,
}

/// Builds the genre frequency map for a submission.
///
/// Each submitted answer is resolved to its attached genres through the
/// store; every attachment increments that genre's counter by one. A
/// duplicate question id within the submission is rejected, and an unknown
/// answer id surfaces the store's lookup error unchanged.
pub async fn aggregate(
    store: &dyn QuizStore,
    answers: &[AnswerSelection],
) -> AppResult<GenreAggregation> {
    if answers.is_empty() {
        return Err(AppError::InvalidInput(
            "Quiz submission contains no answers".to_string(),
        ));
    }

    let mut seen_questions = HashSet::new();
    for answer in answers {
        if !seen_questions.insert(answer.question_id) {
            return Err(AppError::InvalidInput(format!(
                "Duplicate question in submission: {}",
                answer.question_id
            )));
        }
    }

    let mut aggregation = GenreAggregation::default();
    for answer in answers {
        let signals = store.genres_for_answer(answer.answer_id).await?;
        for signal in signals {
            *aggregation
                .frequencies
                .entry(signal.external_genre_id)
                .or_insert(0) += 1;
            aggregation.occurrences.push(signal);
        }
    }

    tracing::debug!(
        answers = answers.len(),
        distinct_genres = aggregation.frequencies.len(),
        occurrences = aggregation.occurrences.len(),
        "Aggregated genre frequencies"
    );

    Ok(aggregation)
}
