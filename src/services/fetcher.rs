use std::sync::Arc;

use crate::error::AppError;
use crate::models::{MediaCandidate, MediaKind, Tier, Tiered};
use crate::services::catalog::CatalogClient;
use crate::services::query::DiscoverQuery;

/// One catalog query that did not produce candidates
#[derive(Debug)]
pub struct FetchFailure {
    pub tier: Tier,
    pub media_kind: MediaKind,
    pub error: AppError,
}

/// Raw per-tier candidates plus the failures absorbed while fetching
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub candidates: Tiered<Vec<MediaCandidate>>,
    pub failures: Vec<FetchFailure>,
}

/// Executes discover queries against the catalog in parallel.
///
/// Queries for distinct tier/kind pairs have no ordering dependency, so each
/// runs in its own task; at most six are ever in flight for one submission.
/// A failed or timed-out query contributes an empty candidate list for its
/// tier/kind and is recorded in the outcome instead of aborting siblings.
/// Joining in dispatch order keeps a tier's movie results ahead of its show
/// results when both kinds were requested.
pub async fn fetch_candidates(
    catalog: Arc<dyn CatalogClient>,
    queries: Vec<DiscoverQuery>,
) -> FetchOutcome {
    let mut tasks = Vec::new();
    for query in queries {
        let tier = query.tier;
        let media_kind = query.media_kind;
        let catalog = Arc::clone(&catalog);
        let task = tokio::spawn(async move { catalog.discover(&query).await });
        tasks.push((tier, media_kind, task));
    }

    let mut outcome = FetchOutcome::default();
    for (tier, media_kind, task) in tasks {
        let result = match task.await {
            Ok(result) => result,
            Err(join_error) => Err(AppError::Internal(join_error.to_string())),
        };

        match result {
            Ok(candidates) => {
                outcome.candidates.get_mut(tier).extend(candidates);
            }
            Err(error) => {
                tracing::warn!(
                    tier = %tier,
                    media_kind = %media_kind,
                    error = %error,
                    "Catalog query failed, tier continues without its results"
                );
                outcome.failures.push(FetchFailure {
                    tier,
                    media_kind,
                    error,
                });
            }
        }
    }

    if !outcome.failures.is_empty() {
        tracing::warn!(
            failed = outcome.failures.len(),
            "Partial catalog fetch failure"
        );
    }

    outcome
}
