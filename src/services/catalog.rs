use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{ApiMediaDetails, DiscoverResponse, MediaCandidate, MediaDetails, MediaKind};
use crate::services::query::DiscoverQuery;

/// External media catalog abstraction
///
/// The engine only needs query-by-criteria and get-by-id; everything else
/// about the catalog's search semantics stays on the catalog's side.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Runs one discover query and normalizes the results.
    async fn discover(&self, query: &DiscoverQuery) -> AppResult<Vec<MediaCandidate>>;

    /// Fetches the detail view of a single movie or show.
    async fn media_details(&self, kind: MediaKind, external_id: i64) -> AppResult<MediaDetails>;
}

/// TMDB-backed catalog client
#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_url: String,
    bearer_token: String,
}

impl TmdbCatalog {
    /// Creates a TMDB client with a bounded per-request timeout.
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.catalog_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            api_url: config.tmdb_api_url.clone(),
            bearer_token: config.tmdb_bearer_token.clone(),
        })
    }

    fn discover_path(kind: MediaKind) -> &'static str {
        match kind {
            MediaKind::Movie => "discover/movie",
            MediaKind::Show => "discover/tv",
        }
    }

    fn details_path(kind: MediaKind) -> &'static str {
        match kind {
            MediaKind::Movie => "movie",
            MediaKind::Show => "tv",
        }
    }
}

#[async_trait]
impl CatalogClient for TmdbCatalog {
    async fn discover(&self, query: &DiscoverQuery) -> AppResult<Vec<MediaCandidate>> {
        let url = format!("{}/{}", self.api_url, Self::discover_path(query.media_kind));

        let genre_disjunction = query
            .genre_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join("|");

        let mut params = vec![
            ("with_genres".to_string(), genre_disjunction),
            ("with_original_language".to_string(), query.language.clone()),
            ("sort_by".to_string(), "popularity.desc".to_string()),
            (
                "vote_average.gte".to_string(),
                query.min_vote_average.to_string(),
            ),
        ];
        if let Some(max_runtime) = query.max_runtime {
            params.push(("with_runtime.lte".to_string(), max_runtime.to_string()));
        }

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let discover: DiscoverResponse = response.json().await?;
        let candidates: Vec<MediaCandidate> = discover
            .results
            .into_iter()
            .map(|media| media.into_candidate(query.media_kind))
            .collect();

        tracing::info!(
            tier = %query.tier,
            media_kind = %query.media_kind,
            results = candidates.len(),
            "Discover query completed"
        );

        Ok(candidates)
    }

    async fn media_details(&self, kind: MediaKind, external_id: i64) -> AppResult<MediaDetails> {
        let url = format!(
            "{}/{}/{}",
            self.api_url,
            Self::details_path(kind),
            external_id
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(&[("language", "en-US")])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!(
                "No {} found in catalog: {}",
                kind, external_id
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let details: ApiMediaDetails = response.json().await?;

        tracing::debug!(media_kind = %kind, external_id, "Fetched media details");

        Ok(details.into_details(kind))
    }
}
