use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::json;
use uuid::Uuid;

use reelquiz_api::{
    db::QuizStore,
    error::{AppError, AppResult},
    models::{
        GenreSignal, MediaCandidate, MediaDetails, MediaKind, Tier, Tiered,
    },
    routes::{create_router, AppState},
    services::catalog::CatalogClient,
    services::query::DiscoverQuery,
};

// ============================================================================
// In-memory collaborators
// ============================================================================

#[derive(Default)]
struct InstanceRecord {
    answers: Vec<(i64, i64)>,
    frequencies: HashMap<i64, i64>,
    recommendations: Option<Tiered<Vec<MediaCandidate>>>,
}

/// Store double with the same contract as the Postgres implementation
#[derive(Default)]
struct InMemoryStore {
    inner: Mutex<InMemoryStoreInner>,
}

#[derive(Default)]
struct InMemoryStoreInner {
    instances: HashMap<Uuid, InstanceRecord>,
    genres_by_answer: HashMap<i64, Vec<GenreSignal>>,
    languages: HashMap<String, String>,
}

impl InMemoryStore {
    fn new() -> Self {
        Self::default()
    }

    fn seed_answer(&self, answer_id: i64, genres: Vec<GenreSignal>) {
        self.inner
            .lock()
            .unwrap()
            .genres_by_answer
            .insert(answer_id, genres);
    }

    fn seed_language(&self, english_name: &str, code: &str) {
        self.inner
            .lock()
            .unwrap()
            .languages
            .insert(english_name.to_string(), code.to_string());
    }

    fn frequency(&self, instance_id: Uuid, genre_id: i64) -> Option<i64> {
        self.inner
            .lock()
            .unwrap()
            .instances
            .get(&instance_id)
            .and_then(|record| record.frequencies.get(&genre_id).copied())
    }

    fn answer_count(&self, instance_id: Uuid) -> usize {
        self.inner
            .lock()
            .unwrap()
            .instances
            .get(&instance_id)
            .map(|record| record.answers.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl QuizStore for InMemoryStore {
    async fn create_instance(&self) -> AppResult<Uuid> {
        let instance_id = Uuid::new_v4();
        self.inner
            .lock()
            .unwrap()
            .instances
            .insert(instance_id, InstanceRecord::default());
        Ok(instance_id)
    }

    async fn record_answer(
        &self,
        instance_id: Uuid,
        question_id: i64,
        answer_id: i64,
    ) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner.instances.get_mut(&instance_id).ok_or_else(|| {
            AppError::InvalidInput(format!("Unknown quiz instance: {}", instance_id))
        })?;
        record.answers.push((question_id, answer_id));
        Ok(())
    }

    async fn record_genre_frequency(
        &self,
        instance_id: Uuid,
        signal: &GenreSignal,
        delta: i32,
    ) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner.instances.get_mut(&instance_id).ok_or_else(|| {
            AppError::InvalidInput(format!("Unknown quiz instance: {}", instance_id))
        })?;
        *record.frequencies.entry(signal.genre_id).or_insert(0) += delta as i64;
        Ok(())
    }

    async fn store_recommendations(
        &self,
        instance_id: Uuid,
        tiers: &Tiered<Vec<MediaCandidate>>,
    ) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .instances
            .get_mut(&instance_id)
            .ok_or_else(|| AppError::NotFound(format!("No quiz instance found: {}", instance_id)))?;

        let stored = record
            .recommendations
            .get_or_insert_with(Tiered::default);

        // Mirrors the (instance, media, tier) uniqueness of the real schema
        for tier in Tier::ALL {
            let existing: HashSet<i64> =
                stored.get(tier).iter().map(|c| c.external_id).collect();
            for candidate in tiers.get(tier) {
                if !existing.contains(&candidate.external_id) {
                    stored.get_mut(tier).push(candidate.clone());
                }
            }
        }
        Ok(())
    }

    async fn get_results(&self, instance_id: Uuid) -> AppResult<Tiered<Vec<MediaCandidate>>> {
        let inner = self.inner.lock().unwrap();
        let record = inner
            .instances
            .get(&instance_id)
            .ok_or_else(|| AppError::NotFound(format!("No quiz instance found: {}", instance_id)))?;
        record.recommendations.clone().ok_or_else(|| {
            AppError::NotFound(format!(
                "No recommendations recorded for quiz instance: {}",
                instance_id
            ))
        })
    }

    async fn genres_for_answer(&self, answer_id: i64) -> AppResult<Vec<GenreSignal>> {
        self.inner
            .lock()
            .unwrap()
            .genres_by_answer
            .get(&answer_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("No answer found: {}", answer_id)))
    }

    async fn language_code(&self, english_name: &str) -> AppResult<String> {
        self.inner
            .lock()
            .unwrap()
            .languages
            .get(english_name)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("No language found: {}", english_name)))
    }
}

/// Catalog double returning a deterministic page per tier/kind
#[derive(Default)]
struct StubCatalog {
    fail_tiers: Vec<Tier>,
    results_per_query: usize,
}

impl StubCatalog {
    fn new() -> Self {
        Self {
            fail_tiers: Vec::new(),
            results_per_query: 6,
        }
    }

    fn failing_for(tiers: Vec<Tier>) -> Self {
        Self {
            fail_tiers: tiers,
            results_per_query: 6,
        }
    }

    fn id_base(tier: Tier, kind: MediaKind) -> i64 {
        let tier_base = match tier {
            Tier::High => 1000,
            Tier::Medium => 2000,
            Tier::Low => 3000,
        };
        let kind_offset = match kind {
            MediaKind::Movie => 0,
            MediaKind::Show => 500,
        };
        tier_base + kind_offset
    }
}

#[async_trait]
impl CatalogClient for StubCatalog {
    async fn discover(&self, query: &DiscoverQuery) -> AppResult<Vec<MediaCandidate>> {
        if self.fail_tiers.contains(&query.tier) {
            return Err(AppError::ExternalApi("catalog timed out".to_string()));
        }

        let base = Self::id_base(query.tier, query.media_kind);
        Ok((0..self.results_per_query as i64)
            .map(|i| MediaCandidate {
                external_id: base + i,
                title: format!("{} {} {}", query.tier, query.media_kind, i),
                overview: None,
                poster_url: None,
                media_kind: query.media_kind,
                release_date: Some("2020-01-01".to_string()),
                runtime: Some(110),
            })
            .collect())
    }

    async fn media_details(&self, kind: MediaKind, external_id: i64) -> AppResult<MediaDetails> {
        if external_id == 404 {
            return Err(AppError::NotFound(format!(
                "No {} found in catalog: {}",
                kind, external_id
            )));
        }
        Ok(MediaDetails {
            external_id,
            title: "Inception".to_string(),
            overview: Some("A thief who steals corporate secrets".to_string()),
            poster_url: None,
            backdrop_url: None,
            media_kind: kind,
            release_date: Some("2010-07-16".to_string()),
            last_air_date: None,
            runtime: Some(148),
            seasons: None,
            episodes: None,
            spoken_languages: "English".to_string(),
            status: Some("Released".to_string()),
            tagline: None,
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn signal(genre_id: i64, external: i64) -> GenreSignal {
    GenreSignal {
        genre_id,
        external_genre_id: external,
        genre_kind: MediaKind::Movie,
    }
}

fn create_test_server(store: Arc<InMemoryStore>, catalog: Arc<dyn CatalogClient>) -> TestServer {
    let state = AppState {
        store,
        catalog,
    };
    TestServer::new(create_router(state)).unwrap()
}

/// Store seeded with one action-tagged answer and an English language row
fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.seed_answer(10, vec![signal(1, 28)]);
    store.seed_answer(11, vec![signal(2, 12), signal(3, 35)]);
    store.seed_language("English", "en");
    store
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(seeded_store(), Arc::new(StubCatalog::new()));
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_submit_and_fetch_results() {
    let store = seeded_store();
    let server = create_test_server(store.clone(), Arc::new(StubCatalog::new()));

    let response = server
        .post("/api/v1/quiz/submit")
        .json(&json!({
            "answers": [
                { "questionId": 1, "answerId": 10 },
                { "questionId": 2, "answerId": 11 }
            ],
            "mediaType": "movies",
            "language": "English",
            "availableTime": "1 - 2 hours"
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    let created: serde_json::Value = response.json();
    let instance_id: Uuid = created["quizInstanceId"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();

    // Both answers recorded, every genre occurrence counted once
    assert_eq!(store.answer_count(instance_id), 2);
    assert_eq!(store.frequency(instance_id, 1), Some(1));
    assert_eq!(store.frequency(instance_id, 2), Some(1));

    let response = server
        .get(&format!("/api/v1/quiz/{}/results", instance_id))
        .await;
    response.assert_status_ok();
    let results: serde_json::Value = response.json();

    assert_eq!(results["quizInstanceId"], created["quizInstanceId"]);
    // All genres appear once, so everything lands in the low tier, capped at 4
    assert_eq!(results["recommendations"]["high"].as_array().unwrap().len(), 0);
    assert_eq!(results["recommendations"]["medium"].as_array().unwrap().len(), 0);
    let low = results["recommendations"]["low"].as_array().unwrap();
    assert_eq!(low.len(), 4);
    assert!(low.iter().all(|c| c["mediaKind"] == "movie"));
}

#[tokio::test]
async fn test_submit_duplicate_question_rejected() {
    let server = create_test_server(seeded_store(), Arc::new(StubCatalog::new()));

    let response = server
        .post("/api/v1/quiz/submit")
        .json(&json!({
            "answers": [
                { "questionId": 1, "answerId": 10 },
                { "questionId": 1, "answerId": 11 }
            ],
            "mediaType": "movies",
            "language": "English",
            "availableTime": "1 - 2 hours"
        }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_unknown_answer_rejected() {
    let server = create_test_server(seeded_store(), Arc::new(StubCatalog::new()));

    let response = server
        .post("/api/v1/quiz/submit")
        .json(&json!({
            "answers": [{ "questionId": 1, "answerId": 999 }],
            "mediaType": "movies",
            "language": "English",
            "availableTime": "1 - 2 hours"
        }))
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_unknown_language_rejected() {
    let server = create_test_server(seeded_store(), Arc::new(StubCatalog::new()));

    let response = server
        .post("/api/v1/quiz/submit")
        .json(&json!({
            "answers": [{ "questionId": 1, "answerId": 10 }],
            "mediaType": "movies",
            "language": "Klingon",
            "availableTime": "1 - 2 hours"
        }))
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_both_kinds_mixes_movies_and_shows() {
    let store = seeded_store();
    let server = create_test_server(store, Arc::new(StubCatalog::new()));

    let response = server
        .post("/api/v1/quiz/submit")
        .json(&json!({
            "answers": [{ "questionId": 1, "answerId": 10 }],
            "mediaType": "both",
            "language": "English",
            "availableTime": "4+ hours"
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    let created: serde_json::Value = response.json();
    let instance_id = created["quizInstanceId"].as_str().unwrap();

    let results: serde_json::Value = server
        .get(&format!("/api/v1/quiz/{}/results", instance_id))
        .await
        .json();

    // 6 movies + 6 shows deduplicate to 12 unique ids and reduce to 4
    let low = results["recommendations"]["low"].as_array().unwrap();
    assert_eq!(low.len(), 4);
}

#[tokio::test]
async fn test_failed_tier_fetch_leaves_tier_empty() {
    let store = Arc::new(InMemoryStore::new());
    // Eleven answers tagged with the same genre push it into the medium tier
    for answer_id in 100..111 {
        store.seed_answer(answer_id, vec![signal(50, 878)]);
    }
    store.seed_answer(200, vec![signal(60, 28)]);
    store.seed_language("English", "en");

    let server = create_test_server(
        store,
        Arc::new(StubCatalog::failing_for(vec![Tier::Medium])),
    );

    let mut answers: Vec<serde_json::Value> = (0..11)
        .map(|i| json!({ "questionId": i + 1, "answerId": 100 + i }))
        .collect();
    answers.push(json!({ "questionId": 12, "answerId": 200 }));

    let response = server
        .post("/api/v1/quiz/submit")
        .json(&json!({
            "answers": answers,
            "mediaType": "movies",
            "language": "English",
            "availableTime": "2 - 3 hours"
        }))
        .await;

    // A failed tier never fails the submission
    response.assert_status(axum::http::StatusCode::CREATED);
    let created: serde_json::Value = response.json();
    let instance_id = created["quizInstanceId"].as_str().unwrap();

    let results: serde_json::Value = server
        .get(&format!("/api/v1/quiz/{}/results", instance_id))
        .await
        .json();

    assert_eq!(
        results["recommendations"]["medium"].as_array().unwrap().len(),
        0
    );
    assert_eq!(results["recommendations"]["low"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_results_unknown_instance() {
    let server = create_test_server(seeded_store(), Arc::new(StubCatalog::new()));

    let response = server
        .get(&format!("/api/v1/quiz/{}/results", Uuid::new_v4()))
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_results_before_recommendations_recorded() {
    let store = seeded_store();
    let server = create_test_server(store.clone(), Arc::new(StubCatalog::new()));

    let instance_id = store.create_instance().await.unwrap();

    let response = server
        .get(&format!("/api/v1/quiz/{}/results", instance_id))
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_store_recommendations_idempotent() {
    let store = InMemoryStore::new();
    let instance_id = store.create_instance().await.unwrap();

    let tiers = Tiered {
        high: vec![MediaCandidate {
            external_id: 27205,
            title: "Inception".to_string(),
            overview: None,
            poster_url: None,
            media_kind: MediaKind::Movie,
            release_date: None,
            runtime: Some(148),
        }],
        medium: vec![],
        low: vec![],
    };

    store.store_recommendations(instance_id, &tiers).await.unwrap();
    store.store_recommendations(instance_id, &tiers).await.unwrap();

    let results = store.get_results(instance_id).await.unwrap();
    assert_eq!(results.high.len(), 1);
    assert!(results.medium.is_empty() && results.low.is_empty());
}

#[tokio::test]
async fn test_media_details_endpoint() {
    let server = create_test_server(seeded_store(), Arc::new(StubCatalog::new()));

    let response = server.get("/api/v1/media/movie/27205").await;
    response.assert_status_ok();
    let details: serde_json::Value = response.json();
    assert_eq!(details["title"], "Inception");
    assert_eq!(details["mediaKind"], "movie");

    let response = server.get("/api/v1/media/movie/404").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);

    let response = server.get("/api/v1/media/radio/1").await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}
