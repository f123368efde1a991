use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{GenreSignal, MediaCandidate, MediaKind, Tier, Tiered};

/// Durable state for quiz instances
///
/// The only component of the recommendation pipeline with durable state.
/// Everything upstream hands its output here and retains no reference to
/// the instance afterwards.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Allocates a new, empty quiz instance and returns its identifier.
    ///
    /// Called before any recommendation work begins so the identifier can be
    /// handed back even when downstream fetches partially fail.
    async fn create_instance(&self) -> AppResult<Uuid>;

    /// Appends one submitted-answer record to an instance.
    async fn record_answer(
        &self,
        instance_id: Uuid,
        question_id: i64,
        answer_id: i64,
    ) -> AppResult<()>;

    /// Atomically increments the per-instance frequency counter for a genre,
    /// inserting it at `delta` when absent.
    async fn record_genre_frequency(
        &self,
        instance_id: Uuid,
        signal: &GenreSignal,
        delta: i32,
    ) -> AppResult<()>;

    /// Persists the reduced recommendation tiers for an instance.
    ///
    /// Idempotent: re-invocation with the same media set must not create
    /// duplicate `(instance, media, tier)` associations. Marks the instance
    /// as completed even when every tier is empty.
    async fn store_recommendations(
        &self,
        instance_id: Uuid,
        tiers: &Tiered<Vec<MediaCandidate>>,
    ) -> AppResult<()>;

    /// Returns the recorded recommendation tiers for an instance.
    ///
    /// Fails with `NotFound` when the instance is unknown or no
    /// recommendations have been recorded for it yet.
    async fn get_results(&self, instance_id: Uuid) -> AppResult<Tiered<Vec<MediaCandidate>>>;

    /// Genres attached to one quiz answer. `NotFound` for an unknown answer;
    /// an answer with no attached genres yields an empty list.
    async fn genres_for_answer(&self, answer_id: i64) -> AppResult<Vec<GenreSignal>>;

    /// Resolves an English language name to its ISO 639-1 code.
    async fn language_code(&self, english_name: &str) -> AppResult<String>;
}

/// Postgres-backed quiz instance store
#[derive(Clone)]
pub struct PgQuizStore {
    pool: PgPool,
}

impl PgQuizStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upserts one media row and returns its internal id
    async fn upsert_media(&self, candidate: &MediaCandidate) -> AppResult<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO media (external_id, media_kind, title, overview, poster_url, release_date, runtime)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (external_id, media_kind)
            DO UPDATE SET title = EXCLUDED.title
            RETURNING id
            "#,
        )
        .bind(candidate.external_id)
        .bind(candidate.media_kind.as_str())
        .bind(&candidate.title)
        .bind(&candidate.overview)
        .bind(&candidate.poster_url)
        .bind(&candidate.release_date)
        .bind(candidate.runtime)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("id")?)
    }
}

#[async_trait]
impl QuizStore for PgQuizStore {
    async fn create_instance(&self) -> AppResult<Uuid> {
        let instance_id = Uuid::new_v4();

        sqlx::query("INSERT INTO quiz_instances (id) VALUES ($1)")
            .bind(instance_id)
            .execute(&self.pool)
            .await?;

        tracing::debug!(instance_id = %instance_id, "Quiz instance created");

        Ok(instance_id)
    }

    async fn record_answer(
        &self,
        instance_id: Uuid,
        question_id: i64,
        answer_id: i64,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO quiz_answers (quiz_instance_id, question_id, answer_id)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(instance_id)
        .bind(question_id)
        .bind(answer_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => Err(
                AppError::InvalidInput(format!("Unknown quiz instance: {}", instance_id)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn record_genre_frequency(
        &self,
        instance_id: Uuid,
        signal: &GenreSignal,
        delta: i32,
    ) -> AppResult<()> {
        // Atomic upsert-increment; concurrent recordings for the same
        // (instance, genre) pair serialize at the row level.
        sqlx::query(
            r#"
            INSERT INTO quiz_genre_frequency
                (quiz_instance_id, genre_id, genre_external_id, genre_kind, frequency)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (quiz_instance_id, genre_id)
            DO UPDATE SET frequency = quiz_genre_frequency.frequency + EXCLUDED.frequency
            "#,
        )
        .bind(instance_id)
        .bind(signal.genre_id)
        .bind(signal.external_genre_id)
        .bind(signal.genre_kind.as_str())
        .bind(delta)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn store_recommendations(
        &self,
        instance_id: Uuid,
        tiers: &Tiered<Vec<MediaCandidate>>,
    ) -> AppResult<()> {
        for tier in Tier::ALL {
            for candidate in tiers.get(tier) {
                let media_id = self.upsert_media(candidate).await?;

                // Existing associations are skipped, making re-invocation
                // with the same media set a no-op.
                sqlx::query(
                    r#"
                    INSERT INTO quiz_recommendations (quiz_instance_id, media_id, tier)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (quiz_instance_id, media_id, tier) DO NOTHING
                    "#,
                )
                .bind(instance_id)
                .bind(media_id)
                .bind(tier.as_str())
                .execute(&self.pool)
                .await?;
            }
        }

        let updated = sqlx::query(
            "UPDATE quiz_instances SET completed_at = now() WHERE id = $1",
        )
        .bind(instance_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "No quiz instance found: {}",
                instance_id
            )));
        }

        Ok(())
    }

    async fn get_results(&self, instance_id: Uuid) -> AppResult<Tiered<Vec<MediaCandidate>>> {
        let instance = sqlx::query("SELECT completed_at FROM quiz_instances WHERE id = $1")
            .bind(instance_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(instance) = instance else {
            return Err(AppError::NotFound(format!(
                "No quiz instance found: {}",
                instance_id
            )));
        };

        let completed_at: Option<chrono::DateTime<chrono::Utc>> =
            instance.try_get("completed_at")?;
        if completed_at.is_none() {
            return Err(AppError::NotFound(format!(
                "No recommendations recorded for quiz instance: {}",
                instance_id
            )));
        }

        let rows = sqlx::query(
            r#"
            SELECT qr.tier, m.external_id, m.media_kind, m.title, m.overview,
                   m.poster_url, m.release_date, m.runtime
            FROM quiz_recommendations qr
            JOIN media m ON m.id = qr.media_id
            WHERE qr.quiz_instance_id = $1
            ORDER BY m.id
            "#,
        )
        .bind(instance_id)
        .fetch_all(&self.pool)
        .await?;

        let mut recommendations = Tiered::<Vec<MediaCandidate>>::default();
        for row in rows {
            let tier: Tier = row.try_get::<String, _>("tier")?.parse()?;
            let media_kind: MediaKind = row.try_get::<String, _>("media_kind")?.parse()?;

            recommendations.get_mut(tier).push(MediaCandidate {
                external_id: row.try_get("external_id")?,
                title: row.try_get("title")?,
                overview: row.try_get("overview")?,
                poster_url: row.try_get("poster_url")?,
                media_kind,
                release_date: row.try_get("release_date")?,
                runtime: row.try_get("runtime")?,
            });
        }

        Ok(recommendations)
    }

    async fn genres_for_answer(&self, answer_id: i64) -> AppResult<Vec<GenreSignal>> {
        let rows = sqlx::query(
            r#"
            SELECT g.id AS genre_id, g.external_id, g.kind
            FROM answers a
            LEFT JOIN answers_genres ag ON ag.answer_id = a.id
            LEFT JOIN genres g ON g.id = ag.genre_id
            WHERE a.id = $1
            "#,
        )
        .bind(answer_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(AppError::NotFound(format!("No answer found: {}", answer_id)));
        }

        let mut signals = Vec::new();
        for row in rows {
            // LEFT JOIN yields one all-null genre row for untagged answers
            let genre_id: Option<i64> = row.try_get("genre_id")?;
            let Some(genre_id) = genre_id else { continue };

            let genre_kind: MediaKind = row.try_get::<String, _>("kind")?.parse()?;
            signals.push(GenreSignal {
                genre_id,
                external_genre_id: row.try_get("external_id")?,
                genre_kind,
            });
        }

        Ok(signals)
    }

    async fn language_code(&self, english_name: &str) -> AppResult<String> {
        let row = sqlx::query("SELECT iso_639_1 FROM languages WHERE english_name = $1")
            .bind(english_name)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(row.try_get("iso_639_1")?),
            None => Err(AppError::NotFound(format!(
                "No language found: {}",
                english_name
            ))),
        }
    }
}
