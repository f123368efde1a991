use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use uuid::Uuid;

use crate::error::AppError;

/// Base URL for TMDB poster/backdrop images at the width the UI renders
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// Count of quiz-answer genre occurrences, keyed by external (TMDB) genre id
pub type GenreFrequencyMap = HashMap<i64, u32>;

/// Kind of media a candidate or genre belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Show,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Show => "show",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" | "movies" => Ok(MediaKind::Movie),
            "show" | "shows" | "tv" => Ok(MediaKind::Show),
            other => Err(AppError::InvalidInput(format!(
                "Unknown media kind: {}",
                other
            ))),
        }
    }
}

/// Media kind requested by a quiz submission
///
/// Accepts the quiz answer wording ("movies" / "shows") as well as the
/// singular forms used elsewhere in the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestedMedia {
    #[serde(alias = "movies")]
    Movie,
    #[serde(alias = "shows", alias = "tv")]
    Show,
    Both,
}

impl RequestedMedia {
    /// Concrete kinds to query for, movie before show
    pub fn kinds(&self) -> &'static [MediaKind] {
        match self {
            RequestedMedia::Movie => &[MediaKind::Movie],
            RequestedMedia::Show => &[MediaKind::Show],
            RequestedMedia::Both => &[MediaKind::Movie, MediaKind::Show],
        }
    }
}

/// Priority tier a genre (and its recommendations) is bucketed into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    High,
    Medium,
    Low,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::High, Tier::Medium, Tier::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::High => "high",
            Tier::Medium => "medium",
            Tier::Low => "low",
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Tier::High),
            "medium" => Ok(Tier::Medium),
            "low" => Ok(Tier::Low),
            other => Err(AppError::Internal(format!("Unknown tier: {}", other))),
        }
    }
}

/// Per-tier container for genre buckets, raw candidates and reduced results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tiered<T> {
    pub high: T,
    pub medium: T,
    pub low: T,
}

impl<T> Tiered<T> {
    pub fn get(&self, tier: Tier) -> &T {
        match tier {
            Tier::High => &self.high,
            Tier::Medium => &self.medium,
            Tier::Low => &self.low,
        }
    }

    pub fn get_mut(&mut self, tier: Tier) -> &mut T {
        match tier {
            Tier::High => &mut self.high,
            Tier::Medium => &mut self.medium,
            Tier::Low => &mut self.low,
        }
    }
}

/// The amount of time the user has available to watch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    Under45Minutes,
    UpToOneHour,
    OneToTwoHours,
    TwoToThreeHours,
    ThreeToFourHours,
    FourPlusHours,
}

impl TimeBucket {
    /// Parses the quiz answer wording for the available-time question.
    ///
    /// Returns `None` for anything outside the fixed answer set; callers
    /// treat that as "no runtime cap" rather than filtering everything out.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "less than 45 minutes" => Some(TimeBucket::Under45Minutes),
            "45 minutes - 1 hour" => Some(TimeBucket::UpToOneHour),
            "1 - 2 hours" => Some(TimeBucket::OneToTwoHours),
            "2 - 3 hours" => Some(TimeBucket::TwoToThreeHours),
            "3 - 4 hours" => Some(TimeBucket::ThreeToFourHours),
            "4+ hours" => Some(TimeBucket::FourPlusHours),
            _ => None,
        }
    }

    /// Maximum runtime in minutes the catalog query may ask for
    pub fn max_runtime_minutes(&self) -> i32 {
        match self {
            TimeBucket::Under45Minutes => 45,
            TimeBucket::UpToOneHour => 60,
            TimeBucket::OneToTwoHours => 120,
            TimeBucket::TwoToThreeHours => 180,
            TimeBucket::ThreeToFourHours => 240,
            TimeBucket::FourPlusHours => 360,
        }
    }
}

/// One selected answer within a quiz submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSelection {
    pub question_id: i64,
    pub answer_id: i64,
}

/// A genre attached to a quiz answer, contributing to frequency counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenreSignal {
    pub genre_id: i64,
    pub external_genre_id: i64,
    pub genre_kind: MediaKind,
}

/// A full quiz submission as received from the client
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmission {
    pub answers: Vec<AnswerSelection>,
    pub media_type: RequestedMedia,
    /// English language name, resolved to an ISO 639-1 code via the store
    pub language: String,
    /// Available-time answer wording, e.g. "1 - 2 hours"
    pub available_time: String,
}

/// A catalog result normalized into the internal media representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaCandidate {
    pub external_id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub media_kind: MediaKind,
    pub release_date: Option<String>,
    pub runtime: Option<i32>,
}

/// Recommendations computed for one quiz instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResults {
    pub quiz_instance_id: Uuid,
    pub recommendations: Tiered<Vec<MediaCandidate>>,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Raw TMDB discover response
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverResponse {
    #[serde(default)]
    pub results: Vec<ApiMedia>,
}

/// One raw item from a TMDB discover page
///
/// Movies and TV shows share one shape with differently named fields
/// (`title` vs `name`, `release_date` vs `first_air_date`); the conversion
/// picks by the kind of the query that produced the item.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMedia {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub episode_run_time: Vec<i32>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
}

impl ApiMedia {
    /// Converts a raw item into a candidate, tagging the kind from the query
    /// that produced it rather than inferring it from the payload.
    pub fn into_candidate(self, kind: MediaKind) -> MediaCandidate {
        let title = match kind {
            MediaKind::Movie => self.title.or(self.name),
            MediaKind::Show => self.name.or(self.title),
        }
        .unwrap_or_default();

        let runtime = match kind {
            MediaKind::Movie => self.runtime,
            MediaKind::Show => self.episode_run_time.first().copied(),
        };

        let release_date = match kind {
            MediaKind::Movie => self.release_date,
            MediaKind::Show => self.first_air_date,
        }
        .filter(|date| !date.is_empty());

        MediaCandidate {
            external_id: self.id,
            title,
            overview: self.overview.filter(|o| !o.is_empty()),
            poster_url: self
                .poster_path
                .map(|path| format!("{}{}", IMAGE_BASE_URL, path)),
            media_kind: kind,
            release_date,
            runtime,
        }
    }
}

/// Raw TMDB single-media detail response (`/movie/{id}` or `/tv/{id}`)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMediaDetails {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub episode_run_time: Vec<i32>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub last_air_date: Option<String>,
    #[serde(default)]
    pub number_of_seasons: Option<i32>,
    #[serde(default)]
    pub number_of_episodes: Option<i32>,
    #[serde(default)]
    pub spoken_languages: Vec<ApiSpokenLanguage>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSpokenLanguage {
    pub english_name: String,
}

/// Detail view of a single movie or show returned to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDetails {
    pub external_id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub media_kind: MediaKind,
    pub release_date: Option<String>,
    pub last_air_date: Option<String>,
    pub runtime: Option<i32>,
    pub seasons: Option<i32>,
    pub episodes: Option<i32>,
    pub spoken_languages: String,
    pub status: Option<String>,
    pub tagline: Option<String>,
}

impl ApiMediaDetails {
    pub fn into_details(self, kind: MediaKind) -> MediaDetails {
        let title = match kind {
            MediaKind::Movie => self.title.or(self.name),
            MediaKind::Show => self.name.or(self.title),
        }
        .unwrap_or_default();

        let runtime = match kind {
            MediaKind::Movie => self.runtime,
            MediaKind::Show => self.episode_run_time.first().copied(),
        };

        let release_date = match kind {
            MediaKind::Movie => self.release_date,
            MediaKind::Show => self.first_air_date,
        }
        .filter(|date| !date.is_empty());

        MediaDetails {
            external_id: self.id,
            title,
            overview: self.overview,
            poster_url: self
                .poster_path
                .map(|path| format!("{}{}", IMAGE_BASE_URL, path)),
            backdrop_url: self
                .backdrop_path
                .map(|path| format!("{}{}", IMAGE_BASE_URL, path)),
            media_kind: kind,
            release_date,
            last_air_date: match kind {
                MediaKind::Movie => None,
                MediaKind::Show => self.last_air_date,
            },
            runtime,
            seasons: match kind {
                MediaKind::Movie => None,
                MediaKind::Show => self.number_of_seasons,
            },
            episodes: match kind {
                MediaKind::Movie => None,
                MediaKind::Show => self.number_of_episodes,
            },
            spoken_languages: self
                .spoken_languages
                .into_iter()
                .map(|lang| lang.english_name)
                .collect::<Vec<_>>()
                .join(", "),
            status: self.status,
            tagline: self.tagline,
        }
    }
}
