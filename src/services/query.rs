use crate::models::{MediaKind, RequestedMedia, Tier, Tiered, TimeBucket};

/// Minimum average rating every discover query asks for
pub const MIN_VOTE_AVERAGE: f32 = 5.0;

/// One external-catalog discover query, scoped to a tier and media kind
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverQuery {
    pub tier: Tier,
    pub media_kind: MediaKind,
    /// Matched as a disjunction ("28|12") on the catalog side
    pub genre_ids: Vec<i64>,
    pub language: String,
    pub min_vote_average: f32,
    /// `None` means no runtime cap
    pub max_runtime: Option<i32>,
}

/// Builds one discover query per populated tier and requested media kind.
///
/// A `Both` request produces independent movie and show queries per tier,
/// movie first. Tiers with an empty genre list produce no query at all, so
/// at most six queries come out of one submission.
pub fn build_queries(
    buckets: &Tiered<Vec<i64>>,
    requested: RequestedMedia,
    language: &str,
    available_time: Option<TimeBucket>,
) -> Vec<DiscoverQuery> {
    let max_runtime = available_time.map(|bucket| bucket.max_runtime_minutes());

    let mut queries = Vec::new();
    for tier in Tier::ALL {
        let genre_ids = buckets.get(tier);
        if genre_ids.is_empty() {
            continue;
        }

        for &media_kind in requested.kinds() {
            queries.push(DiscoverQuery {
                tier,
                media_kind,
                genre_ids: genre_ids.clone(),
                language: language.to_string(),
                min_vote_average: MIN_VOTE_AVERAGE,
                max_runtime,
            });
        }
    }

    queries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buckets(high: Vec<i64>, medium: Vec<i64>, low: Vec<i64>) -> Tiered<Vec<i64>> {
        Tiered { high, medium, low }
    }

    #[test]
    fn test_build_queries_one_per_populated_tier() {
        let queries = build_queries(
            &buckets(vec![28], vec![], vec![12, 35]),
            RequestedMedia::Movie,
            "en",
            TimeBucket::from_label("1 - 2 hours"),
        );

        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].tier, Tier::High);
        assert_eq!(queries[0].genre_ids, vec![28]);
        assert_eq!(queries[1].tier, Tier::Low);
        assert_eq!(queries[1].genre_ids, vec![12, 35]);
    }

    #[test]
    fn test_build_queries_both_kinds_movie_first() {
        let queries = build_queries(
            &buckets(vec![28], vec![], vec![]),
            RequestedMedia::Both,
            "en",
            None,
        );

        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].media_kind, MediaKind::Movie);
        assert_eq!(queries[1].media_kind, MediaKind::Show);
        assert_eq!(queries[0].tier, Tier::High);
        assert_eq!(queries[1].tier, Tier::High);
    }

    #[test]
    fn test_build_queries_one_to_two_hours_caps_at_120() {
        let queries = build_queries(
            &buckets(vec![28], vec![], vec![]),
            RequestedMedia::Movie,
            "en",
            TimeBucket::from_label("1 - 2 hours"),
        );

        assert_eq!(queries[0].max_runtime, Some(120));
    }

    #[test]
    fn test_build_queries_unrecognized_bucket_has_no_cap() {
        let queries = build_queries(
            &buckets(vec![28], vec![], vec![]),
            RequestedMedia::Movie,
            "en",
            TimeBucket::from_label("whenever"),
        );

        assert_eq!(queries[0].max_runtime, None);
    }

    #[test]
    fn test_build_queries_rating_floor_fixed() {
        let queries = build_queries(
            &buckets(vec![28], vec![16], vec![99]),
            RequestedMedia::Show,
            "fr",
            None,
        );

        assert!(queries.iter().all(|q| q.min_vote_average == 5.0));
        assert!(queries.iter().all(|q| q.language == "fr"));
    }

    #[test]
    fn test_build_queries_all_empty_tiers() {
        let queries = build_queries(
            &buckets(vec![], vec![], vec![]),
            RequestedMedia::Both,
            "en",
            None,
        );
        assert!(queries.is_empty());
    }

    #[test]
    fn test_build_queries_caps_at_six() {
        let queries = build_queries(
            &buckets(vec![28], vec![12], vec![35]),
            RequestedMedia::Both,
            "en",
            None,
        );
        assert_eq!(queries.len(), 6);
    }
}
