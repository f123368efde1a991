use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{MediaCandidate, Tiered};

/// Upper bound on recommendations kept per tier
pub const MAX_PER_TIER: usize = 4;

/// Reduces raw per-tier candidate lists into the final recommendation sets.
///
/// Each tier is deduplicated by external id, shuffled with an unbiased
/// Fisher-Yates permutation and truncated to at most four entries. Tiers
/// with four or fewer unique candidates keep all of them, in random order.
pub fn reduce(candidates: Tiered<Vec<MediaCandidate>>) -> Tiered<Vec<MediaCandidate>> {
    let mut rng = rand::thread_rng();
    Tiered {
        high: reduce_tier(candidates.high, &mut rng),
        medium: reduce_tier(candidates.medium, &mut rng),
        low: reduce_tier(candidates.low, &mut rng),
    }
}

/// Drops repeated external ids, keeping the first occurrence of each
fn dedup_by_external_id(raw: Vec<MediaCandidate>) -> Vec<MediaCandidate> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter(|candidate| seen.insert(candidate.external_id))
        .collect()
}

fn reduce_tier<R: Rng>(raw: Vec<MediaCandidate>, rng: &mut R) -> Vec<MediaCandidate> {
    let mut unique = dedup_by_external_id(raw);
    unique.shuffle(rng);
    unique.truncate(MAX_PER_TIER);
    unique
}
