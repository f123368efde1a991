use crate::models::{GenreFrequencyMap, Tiered};

/// Frequencies strictly above this land in the high tier
pub const HIGH_FREQUENCY_FLOOR: u32 = 30;
/// Frequencies strictly above this (and at most the high floor) are medium
pub const MEDIUM_FREQUENCY_FLOOR: u32 = 10;

/// Buckets genres into priority tiers by occurrence frequency.
///
/// Produces a partition of the map's key set: every genre lands in exactly
/// one tier and empty tiers propagate as empty. Genres are processed in
/// descending-frequency order (ties broken by id) so iteration is stable,
/// though membership depends on frequency alone.
pub fn classify(frequencies: &GenreFrequencyMap) -> Tiered<Vec<i64>> {
    let mut entries: Vec<(i64, u32)> = frequencies
        .iter()
        .map(|(&genre_id, &frequency)| (genre_id, frequency))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut tiers = Tiered::<Vec<i64>>::default();
    for (genre_id, frequency) in entries {
        if frequency > HIGH_FREQUENCY_FLOOR {
            tiers.high.push(genre_id);
        } else if frequency > MEDIUM_FREQUENCY_FLOOR {
            tiers.medium.push(genre_id);
        } else {
            tiers.low.push(genre_id);
        }
    }

    tiers
}
