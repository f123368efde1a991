pub mod catalog;
pub mod fetcher;
pub mod frequency;
pub mod query;
pub mod quiz;
pub mod reducer;
pub mod tiers;
