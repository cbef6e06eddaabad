//! Fallback filling
//!
//! Tops up an under-sized recommendation list with preference-filtered,
//! non-duplicate products chosen at random. Used when the remote model
//! returns fewer than the target number of usable entries.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::preferences::UserPreferences;
use crate::domain::product::Product;
use crate::domain::recommendation::Recommendation;
use crate::filter::filter_by_preferences;

/// Explanation attached to every filled entry.
pub const FALLBACK_EXPLANATION: &str = "Additional recommendation based on your preferences.";

/// Fill `existing` up to `target` entries. Candidates are drawn from the
/// preference-filtered catalog, excluding products already recommended,
/// in a uniform random order. Returns only the new entries; returns
/// fewer than requested when the catalog runs out, never errors.
pub fn fill_recommendations(
    preferences: &UserPreferences,
    existing: &[Recommendation],
    catalog: &[Product],
    target: usize,
    confidence_score: u8,
    rng: &mut impl Rng,
) -> Vec<Recommendation> {
    let needed = target.saturating_sub(existing.len());
    if needed == 0 {
        return Vec::new();
    }

    let existing_ids: BTreeSet<_> = existing.iter().map(|rec| rec.product.id.clone()).collect();

    let mut candidates: Vec<Product> = filter_by_preferences(preferences, catalog)
        .into_iter()
        .filter(|product| !existing_ids.contains(&product.id))
        .collect();
    candidates.shuffle(rng);

    candidates
        .into_iter()
        .take(needed)
        .map(|product| Recommendation {
            product,
            explanation: FALLBACK_EXPLANATION.to_string(),
            confidence_score,
        })
        .collect()
}
