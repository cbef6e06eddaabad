//! Local simulation
//!
//! Produces a complete recommendation set without any remote call:
//! preference filtering, randomized selection, and templated
//! explanations with deliberately optimistic confidence scores.

mod templates;

pub use templates::{choose_explanation, explanation_candidates};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::domain::history::BrowsingHistory;
use crate::domain::preferences::UserPreferences;
use crate::domain::product::Product;
use crate::domain::recommendation::{Recommendation, MAX_RECOMMENDATIONS};
use crate::errors::EngineError;
use crate::filter::filter_by_preferences;

#[derive(Clone, Copy, Debug)]
pub struct LocalSimulator {
    target_count: usize,
    confidence_min: u8,
    confidence_max: u8,
}

impl Default for LocalSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSimulator {
    /// Default simulator: up to [`MAX_RECOMMENDATIONS`] picks with the
    /// optimistic confidence range 6..=10.
    pub fn new() -> Self {
        Self { target_count: MAX_RECOMMENDATIONS, confidence_min: 6, confidence_max: 10 }
    }

    pub fn with_target_count(mut self, target_count: usize) -> Self {
        self.target_count = target_count.clamp(1, MAX_RECOMMENDATIONS);
        self
    }

    pub fn with_confidence_range(mut self, min: u8, max: u8) -> Self {
        self.confidence_min = min.min(max);
        self.confidence_max = max.max(min);
        self
    }

    /// Select `min(target, candidates)` unbrowsed products at random.
    ///
    /// When preference filtering leaves fewer than the target number of
    /// unbrowsed candidates, the preference constraint is dropped and the
    /// pool widens to every unbrowsed catalog product. This relaxation is
    /// intentional: a thin filter match should still yield a full-size
    /// result. Only an empty pool is an error.
    pub fn simulate(
        &self,
        preferences: &UserPreferences,
        history: &BrowsingHistory,
        catalog: &[Product],
        rng: &mut impl Rng,
    ) -> Result<Vec<Recommendation>, EngineError> {
        let mut candidates: Vec<Product> = filter_by_preferences(preferences, catalog)
            .into_iter()
            .filter(|product| !history.contains(&product.id))
            .collect();

        if candidates.len() < self.target_count {
            debug!(
                event_name = "simulate.pool_widened",
                matched = candidates.len(),
                target = self.target_count,
                "preference filter left too few candidates; widening to all unbrowsed products"
            );
            candidates = catalog
                .iter()
                .filter(|product| !history.contains(&product.id))
                .cloned()
                .collect();
        }

        if candidates.is_empty() {
            return Err(EngineError::NoCandidates { catalog_size: catalog.len() });
        }

        let browsed = history.browsed_products(catalog);
        let amount = self.target_count.min(candidates.len());

        let selected: Vec<Product> =
            candidates.choose_multiple(rng, amount).cloned().collect();

        Ok(selected
            .into_iter()
            .map(|product| {
                let explanation = choose_explanation(&product, &browsed, rng);
                let confidence_score =
                    rng.gen_range(self.confidence_min..=self.confidence_max);
                Recommendation { product, explanation, confidence_score }
            })
            .collect())
    }
}
