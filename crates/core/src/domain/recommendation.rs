use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::product::Product;

/// Hard cap on the size of any recommendation list.
pub const MAX_RECOMMENDATIONS: usize = 5;

/// One recommended product with a human-readable justification and a
/// confidence score in 1..=10. Lives for a single request/response cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub product: Product,
    pub explanation: String,
    pub confidence_score: u8,
}

/// The fixed-shape value returned to the caller: up to
/// [`MAX_RECOMMENDATIONS`] entries plus a count, or an empty list with an
/// error description on total failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecommendationResult {
    /// Build a success result, enforcing the size cap and the
    /// no-duplicate-product invariant.
    pub fn from_recommendations(mut recommendations: Vec<Recommendation>) -> Self {
        let mut seen = BTreeSet::new();
        recommendations.retain(|rec| seen.insert(rec.product.id.clone()));
        recommendations.truncate(MAX_RECOMMENDATIONS);
        let count = recommendations.len();
        Self { recommendations, count, error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { recommendations: Vec::new(), count: 0, error: Some(error.into()) }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}
