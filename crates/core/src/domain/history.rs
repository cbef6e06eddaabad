use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::product::{Product, ProductId};

/// Product identifiers the user has already viewed. Used to enrich
/// prompts and to keep already-seen products out of recommendations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowsingHistory(BTreeSet<ProductId>);

impl BrowsingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &ProductId) -> bool {
        self.0.contains(id)
    }

    pub fn insert(&mut self, id: ProductId) {
        self.0.insert(id);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Resolve the browsed ids against a catalog, preserving catalog order.
    pub fn browsed_products<'a>(&self, catalog: &'a [Product]) -> Vec<&'a Product> {
        catalog.iter().filter(|product| self.contains(&product.id)).collect()
    }
}

impl FromIterator<ProductId> for BrowsingHistory {
    fn from_iter<I: IntoIterator<Item = ProductId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
