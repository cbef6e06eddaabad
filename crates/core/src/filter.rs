//! Preference filtering
//!
//! Pure conjunctive filter over a product collection: category set,
//! brand set, and price bucket must all accept a product for it to
//! survive. Relative catalog order is preserved.

use crate::domain::preferences::UserPreferences;
use crate::domain::product::Product;

pub fn filter_by_preferences(preferences: &UserPreferences, products: &[Product]) -> Vec<Product> {
    products
        .iter()
        .filter(|product| matches_preferences(preferences, product))
        .cloned()
        .collect()
}

pub fn matches_preferences(preferences: &UserPreferences, product: &Product) -> bool {
    if !preferences.categories.is_empty() && !preferences.categories.contains(&product.category) {
        return false;
    }
    if !preferences.brands.is_empty() && !preferences.brands.contains(&product.brand) {
        return false;
    }
    preferences.price_range.contains(product.price)
}
