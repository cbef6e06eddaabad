//! Prompt construction
//!
//! Builds the single instruction payload sent to the remote model. The
//! output is deterministic for identical inputs: preference sets are
//! enumerated in their stored (sorted) order and the catalog excerpt is
//! capped rather than sampled.

use std::fmt::Write;

use picksy_core::domain::preferences::UserPreferences;
use picksy_core::domain::product::Product;

/// At most this many catalog products are enumerated, to bound payload
/// size against token limits.
pub const CATALOG_EXCERPT_LIMIT: usize = 50;

pub fn build_prompt(
    preferences: &UserPreferences,
    browsed: &[&Product],
    catalog: &[Product],
    target_count: usize,
) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are an expert eCommerce recommendation assistant.\n");
    let _ = writeln!(
        prompt,
        "Given the user's preferences and browsing history, recommend **exactly {target_count} \
         products** from the catalog."
    );
    prompt.push_str("Strictly follow these rules:\n");
    prompt.push_str(
        "- Only recommend products matching the user's selected categories, brands, and price range.\n",
    );
    prompt.push_str("- Include a brief explanation for each recommendation.\n");
    prompt.push_str(
        "- Return output as a JSON array with keys: product_id, explanation, score (1-10 confidence).\n",
    );
    prompt.push_str("- Ensure diversity in recommendations.\n\n");

    prompt.push_str("User Preferences:\n");
    let _ = writeln!(prompt, "- categories: {}", enumerate_set(&preferences.categories));
    let _ = writeln!(prompt, "- brands: {}", enumerate_set(&preferences.brands));
    let _ = writeln!(prompt, "- price_range: {}", preferences.price_range);

    if !browsed.is_empty() {
        prompt.push_str("\nBrowsing History:\n");
        for product in browsed {
            let _ = writeln!(prompt, "{}", product_line(product));
        }
    }

    prompt.push_str(
        "\nCatalog contains the following products (showing only names and categories for brevity):\n",
    );
    for product in catalog.iter().take(CATALOG_EXCERPT_LIMIT) {
        let _ = writeln!(prompt, "{}", product_line(product));
    }

    prompt.push_str("\nRespond ONLY with the JSON array, no extra text.");

    prompt
}

fn enumerate_set(values: &std::collections::BTreeSet<String>) -> String {
    if values.is_empty() {
        "any".to_string()
    } else {
        values.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

fn product_line(product: &Product) -> String {
    format!(
        "- {} (Category: {}, Price: ${:.2}, Brand: {})",
        product.name, product.category, product.price, product.brand
    )
}

#[cfg(test)]
mod tests {
    use picksy_core::domain::preferences::{PriceRange, UserPreferences};
    use picksy_core::domain::product::Product;

    use super::{build_prompt, CATALOG_EXCERPT_LIMIT};

    fn product(id: &str, category: &str) -> Product {
        Product {
            id: id.into(),
            name: format!("Product {id}"),
            category: category.to_string(),
            brand: "Acme".to_string(),
            price: 19.99,
        }
    }

    #[test]
    fn identical_inputs_produce_identical_prompts() {
        let preferences = UserPreferences::new()
            .with_categories(["audio", "video"])
            .with_price_range(PriceRange::Low);
        let catalog = vec![product("p1", "audio"), product("p2", "video")];
        let browsed = vec![&catalog[0]];

        let first = build_prompt(&preferences, &browsed, &catalog, 5);
        let second = build_prompt(&preferences, &browsed, &catalog, 5);
        assert_eq!(first, second);
    }

    #[test]
    fn sections_appear_in_contract_order() {
        let preferences = UserPreferences::new().with_brands(["Acme"]);
        let catalog = vec![product("p1", "audio")];
        let browsed = vec![&catalog[0]];

        let prompt = build_prompt(&preferences, &browsed, &catalog, 5);

        let rules = prompt.find("Strictly follow these rules:").expect("rules section");
        let prefs = prompt.find("User Preferences:").expect("preferences section");
        let history = prompt.find("Browsing History:").expect("history section");
        let excerpt = prompt.find("Catalog contains").expect("catalog section");
        let terminator = prompt.find("Respond ONLY with the JSON array").expect("terminator");

        assert!(rules < prefs && prefs < history && history < excerpt && excerpt < terminator);
        assert!(prompt.contains("**exactly 5 products**"));
        assert!(prompt.contains("product_id, explanation, score (1-10 confidence)"));
    }

    #[test]
    fn empty_history_omits_the_section() {
        let catalog = vec![product("p1", "audio")];
        let prompt = build_prompt(&UserPreferences::new(), &[], &catalog, 5);
        assert!(!prompt.contains("Browsing History:"));
        assert!(prompt.contains("- categories: any"));
    }

    #[test]
    fn catalog_excerpt_is_capped() {
        let catalog: Vec<Product> =
            (0..120).map(|n| product(&format!("p{n}"), "audio")).collect();
        let prompt = build_prompt(&UserPreferences::new(), &[], &catalog, 5);

        let listed = prompt.matches("(Category:").count();
        assert_eq!(listed, CATALOG_EXCERPT_LIMIT);
    }
}
