use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::product::Product;

/// Build the eligible explanation templates for a selected product. The
/// same-category template joins the pool only when the user has browsed
/// other products in that category.
pub fn explanation_candidates(product: &Product, browsed: &[&Product]) -> Vec<String> {
    let mut candidates = vec![
        format!("Recommended because you showed interest in {} products.", product.category),
        format!("This {} {} matches your preferences.", product.brand, product.name),
        format!("Popular choice in the {} category.", product.category),
        format!("Great value at ${:.2} for a {} product.", product.price, product.brand),
    ];

    if browsed.iter().any(|viewed| viewed.category == product.category) {
        candidates.push(format!("Similar to {} products you've viewed.", product.category));
    }

    candidates
}

pub fn choose_explanation(
    product: &Product,
    browsed: &[&Product],
    rng: &mut impl Rng,
) -> String {
    let candidates = explanation_candidates(product, browsed);
    candidates
        .choose(rng)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{choose_explanation, explanation_candidates};
    use crate::domain::product::Product;

    fn product(id: &str, category: &str) -> Product {
        Product {
            id: id.into(),
            name: format!("Product {id}"),
            category: category.to_string(),
            brand: "Acme".to_string(),
            price: 42.5,
        }
    }

    #[test]
    fn base_pool_has_four_templates() {
        let candidates = explanation_candidates(&product("p1", "audio"), &[]);
        assert_eq!(candidates.len(), 4);
        assert!(candidates[3].contains("$42.50"));
    }

    #[test]
    fn browsing_same_category_unlocks_similarity_template() {
        let viewed = product("p2", "audio");
        let candidates = explanation_candidates(&product("p1", "audio"), &[&viewed]);
        assert_eq!(candidates.len(), 5);
        assert!(candidates[4].contains("you've viewed"));
    }

    #[test]
    fn unrelated_browsing_keeps_base_pool() {
        let viewed = product("p2", "video");
        let candidates = explanation_candidates(&product("p1", "audio"), &[&viewed]);
        assert_eq!(candidates.len(), 4);
    }

    #[test]
    fn chosen_explanation_comes_from_the_pool() {
        let target = product("p1", "audio");
        let viewed = product("p2", "audio");
        let browsed = vec![&viewed];
        let pool = explanation_candidates(&target, &browsed);

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let explanation = choose_explanation(&target, &browsed, &mut rng);
            assert!(pool.contains(&explanation));
        }
    }
}
