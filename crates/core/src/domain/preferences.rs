use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// User-selected filters for one recommendation request. An empty
/// category or brand set means "no constraint on that axis".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub brands: BTreeSet<String>,
    #[serde(default)]
    pub price_range: PriceRange,
}

impl UserPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_brands<I, S>(mut self, brands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.brands = brands.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_price_range(mut self, price_range: PriceRange) -> Self {
        self.price_range = price_range;
        self
    }
}

/// Closed price-bucket enumeration carried over the wire as
/// `0-50`, `50-100`, `100+`, or `all`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceRange {
    #[serde(rename = "0-50")]
    Low,
    #[serde(rename = "50-100")]
    Mid,
    #[serde(rename = "100+")]
    High,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl PriceRange {
    /// Inclusive numeric bounds for the bucket. Open-ended buckets use
    /// `f64::INFINITY` as the upper bound.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            PriceRange::Low => (0.0, 50.0),
            PriceRange::Mid => (50.0, 100.0),
            PriceRange::High => (100.0, f64::INFINITY),
            PriceRange::All => (0.0, f64::INFINITY),
        }
    }

    pub fn contains(&self, price: f64) -> bool {
        let (min, max) = self.bounds();
        price >= min && price <= max
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceRange::Low => "0-50",
            PriceRange::Mid => "50-100",
            PriceRange::High => "100+",
            PriceRange::All => "all",
        }
    }
}

impl std::str::FromStr for PriceRange {
    type Err = std::convert::Infallible;

    // Unrecognized buckets fall through to `All`, matching the filter
    // contract: unknown input means no price constraint.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value.trim() {
            "0-50" => PriceRange::Low,
            "50-100" => PriceRange::Mid,
            "100+" => PriceRange::High,
            _ => PriceRange::All,
        })
    }
}

impl std::fmt::Display for PriceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
