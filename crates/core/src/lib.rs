pub mod config;
pub mod domain;
pub mod errors;
pub mod fallback;
pub mod filter;
pub mod simulate;

pub use config::{AppConfig, ConfigError, ConfigOverrides, EngineMode, LoadOptions, LogFormat};
pub use domain::history::BrowsingHistory;
pub use domain::preferences::{PriceRange, UserPreferences};
pub use domain::product::{Product, ProductId};
pub use domain::recommendation::{Recommendation, RecommendationResult, MAX_RECOMMENDATIONS};
pub use errors::EngineError;
pub use fallback::{fill_recommendations, FALLBACK_EXPLANATION};
pub use filter::{filter_by_preferences, matches_preferences};
pub use simulate::LocalSimulator;
