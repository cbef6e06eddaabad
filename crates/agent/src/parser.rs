//! Response parsing
//!
//! Extracts a recommendation list from a free-text model reply. The
//! reply is untrusted: surrounding prose is tolerated, malformed JSON
//! yields an empty list (the caller fallback-fills), and entries whose
//! `product_id` has no catalog match are dropped without failing the
//! batch.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use picksy_core::domain::product::Product;
use picksy_core::domain::recommendation::Recommendation;

const DEFAULT_SCORE: i64 = 5;

#[derive(Debug, Deserialize)]
struct RawEntry {
    product_id: Option<Value>,
    #[serde(default)]
    explanation: String,
    #[serde(default = "default_score")]
    score: i64,
}

fn default_score() -> i64 {
    DEFAULT_SCORE
}

impl RawEntry {
    // Models echo ids back as strings or bare numbers; accept both.
    fn product_id_text(&self) -> Option<String> {
        match self.product_id.as_ref()? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }

    fn clamped_score(&self) -> u8 {
        self.score.clamp(1, 10) as u8
    }
}

/// Parse a raw model reply against the catalog. Returns an empty list on
/// any structural failure; order follows the decoded array.
pub fn parse_recommendations(raw: &str, catalog: &[Product]) -> Vec<Recommendation> {
    let Some(start) = raw.find('[') else {
        return Vec::new();
    };
    let Some(end) = raw.rfind(']') else {
        return Vec::new();
    };
    if end < start {
        return Vec::new();
    }

    let entries: Vec<RawEntry> = match serde_json::from_str(&raw[start..=end]) {
        Ok(entries) => entries,
        Err(error) => {
            debug!(
                event_name = "parser.decode_failed",
                error = %error,
                "model reply was not a decodable JSON array"
            );
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|entry| {
            let id = entry.product_id_text()?;
            let product = catalog.iter().find(|candidate| candidate.id.0 == id)?.clone();
            Some(Recommendation {
                product,
                confidence_score: entry.clamped_score(),
                explanation: entry.explanation,
            })
        })
        .collect()
}
