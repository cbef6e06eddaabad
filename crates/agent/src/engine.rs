//! Recommendation orchestration
//!
//! Dispatches a request to the remote-model or local-simulation strategy
//! and guarantees a fixed-shape result. No failure escapes `generate`:
//! remote-path errors downgrade to local simulation for that single
//! request, and only a failed local simulation surfaces as an
//! empty-result error description.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use picksy_core::config::{AppConfig, EngineConfig, EngineMode};
use picksy_core::domain::history::BrowsingHistory;
use picksy_core::domain::preferences::UserPreferences;
use picksy_core::domain::product::Product;
use picksy_core::domain::recommendation::RecommendationResult;
use picksy_core::fallback::fill_recommendations;
use picksy_core::simulate::LocalSimulator;

use crate::llm::{ChatMessage, LlmClient, SYSTEM_INSTRUCTION};
use crate::openai::OpenAiClient;
use crate::parser::parse_recommendations;
use crate::prompt::build_prompt;

pub struct RecommendationEngine {
    mode: EngineMode,
    config: EngineConfig,
    llm: Option<Arc<dyn LlmClient>>,
}

impl RecommendationEngine {
    pub fn new(config: EngineConfig, llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self { mode: config.mode, config, llm }
    }

    /// Wire up the engine from application configuration, building the
    /// OpenAI client when a credential is present.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let llm = OpenAiClient::from_config(&config.llm)?
            .map(|client| Arc::new(client) as Arc<dyn LlmClient>);

        if config.engine.mode == EngineMode::Remote && llm.is_none() {
            warn!(
                event_name = "engine.remote_without_credential",
                "remote mode configured without an API key; requests will fall back to local simulation"
            );
        }

        Ok(Self::new(config.engine.clone(), llm))
    }

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    /// Switch the operating mode. Entering remote mode without a
    /// configured credential is allowed but logged, since every request
    /// would immediately downgrade.
    pub fn set_mode(&mut self, mode: EngineMode) {
        if mode == EngineMode::Remote && self.llm.is_none() {
            warn!(
                event_name = "engine.remote_without_credential",
                "switching to remote mode without an API key; requests will fall back to local simulation"
            );
        }
        self.mode = mode;
        info!(event_name = "engine.mode_switched", mode = mode.label(), "operating mode changed");
    }

    pub async fn generate(
        &self,
        preferences: &UserPreferences,
        history: &BrowsingHistory,
        catalog: &[Product],
    ) -> RecommendationResult {
        self.generate_inner(preferences, history, catalog, None).await
    }

    /// Same pipeline with a pinned RNG seed, for reproducible output.
    pub async fn generate_seeded(
        &self,
        preferences: &UserPreferences,
        history: &BrowsingHistory,
        catalog: &[Product],
        seed: u64,
    ) -> RecommendationResult {
        self.generate_inner(preferences, history, catalog, Some(seed)).await
    }

    async fn generate_inner(
        &self,
        preferences: &UserPreferences,
        history: &BrowsingHistory,
        catalog: &[Product],
        seed: Option<u64>,
    ) -> RecommendationResult {
        let request_id = Uuid::new_v4().to_string();
        info!(
            event_name = "engine.generate.start",
            request_id = %request_id,
            mode = self.mode.label(),
            catalog_size = catalog.len(),
            browsed = history.len(),
            "generating recommendations"
        );

        // The remote call is the single suspension point; the RNG is
        // created only after it resolves so the future stays Send.
        let remote_reply = match self.mode {
            EngineMode::Remote => {
                match self.request_remote_reply(preferences, history, catalog).await {
                    Ok(reply) => Some(reply),
                    Err(error) => {
                        warn!(
                            event_name = "engine.remote.downgrade",
                            request_id = %request_id,
                            error = %error,
                            "remote path failed; falling back to local simulation for this request"
                        );
                        None
                    }
                }
            }
            EngineMode::Local => None,
        };

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        if let Some(reply) = remote_reply {
            return self.finish_remote(&request_id, &reply, preferences, catalog, &mut rng);
        }

        self.local_result(&request_id, preferences, history, catalog, &mut rng)
    }

    async fn request_remote_reply(
        &self,
        preferences: &UserPreferences,
        history: &BrowsingHistory,
        catalog: &[Product],
    ) -> Result<String> {
        let client = self
            .llm
            .as_ref()
            .ok_or_else(|| anyhow!("remote mode selected but no LLM client is configured"))?;

        let browsed = history.browsed_products(catalog);
        let prompt = build_prompt(preferences, &browsed, catalog, self.config.target_count);

        client
            .complete(&[ChatMessage::system(SYSTEM_INSTRUCTION), ChatMessage::user(prompt)])
            .await
    }

    // An unusable reply is not a remote failure: an empty parse simply
    // means everything comes from the fallback filler.
    fn finish_remote(
        &self,
        request_id: &str,
        reply: &str,
        preferences: &UserPreferences,
        catalog: &[Product],
        rng: &mut impl Rng,
    ) -> RecommendationResult {
        let mut recommendations = parse_recommendations(reply, catalog);

        // Dedupe before computing how many entries the filler owes, or a
        // model that repeats itself would leave the result under-sized.
        let mut seen = BTreeSet::new();
        recommendations.retain(|rec| seen.insert(rec.product.id.clone()));
        let parsed_count = recommendations.len();

        if parsed_count < self.config.target_count {
            let filled = fill_recommendations(
                preferences,
                &recommendations,
                catalog,
                self.config.target_count,
                self.config.fallback_confidence,
                rng,
            );
            debug!(
                event_name = "engine.fallback_fill",
                request_id = %request_id,
                parsed = parsed_count,
                filled = filled.len(),
                "topping up under-sized model reply"
            );
            recommendations.extend(filled);
        }

        recommendations.truncate(self.config.target_count);
        let result = RecommendationResult::from_recommendations(recommendations);
        info!(
            event_name = "engine.generate.done",
            request_id = %request_id,
            strategy = EngineMode::Remote.label(),
            count = result.count,
            "recommendations generated"
        );
        result
    }

    fn local_result(
        &self,
        request_id: &str,
        preferences: &UserPreferences,
        history: &BrowsingHistory,
        catalog: &[Product],
        rng: &mut impl Rng,
    ) -> RecommendationResult {
        let simulator = LocalSimulator::new()
            .with_target_count(self.config.target_count)
            .with_confidence_range(
                self.config.local_confidence_min,
                self.config.local_confidence_max,
            );

        match simulator.simulate(preferences, history, catalog, rng) {
            Ok(recommendations) => {
                let result = RecommendationResult::from_recommendations(recommendations);
                info!(
                    event_name = "engine.generate.done",
                    request_id = %request_id,
                    strategy = EngineMode::Local.label(),
                    count = result.count,
                    "recommendations generated"
                );
                result
            }
            Err(err) => {
                error!(
                    event_name = "engine.generate.total_failure",
                    request_id = %request_id,
                    error = %err,
                    "local simulation failed; returning empty result"
                );
                RecommendationResult::failure(err.to_string())
            }
        }
    }
}
