//! Recommendation Agent - LLM-backed generation and orchestration
//!
//! This crate provides the model-facing half of picksy - everything that
//! turns a catalog, a preference set, and a browsing history into a
//! fixed-shape recommendation list:
//! - Prompt construction (`prompt`) - deterministic instruction payloads
//! - Response parsing (`parser`) - tolerant extraction of model JSON
//! - Remote transport (`llm`, `openai`) - pluggable chat-completion clients
//! - Orchestration (`engine`) - mode dispatch, downgrade, fallback filling
//!
//! # Architecture
//!
//! The engine follows a constrained pipeline per request:
//! 1. **Prompt** (`prompt`) - preferences + history + catalog excerpt -> text
//! 2. **Invoke** (`llm`) - single suspension point, failures never escape
//! 3. **Parse** (`parser`) - unmatched or malformed entries are dropped
//! 4. **Fill** (`picksy_core::fallback`) - top up to the target count
//!
//! # Safety Principle
//!
//! The LLM only proposes. It never controls the result shape: size caps,
//! duplicate rejection, and catalog membership are enforced locally, and
//! any remote failure silently downgrades to local simulation.

pub mod engine;
pub mod llm;
pub mod openai;
pub mod parser;
pub mod prompt;

pub use engine::RecommendationEngine;
pub use llm::{ChatMessage, LlmClient, SYSTEM_INSTRUCTION};
pub use openai::OpenAiClient;
