use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use picksy_core::config::LlmConfig;

use crate::llm::{ChatMessage, LlmClient};

/// OpenAI-compatible chat-completions client. Non-streaming: the engine
/// parses the full reply only after the call completes.
pub struct OpenAiClient {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
    max_retries: u32,
}

enum RequestError {
    Transport(reqwest::Error),
    Api { status: StatusCode, body: String },
    Decode(reqwest::Error),
    EmptyReply,
}

impl RequestError {
    fn is_retryable(&self) -> bool {
        match self {
            RequestError::Transport(_) => true,
            RequestError::Api { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            RequestError::Decode(_) | RequestError::EmptyReply => false,
        }
    }

    fn into_anyhow(self) -> anyhow::Error {
        match self {
            RequestError::Transport(err) => anyhow!("chat completion request failed: {err}"),
            RequestError::Api { status, body } => {
                anyhow!("chat completion API error ({status}): {body}")
            }
            RequestError::Decode(err) => {
                anyhow!("failed to decode chat completion response: {err}")
            }
            RequestError::EmptyReply => anyhow!("chat completion reply contained no text"),
        }
    }
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Transport(err) => write!(f, "transport failure: {err}"),
            RequestError::Api { status, .. } => write!(f, "API failure ({status})"),
            RequestError::Decode(err) => write!(f, "decode failure: {err}"),
            RequestError::EmptyReply => write!(f, "empty reply"),
        }
    }
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig, api_key: SecretString) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| anyhow!("failed to build HTTP client: {err}"))?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    /// Build a client from configuration, or `None` when no credential is
    /// configured. The engine treats the `None` case as a per-request
    /// remote failure rather than a construction error.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };
        if api_key.expose_secret().trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(Self::new(config, api_key)?))
    }

    fn chat_endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send_once(&self, body: &ChatRequest<'_>) -> Result<String, RequestError> {
        let response = self
            .client
            .post(self.chat_endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(RequestError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "could not read body".to_string());
            return Err(RequestError::Api { status, body });
        }

        let reply: ChatResponse = response.json().await.map_err(RequestError::Decode)?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(RequestError::EmptyReply)
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let wire_messages: Vec<WireMessage<'_>> =
            messages.iter().map(WireMessage::from).collect();
        let body = ChatRequest {
            model: &self.model,
            messages: wire_messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let mut attempt = 0;
        loop {
            match self.send_once(&body).await {
                Ok(text) => return Ok(text),
                Err(error) => {
                    if !error.is_retryable() || attempt >= self.max_retries {
                        return Err(error.into_anyhow());
                    }
                    attempt += 1;
                    debug!(
                        event_name = "llm.openai.retry",
                        attempt,
                        error = %error,
                        "retrying chat completion request"
                    );
                    tokio::time::sleep(Duration::from_millis(300 * u64::from(attempt))).await;
                }
            }
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        Self { role: &message.role, content: &message.content }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
