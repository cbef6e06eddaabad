use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use picksy_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    let api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line("llm.api_key", api_key, source("llm.api_key", "PICKSY_LLM_API_KEY")));
    lines.push(render_line("llm.model", &config.llm.model, source("llm.model", "PICKSY_LLM_MODEL")));
    lines.push(render_line(
        "llm.base_url",
        &config.llm.base_url,
        source("llm.base_url", "PICKSY_LLM_BASE_URL"),
    ));
    lines.push(render_line(
        "llm.max_tokens",
        &config.llm.max_tokens.to_string(),
        source("llm.max_tokens", "PICKSY_LLM_MAX_TOKENS"),
    ));
    lines.push(render_line(
        "llm.temperature",
        &config.llm.temperature.to_string(),
        source("llm.temperature", "PICKSY_LLM_TEMPERATURE"),
    ));
    lines.push(render_line(
        "llm.timeout_secs",
        &config.llm.timeout_secs.to_string(),
        source("llm.timeout_secs", "PICKSY_LLM_TIMEOUT_SECS"),
    ));
    lines.push(render_line(
        "llm.max_retries",
        &config.llm.max_retries.to_string(),
        source("llm.max_retries", "PICKSY_LLM_MAX_RETRIES"),
    ));

    lines.push(render_line(
        "engine.mode",
        config.engine.mode.label(),
        source("engine.mode", "PICKSY_ENGINE_MODE"),
    ));
    lines.push(render_line(
        "engine.target_count",
        &config.engine.target_count.to_string(),
        source("engine.target_count", "PICKSY_ENGINE_TARGET_COUNT"),
    ));
    lines.push(render_line(
        "engine.local_confidence_min",
        &config.engine.local_confidence_min.to_string(),
        source("engine.local_confidence_min", "PICKSY_ENGINE_LOCAL_CONFIDENCE_MIN"),
    ));
    lines.push(render_line(
        "engine.local_confidence_max",
        &config.engine.local_confidence_max.to_string(),
        source("engine.local_confidence_max", "PICKSY_ENGINE_LOCAL_CONFIDENCE_MAX"),
    ));
    lines.push(render_line(
        "engine.fallback_confidence",
        &config.engine.fallback_confidence.to_string(),
        source("engine.fallback_confidence", "PICKSY_ENGINE_FALLBACK_CONFIDENCE"),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "PICKSY_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", "PICKSY_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("picksy.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/picksy.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
