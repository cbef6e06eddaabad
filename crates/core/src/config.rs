use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::recommendation::MAX_RECOMMENDATIONS;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub mode: EngineMode,
    pub target_count: usize,
    pub local_confidence_min: u8,
    pub local_confidence_max: u8,
    pub fallback_confidence: u8,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Operating strategy for recommendation generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    Remote,
    #[default]
    Local,
}

impl EngineMode {
    pub fn label(&self) -> &'static str {
        match self {
            EngineMode::Remote => "remote model",
            EngineMode::Local => "local simulation",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub mode: Option<EngineMode>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                api_key: None,
                model: "gpt-3.5-turbo".to_string(),
                base_url: "https://api.openai.com/v1".to_string(),
                max_tokens: 500,
                temperature: 0.7,
                timeout_secs: 30,
                max_retries: 2,
            },
            engine: EngineConfig {
                mode: EngineMode::Local,
                target_count: MAX_RECOMMENDATIONS,
                local_confidence_min: 6,
                local_confidence_max: 10,
                fallback_confidence: 5,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for EngineMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(Self::Remote),
            "local" => Ok(Self::Local),
            other => Err(ConfigError::Validation(format!(
                "unsupported engine mode `{other}` (expected remote|local)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("picksy.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// True when the remote path has a credential to authenticate with.
    pub fn has_remote_credential(&self) -> bool {
        self.llm
            .api_key
            .as_ref()
            .map(|key| !key.expose_secret().trim().is_empty())
            .unwrap_or(false)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(api_key_value));
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(max_tokens) = llm.max_tokens {
                self.llm.max_tokens = max_tokens;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
        }

        if let Some(engine) = patch.engine {
            if let Some(mode) = engine.mode {
                self.engine.mode = mode;
            }
            if let Some(target_count) = engine.target_count {
                self.engine.target_count = target_count;
            }
            if let Some(min) = engine.local_confidence_min {
                self.engine.local_confidence_min = min;
            }
            if let Some(max) = engine.local_confidence_max {
                self.engine.local_confidence_max = max;
            }
            if let Some(fallback) = engine.fallback_confidence {
                self.engine.fallback_confidence = fallback;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PICKSY_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("PICKSY_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("PICKSY_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("PICKSY_LLM_MAX_TOKENS") {
            self.llm.max_tokens = parse_u32("PICKSY_LLM_MAX_TOKENS", &value)?;
        }
        if let Some(value) = read_env("PICKSY_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f32("PICKSY_LLM_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("PICKSY_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("PICKSY_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("PICKSY_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("PICKSY_LLM_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("PICKSY_ENGINE_MODE") {
            self.engine.mode = value.parse()?;
        }
        if let Some(value) = read_env("PICKSY_ENGINE_TARGET_COUNT") {
            self.engine.target_count = parse_usize("PICKSY_ENGINE_TARGET_COUNT", &value)?;
        }
        if let Some(value) = read_env("PICKSY_ENGINE_LOCAL_CONFIDENCE_MIN") {
            self.engine.local_confidence_min =
                parse_u8("PICKSY_ENGINE_LOCAL_CONFIDENCE_MIN", &value)?;
        }
        if let Some(value) = read_env("PICKSY_ENGINE_LOCAL_CONFIDENCE_MAX") {
            self.engine.local_confidence_max =
                parse_u8("PICKSY_ENGINE_LOCAL_CONFIDENCE_MAX", &value)?;
        }
        if let Some(value) = read_env("PICKSY_ENGINE_FALLBACK_CONFIDENCE") {
            self.engine.fallback_confidence =
                parse_u8("PICKSY_ENGINE_FALLBACK_CONFIDENCE", &value)?;
        }

        let log_level = read_env("PICKSY_LOGGING_LEVEL").or_else(|| read_env("PICKSY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PICKSY_LOGGING_FORMAT").or_else(|| read_env("PICKSY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(mode) = overrides.mode {
            self.engine.mode = mode;
        }
        if let Some(model) = overrides.model {
            self.llm.model = model;
        }
        if let Some(api_key) = overrides.api_key {
            self.llm.api_key = Some(secret_value(api_key));
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_engine(&self.engine)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("picksy.toml"), PathBuf::from("config/picksy.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    toml::from_str::<ConfigPatch>(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if !llm.base_url.starts_with("http://") && !llm.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    if llm.max_tokens == 0 {
        return Err(ConfigError::Validation(
            "llm.max_tokens must be greater than zero".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    // Missing api_key is deliberately NOT a validation error: the engine
    // treats an unconfigured remote credential as a per-request failure
    // and downgrades to local simulation.
    Ok(())
}

fn validate_engine(engine: &EngineConfig) -> Result<(), ConfigError> {
    if engine.target_count == 0 || engine.target_count > MAX_RECOMMENDATIONS {
        return Err(ConfigError::Validation(format!(
            "engine.target_count must be in range 1..={MAX_RECOMMENDATIONS}"
        )));
    }

    let min = engine.local_confidence_min;
    let max = engine.local_confidence_max;
    if min < 1 || max > 10 || min > max {
        return Err(ConfigError::Validation(
            "engine.local_confidence_min/max must satisfy 1 <= min <= max <= 10".to_string(),
        ));
    }

    if !(1..=10).contains(&engine.fallback_confidence) {
        return Err(ConfigError::Validation(
            "engine.fallback_confidence must be in range 1..=10".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u8(key: &str, value: &str) -> Result<u8, ConfigError> {
    value.parse::<u8>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    engine: Option<EnginePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    mode: Option<EngineMode>,
    target_count: Option<usize>,
    local_confidence_min: Option<u8>,
    local_confidence_max: Option<u8>,
    fallback_confidence: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, EngineMode, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_validate_and_stay_local() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.engine.mode == EngineMode::Local, "default mode should be local")?;
        ensure(config.llm.model == "gpt-3.5-turbo", "default model should match")?;
        ensure(config.llm.max_tokens == 500, "default max_tokens should match")?;
        ensure(!config.has_remote_credential(), "no credential should be configured")?;
        Ok(())
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PICKSY_LLM_MODEL", "model-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("picksy.toml");
            fs::write(
                &path,
                r#"
[llm]
model = "model-from-file"
max_tokens = 256

[engine]
mode = "remote"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.llm.model == "model-from-env", "env model should win over file")?;
            ensure(config.llm.max_tokens == 256, "file max_tokens should win over default")?;
            ensure(config.engine.mode == EngineMode::Remote, "file mode should apply")?;
            ensure(config.logging.level == "debug", "override log level should win")?;
            Ok(())
        })();

        clear_vars(&["PICKSY_LLM_MODEL"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PICKSY_LLM_TEMPERATURE", "9.5");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("llm.temperature")
            );
            ensure(has_message, "validation failure should mention llm.temperature")
        })();

        clear_vars(&["PICKSY_LLM_TEMPERATURE"]);
        result
    }

    #[test]
    fn confidence_bounds_are_validated() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PICKSY_ENGINE_LOCAL_CONFIDENCE_MIN", "8");
        env::set_var("PICKSY_ENGINE_LOCAL_CONFIDENCE_MAX", "4");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected confidence validation failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::Validation(ref message)
                        if message.contains("local_confidence")
                ),
                "validation failure should mention local_confidence",
            )
        })();

        clear_vars(&["PICKSY_ENGINE_LOCAL_CONFIDENCE_MIN", "PICKSY_ENGINE_LOCAL_CONFIDENCE_MAX"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PICKSY_LLM_API_KEY", "sk-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("sk-secret-value"), "debug output should not contain key")?;
            ensure(config.has_remote_credential(), "credential should be detected")?;
            ensure(
                config
                    .llm
                    .api_key
                    .as_ref()
                    .map(|key| key.expose_secret() == "sk-secret-value")
                    .unwrap_or(false),
                "exposed secret should round-trip",
            )?;
            Ok(())
        })();

        clear_vars(&["PICKSY_LLM_API_KEY"]);
        result
    }

    #[test]
    fn invalid_env_number_is_reported_with_key_and_value() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PICKSY_LLM_MAX_TOKENS", "lots");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected env parse failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::InvalidEnvOverride { ref key, ref value }
                        if key == "PICKSY_LLM_MAX_TOKENS" && value == "lots"
                ),
                "error should carry the offending key and value",
            )
        })();

        clear_vars(&["PICKSY_LLM_MAX_TOKENS"]);
        result
    }

    #[test]
    fn log_format_env_alias_is_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PICKSY_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json log format should be set from alias env var",
            )
        })();

        clear_vars(&["PICKSY_LOG_FORMAT"]);
        result
    }
}
