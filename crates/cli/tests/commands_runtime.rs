use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use picksy_cli::commands::{doctor, recommend};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn recommend_returns_full_result_for_demo_catalog() {
    with_env(&[("PICKSY_ENGINE_MODE", "local")], || {
        let dir = TempDir::new().expect("temp dir");
        let catalog_path = write_catalog(&dir, 8);

        let result = recommend::run(recommend_args(catalog_path, &["--seed"]));
        assert_eq!(result.exit_code, 0, "expected successful recommend run: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["count"], 5);
        assert_eq!(payload["recommendations"].as_array().map(Vec::len), Some(5));
        assert!(payload.get("error").is_none());
    });
}

#[test]
fn recommend_is_reproducible_with_a_seed() {
    with_env(&[("PICKSY_ENGINE_MODE", "local")], || {
        let dir = TempDir::new().expect("temp dir");
        let catalog_path = write_catalog(&dir, 8);

        let first = recommend::run(recommend_args(catalog_path.clone(), &["--seed"]));
        let second = recommend::run(recommend_args(catalog_path, &["--seed"]));

        assert_eq!(first.exit_code, 0);
        assert_eq!(first.output, second.output);
    });
}

#[test]
fn recommend_empty_catalog_reports_error_shape() {
    with_env(&[("PICKSY_ENGINE_MODE", "local")], || {
        let dir = TempDir::new().expect("temp dir");
        let catalog_path = write_catalog(&dir, 0);

        let result = recommend::run(recommend_args(catalog_path, &[]));
        assert_eq!(result.exit_code, 1, "total failure should exit non-zero");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["recommendations"].as_array().map(Vec::len), Some(0));
        assert!(payload["error"].as_str().unwrap_or_default().contains("no recommendable"));
    });
}

#[test]
fn recommend_missing_catalog_file_fails_with_catalog_class() {
    with_env(&[], || {
        let result = recommend::run(recommend_args(PathBuf::from("/nonexistent/catalog.json"), &[]));
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "recommend");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "catalog");
    });
}

#[test]
fn recommend_rejects_unknown_mode() {
    with_env(&[], || {
        let mut args = recommend_args(PathBuf::from("unused.json"), &[]);
        args.mode = Some("psychic".to_string());

        let result = recommend::run(args);
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "invalid_mode");
    });
}

#[test]
fn doctor_passes_in_default_local_setup() {
    with_env(&[], || {
        let output = doctor::run(true);
        let payload = parse_payload(&output);

        assert_eq!(payload["overall_status"], "pass");
        let checks = payload["checks"].as_array().expect("checks array");
        assert_eq!(checks.len(), 3);
        assert!(checks.iter().all(|check| check["status"] == "pass"));
    });
}

#[test]
fn doctor_flags_remote_mode_without_credential() {
    with_env(&[("PICKSY_ENGINE_MODE", "remote")], || {
        let output = doctor::run(true);
        let payload = parse_payload(&output);

        assert_eq!(payload["overall_status"], "fail");
        let credential_check = payload["checks"]
            .as_array()
            .expect("checks array")
            .iter()
            .find(|check| check["name"] == "remote_credential")
            .expect("credential check")
            .clone();
        assert_eq!(credential_check["status"], "fail");
    });
}

#[test]
fn doctor_recovers_when_credential_is_present() {
    with_env(
        &[("PICKSY_ENGINE_MODE", "remote"), ("PICKSY_LLM_API_KEY", "sk-test")],
        || {
            let output = doctor::run(true);
            let payload = parse_payload(&output);
            assert_eq!(payload["overall_status"], "pass");
        },
    );
}

fn recommend_args(catalog: PathBuf, flags: &[&str]) -> recommend::RecommendArgs {
    recommend::RecommendArgs {
        catalog,
        categories: Vec::new(),
        brands: Vec::new(),
        price_range: "all".to_string(),
        browsed: Vec::new(),
        mode: None,
        seed: flags.contains(&"--seed").then_some(42),
    }
}

fn write_catalog(dir: &TempDir, size: usize) -> PathBuf {
    let products: Vec<Value> = (0..size)
        .map(|n| {
            serde_json::json!({
                "id": format!("p{n}"),
                "name": format!("Product {n}"),
                "category": if n % 2 == 0 { "audio" } else { "video" },
                "brand": "Acme",
                "price": 10.0 + n as f64,
            })
        })
        .collect();

    let path = dir.path().join("catalog.json");
    fs::write(&path, serde_json::to_string(&products).expect("serialize catalog"))
        .expect("write catalog");
    path
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "PICKSY_LLM_API_KEY",
        "PICKSY_LLM_MODEL",
        "PICKSY_LLM_BASE_URL",
        "PICKSY_LLM_MAX_TOKENS",
        "PICKSY_LLM_TEMPERATURE",
        "PICKSY_LLM_TIMEOUT_SECS",
        "PICKSY_LLM_MAX_RETRIES",
        "PICKSY_ENGINE_MODE",
        "PICKSY_ENGINE_TARGET_COUNT",
        "PICKSY_ENGINE_LOCAL_CONFIDENCE_MIN",
        "PICKSY_ENGINE_LOCAL_CONFIDENCE_MAX",
        "PICKSY_ENGINE_FALLBACK_CONFIDENCE",
        "PICKSY_LOGGING_LEVEL",
        "PICKSY_LOGGING_FORMAT",
        "PICKSY_LOG_LEVEL",
        "PICKSY_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, previous) in previous_values {
        match previous {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
}
