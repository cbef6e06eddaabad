use std::fs;
use std::path::PathBuf;

use clap::Args;

use picksy_agent::engine::RecommendationEngine;
use picksy_core::config::{AppConfig, ConfigOverrides, EngineMode, LoadOptions, LogFormat};
use picksy_core::domain::history::BrowsingHistory;
use picksy_core::domain::preferences::{PriceRange, UserPreferences};
use picksy_core::domain::product::{Product, ProductId};

use super::CommandResult;

#[derive(Debug, Args)]
pub struct RecommendArgs {
    #[arg(long, help = "Path to a JSON catalog file (array of products)")]
    pub catalog: PathBuf,
    #[arg(long, value_delimiter = ',', help = "Category filter (comma separated)")]
    pub categories: Vec<String>,
    #[arg(long, value_delimiter = ',', help = "Brand filter (comma separated)")]
    pub brands: Vec<String>,
    #[arg(long, default_value = "all", help = "Price bucket: 0-50, 50-100, 100+ or all")]
    pub price_range: String,
    #[arg(long, value_delimiter = ',', help = "Product ids the user already viewed")]
    pub browsed: Vec<String>,
    #[arg(long, help = "Override the configured engine mode (remote|local)")]
    pub mode: Option<String>,
    #[arg(long, help = "Pin the RNG seed for reproducible output")]
    pub seed: Option<u64>,
}

pub fn run(args: RecommendArgs) -> CommandResult {
    let mode_override = match args.mode.as_deref().map(str::parse::<EngineMode>).transpose() {
        Ok(mode) => mode,
        Err(error) => {
            return CommandResult::failure("recommend", "invalid_mode", error.to_string(), 2)
        }
    };

    let config = match AppConfig::load(LoadOptions {
        overrides: ConfigOverrides { mode: mode_override, ..ConfigOverrides::default() },
        ..LoadOptions::default()
    }) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("recommend", "config_validation", error.to_string(), 2)
        }
    };

    init_logging(&config);

    let catalog = match load_catalog(&args.catalog) {
        Ok(catalog) => catalog,
        Err(error) => return CommandResult::failure("recommend", "catalog", error, 3),
    };

    let preferences = UserPreferences::new()
        .with_categories(args.categories)
        .with_brands(args.brands)
        .with_price_range(args.price_range.parse::<PriceRange>().unwrap_or(PriceRange::All));
    let history: BrowsingHistory = args.browsed.into_iter().map(ProductId).collect();

    let engine = match RecommendationEngine::from_config(&config) {
        Ok(engine) => engine,
        Err(error) => return CommandResult::failure("recommend", "engine", error.to_string(), 4),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("recommend", "runtime", error.to_string(), 4),
    };

    let result = runtime.block_on(async {
        match args.seed {
            Some(seed) => engine.generate_seeded(&preferences, &history, &catalog, seed).await,
            None => engine.generate(&preferences, &history, &catalog).await,
        }
    });

    let exit_code = u8::from(result.is_failure());
    let output = serde_json::to_string_pretty(&result).unwrap_or_else(|error| {
        format!("{{\"recommendations\":[],\"error\":\"serialization failed: {error}\"}}")
    });

    CommandResult { exit_code, output }
}

fn load_catalog(path: &PathBuf) -> Result<Vec<Product>, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("could not read catalog file `{}`: {error}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|error| format!("could not parse catalog file `{}`: {error}", path.display()))
}

// Logs go to stderr so the JSON result on stdout stays machine-readable.
fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
