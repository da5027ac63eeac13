use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::{Path, PathBuf};

const CONFIG_ENV_VAR: &str = "UPSCALER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.yml";
const ENV_PREFIX: &str = "UPSCALER";
const ENV_SEPARATOR: &str = "__";
const API_KEY_ENV_VAR: &str = "UPSCALE_API_KEY";

/// Pick the configuration file: explicit path, then `UPSCALER_CONFIG`, then `config.yml`
pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. Configuration file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load(explicit: Option<PathBuf>) -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = resolve_path(explicit);
    let mut config = load_from_sources(&config_path)?;

    load_secrets(&mut config);

    Ok(config)
}

/// Secrets are normally supplied through the environment
fn load_secrets(config: &mut Config) {
    if let Ok(api_key) = env::var(API_KEY_ENV_VAR) {
        config.api_key = api_key;
    }
}

/// Load configuration from a specific path and environment.
/// The format follows the file extension (yml/yaml, toml, json).
pub fn load_from_sources(config_path: &Path) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // UPSCALER__UPSCALE_URL -> upscale_url, UPSCALER__HTTP__REQUEST_TIMEOUT -> http.request_timeout
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
