use crate::config::schema::Config;
use crate::providers::OpenAiConfig;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(test)]
use std::sync::Mutex;

#[cfg(test)]
static CONFIG_TEST_ENV_LOCK: Mutex<()> = Mutex::new(());

const ENV_API_KEY: &str = "INTERVIEW_API_KEY";
const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
const ENV_BASE_URL: &str = "INTERVIEW_BASE_URL";
const ENV_MODEL: &str = "INTERVIEW_MODEL";
const ENV_AI_TIMEOUT_MS: &str = "INTERVIEW_AI_TIMEOUT_MS";
const ENV_CLEANUP_INTERVAL_MS: &str = "INTERVIEW_CLEANUP_INTERVAL_MS";
const ENV_DEFAULT_TTL_MS: &str = "INTERVIEW_DEFAULT_TTL_MS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file contains invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),
}

/// Resolves the effective configuration.
///
/// Layers, lowest precedence first: defaults, config file, environment
/// variables, CLI flags.
pub fn load_config(cli_model: Option<String>, cli_config_path: Option<PathBuf>) -> Result<Config> {
    tracing::debug!("Loading configuration");

    let mut config = Config::default();

    // Layer 1: config file (~/.interview-engine/config.json)
    let config_file = cli_config_path.clone().or_else(get_default_config_path);

    if let Some(ref path) = config_file {
        if path.exists() {
            tracing::debug!(config_path = %path.display(), "Loading configuration from file");
            config = merge_config_from_file(config, path)?;
        } else {
            tracing::debug!(config_path = %path.display(), "Config file not found, using defaults");
        }
    }

    // Layer 2: environment variables
    tracing::debug!("Applying environment variable overrides");
    merge_env_variables(&mut config);

    // Layer 3: CLI flags
    if let Some(ref model) = cli_model {
        tracing::debug!(model = %model, "Applying CLI model override");
        apply_model_override(&mut config, model);
    }

    // The HTTP client must not give up before the generation deadline
    config.align_provider_timeout();

    let summary = config.get_safe_summary();
    tracing::debug!(
        api_key_configured = summary.api_key_configured,
        base_url = ?summary.base_url,
        model = ?summary.model,
        cleanup_interval_ms = summary.cleanup_interval_ms,
        request_timeout_ms = summary.request_timeout_ms,
        "Configuration loaded successfully"
    );

    Ok(config)
}

/// Model overrides only apply once a provider is configured
fn apply_model_override(config: &mut Config, model: &str) {
    match config.provider.as_mut() {
        Some(provider) => provider.default_model = model.to_string(),
        None => tracing::warn!(
            model = %model,
            "Model override ignored, no provider is configured"
        ),
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".interview-engine").join("config.json"))
}

fn merge_config_from_file(config: Config, path: &Path) -> Result<Config> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(config),
        Err(e) => return Err(e).context("Failed to read metadata for config file"),
    };

    let mode = metadata.permissions().mode() & 0o777;
    if mode != 0o600 {
        tracing::error!(
            "Config file {:?} has permissions {:o}, expected 0600 - skipping for security",
            path,
            mode
        );
        return Ok(config);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let file_config: Config = serde_json::from_str(&content).map_err(|e| {
        eprintln!("Error: Configuration file contains invalid JSON.");
        eprintln!("Suggestion: Run 'interview-engine onboard' to recreate the configuration file.");
        ConfigError::InvalidJson(e)
    })?;

    Ok(Config {
        store: file_config.store,
        generation: file_config.generation,
        provider: file_config.provider.or(config.provider),
    })
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Numeric env var; unparsable values are logged and ignored
fn env_millis(name: &str) -> Option<u64> {
    let raw = env_non_empty(name)?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "Ignoring non-numeric environment value");
            None
        }
    }
}

fn merge_env_variables(config: &mut Config) {
    // INTERVIEW_API_KEY wins over the generic OpenAI variable
    let api_key = env_non_empty(ENV_API_KEY).or_else(|| env_non_empty(ENV_OPENAI_API_KEY));
    if let Some(key) = api_key {
        match config.provider.as_mut() {
            Some(provider) => provider.api_key = key,
            None => config.provider = Some(OpenAiConfig::new(key)),
        }
    }

    if let Some(provider) = config.provider.as_mut() {
        if let Some(url) = env_non_empty(ENV_BASE_URL) {
            provider.base_url = url;
        }
        if let Some(model) = env_non_empty(ENV_MODEL) {
            provider.default_model = model;
        }
    }

    if let Some(millis) = env_millis(ENV_AI_TIMEOUT_MS) {
        config.generation.request_timeout_ms = millis;
    }
    if let Some(millis) = env_millis(ENV_CLEANUP_INTERVAL_MS) {
        config.store.cleanup_interval_ms = millis;
    }
    if let Some(millis) = env_millis(ENV_DEFAULT_TTL_MS) {
        config.store.default_ttl_ms = millis;
    }
}

pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let json = serde_json::to_string_pretty(config)?;

    let mut file = fs::File::create(path)
        .with_context(|| format!("Failed to create config file: {:?}", path))?;

    file.write_all(json.as_bytes())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    // Owner read/write only, the file holds the API key
    let mut permissions = file.metadata()?.permissions();
    permissions.set_mode(0o600);
    fs::set_permissions(path, permissions)
        .with_context(|| format!("Failed to set permissions on config file: {:?}", path))?;

    tracing::info!("Configuration saved to {:?}", path);
    Ok(())
}

pub fn get_config_path() -> Option<PathBuf> {
    get_default_config_path()
}
