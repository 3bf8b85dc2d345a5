use crate::config::{Config, save_config};
use crate::providers::OpenAiConfig;
use anyhow::{Context, Result};
use inquire::validator::Validation;
use inquire::{Confirm, Text};
use std::path::{Path, PathBuf};

pub fn run_onboarding(verbose: bool, config_path: Option<PathBuf>, skip_prompts: bool) -> Result<()> {
    let config_path = determine_config_path(config_path)?;

    if verbose {
        tracing::debug!(path = %config_path.display(), "Starting onboarding");
    }

    if config_path.exists() {
        let should_reconfigure = handle_reconfiguration(&config_path, skip_prompts, verbose)?;
        if !should_reconfigure {
            return Ok(());
        }
    }

    let config = collect_user_configuration(skip_prompts, verbose)?;

    let Some(config) = config else {
        println!("Configuration cancelled. No changes were made.");
        return Ok(());
    };

    save_config(&config, &config_path).context("Failed to save configuration")?;

    display_completion_summary(&config, &config_path, verbose);

    Ok(())
}

fn determine_config_path(custom_path: Option<PathBuf>) -> Result<PathBuf> {
    match custom_path {
        Some(path) if !path.is_absolute() => Err(anyhow::anyhow!(
            "Invalid path: '{}'. Please provide an absolute path.",
            path.display()
        )),
        Some(path) => Ok(path),
        None => crate::config::get_config_path().context("Could not determine home directory"),
    }
}

fn handle_reconfiguration(config_path: &Path, skip_prompts: bool, verbose: bool) -> Result<bool> {
    if verbose {
        tracing::debug!("Configuration already exists, checking for reconfiguration");
    }

    println!("Configuration already exists at {}", config_path.display());

    let reconfigure = if skip_prompts {
        false
    } else {
        Confirm::new("Do you want to reconfigure? (y/N)")
            .with_default(false)
            .with_help_message("Press 'y' to overwrite existing configuration, 'n' to preserve it")
            .prompt()?
    };

    if !reconfigure {
        println!("Preserving existing configuration.");
        return Ok(false);
    }

    Ok(true)
}

/// Returns `None` when the user declines to save
fn collect_user_configuration(skip_prompts: bool, verbose: bool) -> Result<Option<Config>> {
    let mut config = Config::default();

    if skip_prompts {
        if verbose {
            tracing::debug!("Skipping prompts, using default configuration");
        }
        return Ok(Some(config));
    }

    println!();
    println!("Let's configure the interview engine!");

    config.provider = prompt_provider(verbose)?;
    config.generation.request_timeout_ms = prompt_millis(
        "Upstream request timeout (ms):",
        config.generation.request_timeout_ms,
    )?;
    config.store.default_ttl_ms = prompt_millis(
        "Idle session lifetime (ms, 0 = never expire):",
        config.store.default_ttl_ms,
    )?;
    config.align_provider_timeout();

    if !confirm_configuration(&config)? {
        return Ok(None);
    }

    Ok(Some(config))
}

fn prompt_provider(verbose: bool) -> Result<Option<OpenAiConfig>> {
    println!();
    println!("Model Provider Configuration");
    println!("Any OpenAI-compatible chat completions endpoint works.");

    let api_key = Text::new("Enter your API key (or press Enter to skip):")
        .with_help_message("Press Enter without typing to skip this step")
        .prompt()?;

    if api_key.trim().is_empty() {
        if verbose {
            tracing::debug!("User skipped API key configuration");
        }
        return Ok(None);
    }

    let defaults = OpenAiConfig::new(api_key.trim());

    let base_url = Text::new("Base URL:")
        .with_default(&defaults.base_url)
        .with_validator(|input: &str| {
            if input.starts_with("http://") || input.starts_with("https://") {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid("URL must start with http:// or https://".into()))
            }
        })
        .prompt()?;

    let model = Text::new("Model:")
        .with_default(&defaults.default_model)
        .prompt()?;

    Ok(Some(defaults.with_base_url(base_url).with_model(model)))
}

fn prompt_millis(message: &str, default: u64) -> Result<u64> {
    let default_text = default.to_string();
    let answer = Text::new(message)
        .with_default(&default_text)
        .with_validator(|input: &str| {
            if input.trim().parse::<u64>().is_ok() {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid("Enter a whole number of milliseconds".into()))
            }
        })
        .prompt()?;

    Ok(answer.trim().parse::<u64>().unwrap_or(default))
}

fn confirm_configuration(config: &Config) -> Result<bool> {
    println!();
    println!("Please review your configuration:");
    println!();
    println!("{}", format_summary(config));

    println!();
    let confirmed = Confirm::new("Save this configuration?")
        .with_default(true)
        .with_help_message("Press 'y' to save, 'n' to cancel")
        .prompt()?;

    Ok(confirmed)
}

fn display_completion_summary(config: &Config, config_path: &Path, verbose: bool) {
    println!();
    println!("Configuration Complete!");
    println!("Saved to: {}", config_path.display());
    println!("{}", format_summary(config));
    println!();
    println!("Next Steps:");
    println!("  Run 'interview-engine run --profile <file>' to start a mock interview");
    println!();
    println!("Tip: Run 'interview-engine onboard' again to reconfigure at any time.");

    if verbose {
        tracing::debug!("Onboarding completed successfully");
    }
}

fn format_summary(config: &Config) -> String {
    let mut lines = Vec::new();
    match &config.provider {
        Some(provider) => {
            lines.push(format!("  API Key: {}", mask_secret(&provider.api_key)));
            lines.push(format!("  Base URL: {}", provider.base_url));
            lines.push(format!("  Model: {}", provider.default_model));
        }
        None => lines.push("  Provider: (not set)".to_string()),
    }
    lines.push(format!(
        "  Request Timeout: {} ms",
        config.generation.request_timeout_ms
    ));
    lines.push(format!("  Session TTL: {} ms", config.store.default_ttl_ms));
    lines.join("\n")
}

fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 10 {
        "***".to_string()
    } else {
        let start: String = chars[..6].iter().collect();
        let end: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_determine_config_path_with_custom() {
        let result = determine_config_path(Some(PathBuf::from("/tmp/interview/config.json")));
        assert_eq!(result.unwrap(), PathBuf::from("/tmp/interview/config.json"));
    }

    #[test]
    fn test_determine_config_path_with_relative() {
        assert!(determine_config_path(Some(PathBuf::from("relative.json"))).is_err());
    }

    #[test]
    fn test_mask_secret_short() {
        assert_eq!(mask_secret("short"), "***");
    }

    #[test]
    fn test_mask_secret_long() {
        let result = mask_secret("sk-proj-1234567890abcdef");
        assert!(result.starts_with("sk-pro"));
        assert!(result.contains("..."));
        assert!(result.ends_with("cdef"));
    }

    #[test]
    fn test_format_summary_hides_key() {
        let config = Config {
            provider: Some(OpenAiConfig::new("sk-proj-1234567890abcdef")),
            ..Config::default()
        };
        let summary = format_summary(&config);
        assert!(!summary.contains("1234567890"));
        assert!(summary.contains("gpt-4o-mini"));
    }

    #[test]
    fn test_collect_user_configuration_skip() {
        let config = collect_user_configuration(true, false).unwrap().unwrap();
        assert!(config.provider.is_none());
    }

    #[test]
    fn test_onboarding_skip_prompts_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        run_onboarding(false, Some(path.clone()), true).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let saved: Config = serde_json::from_str(&content).unwrap();
        assert_eq!(saved, Config::default());
    }

    #[test]
    fn test_onboarding_skip_prompts_preserves_existing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{\"store\":{\"cleanup_interval_ms\":42}}").unwrap();

        run_onboarding(false, Some(path.clone()), true).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("42"));
    }
}
