//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::InitConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::{Cli, ValidateArgs};

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    url: Option<String>,
    distance_filter: f64,
    max_retention_days: u32,
    header_count: usize,
    param_count: usize,
    authorization: bool,
    auto_start_on_boot: bool,
    continue_on_app_terminate: bool,
}

/// Execute the `validate` command
pub fn run_validate(cli: &Cli, args: &ValidateArgs) -> Result<()> {
    info!(config = %cli.config.display(), "Validating configuration");

    let result = validate_config(cli);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(cli: &Cli) -> ValidationResult {
    let config_path = cli.config.display().to_string();

    if !cli.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", cli.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&cli.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    url: config.url.clone(),
                    distance_filter: config.distance_filter,
                    max_retention_days: config.max_retention_days,
                    header_count: config.headers.len(),
                    param_count: config.params.len(),
                    authorization: config.authorization.is_some(),
                    auto_start_on_boot: config.auto_start_on_boot,
                    continue_on_app_terminate: config.continue_on_app_terminate,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &InitConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.url.is_none() {
        warnings.push("No upload url configured - locations stay on the device".to_string());
    }

    if let Some(auth) = &config.authorization {
        if auth.refresh_token.is_none() {
            warnings.push("authorization has no refresh_token - access token cannot be renewed".to_string());
        }
    }

    if config.batch_sync && !config.auto_sync {
        warnings.push("batch_sync has no effect while auto_sync is disabled".to_string());
    }

    if config.debug {
        warnings.push("debug is enabled - the engine will emit debug sounds and notifications".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!(
                "\n  Upload url: {}",
                summary.url.as_deref().unwrap_or("(none)")
            );
            println!("  Distance filter: {} m", summary.distance_filter);
            println!("  Retention: {} days", summary.max_retention_days);
            println!("  Headers: {}", summary.header_count);
            println!("  Params: {}", summary.param_count);
            println!("  Authorization: {}", summary.authorization);
            println!("  Start on boot: {}", summary.auto_start_on_boot);
            println!(
                "  Continue on terminate: {}",
                summary.continue_on_app_terminate
            );
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
