//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{PipelineBlueprint, SinkType, Topic};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

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
    version: String,
    window_ms: u64,
    lateness_ms: u64,
    has_positions: bool,
    has_telemetry: bool,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

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

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

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
                    version: format!("{:?}", blueprint.version),
                    window_ms: blueprint.engine.window.duration_ms,
                    lateness_ms: blueprint.engine.window.lateness_ms,
                    has_positions: blueprint.ingestion.positions_path.is_some(),
                    has_telemetry: blueprint.ingestion.telemetry_path.is_some(),
                    sink_count: blueprint.sinks.len(),
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
fn collect_warnings(blueprint: &PipelineBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let engine = &blueprint.engine;

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - outputs will only be counted".to_string());
    } else if !blueprint.routes_topic(Topic::Alerts) {
        warnings.push("No sink subscribes to the alerts topic".to_string());
    }

    if blueprint.ingestion.positions_path.is_none() {
        warnings.push("ingestion.positions_path is unset - pass --positions to run".to_string());
    }
    if blueprint.ingestion.telemetry_path.is_none() {
        warnings.push(
            "ingestion.telemetry_path is unset - every reading uses default telemetry".to_string(),
        );
    }

    if engine.alerts.emission_spike_g_per_km < engine.model.base_emission_factor {
        warnings.push(format!(
            "alerts.emission_spike_g_per_km ({}) is below model.base_emission_factor ({}) - \
             every moving reading will raise an emission spike",
            engine.alerts.emission_spike_g_per_km, engine.model.base_emission_factor
        ));
    }

    if engine.window.lateness_ms >= engine.window.duration_ms {
        warnings.push(format!(
            "engine.window.lateness_ms ({}) is not shorter than the window ({}) - \
             several windows per vehicle stay open",
            engine.window.lateness_ms, engine.window.duration_ms
        ));
    }

    for sink in &blueprint.sinks {
        if sink.sink_type == SinkType::Log && sink.accepts(Topic::Emissions) {
            warnings.push(format!(
                "Sink '{}' logs every emission record - consider topics = [\"alerts\", \"summaries\"]",
                sink.name
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!(
                "  Window: {} ms (lateness {} ms)",
                summary.window_ms, summary.lateness_ms
            );
            println!("  Positions input: {}", yes_no(summary.has_positions));
            println!("  Telemetry input: {}", yes_no(summary.has_telemetry));
            println!("  Sinks: {}", summary.sink_count);
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

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
