//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::PipelineBlueprint;
use tracing::{error, info};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args)?;

    info!(
        positions = ?blueprint.ingestion.positions_path,
        telemetry = ?blueprint.ingestion.telemetry_path,
        replay_speed = blueprint.ingestion.replay_speed,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        max_records: (args.max_records > 0).then_some(args.max_records),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    });

    info!("Starting pipeline...");
    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        records = stats.counters.records,
        alerts = stats.counters.alerts,
        late_dropped = stats.counters.late_dropped,
        duration_secs = stats.duration.as_secs_f64(),
        records_per_sec = format!("{:.2}", stats.records_per_sec()),
        "Pipeline completed"
    );
    stats.print_summary();

    info!("Fleet emissions finished");
    Ok(())
}

/// Apply CLI/env overrides and re-validate
fn apply_overrides(blueprint: &mut PipelineBlueprint, args: &RunArgs) -> Result<()> {
    if let Some(ref path) = args.positions {
        info!(path = %path.display(), "Overriding positions input from CLI");
        blueprint.ingestion.positions_path = Some(path.display().to_string());
    }
    if let Some(ref path) = args.telemetry {
        info!(path = %path.display(), "Overriding telemetry input from CLI");
        blueprint.ingestion.telemetry_path = Some(path.display().to_string());
    }
    if let Some(speed) = args.replay_speed {
        blueprint.ingestion.replay_speed = speed;
    }
    if let Some(size) = args.buffer_size {
        blueprint.ingestion.channel_capacity = size;
    }

    if blueprint.ingestion.positions_path.is_none() {
        return Err(CliError::NoInput.into());
    }

    config_loader::ConfigLoader::validate(blueprint)
        .map_err(|e| CliError::config_validation(e.to_string()))?;
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &PipelineBlueprint) {
    let engine = &blueprint.engine;
    println!("\n=== Configuration Summary ===\n");
    println!("Input:");
    println!(
        "  Positions: {}",
        blueprint.ingestion.positions_path.as_deref().unwrap_or("-")
    );
    println!(
        "  Telemetry: {}",
        blueprint.ingestion.telemetry_path.as_deref().unwrap_or("-")
    );
    println!("  Replay speed: {}", blueprint.ingestion.replay_speed);

    println!("\nEngine:");
    println!("  Base factor: {} g/km", engine.model.base_emission_factor);
    println!(
        "  Window: {} ms (lateness {} ms)",
        engine.window.duration_ms, engine.window.lateness_ms
    );
    println!(
        "  Idle thresholds: warning {}s, critical {}s",
        engine.alerts.idle_warning_seconds, engine.alerts.idle_critical_seconds
    );

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}
