//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{EngineConfig, IngestionConfig, PipelineBlueprint, Topic};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo<'a> {
    version: String,
    engine: &'a EngineConfig,
    ingestion: &'a IngestionConfig,
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
    topics: Vec<Topic>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn build_config_info(blueprint: &PipelineBlueprint) -> ConfigInfo<'_> {
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        engine: &blueprint.engine,
        ingestion: &blueprint.ingestion,
        sinks: blueprint
            .sinks
            .iter()
            .map(|sink| SinkInfo {
                name: sink.name.clone(),
                sink_type: format!("{:?}", sink.sink_type).to_lowercase(),
                queue_capacity: sink.queue_capacity,
                topics: effective_topics(&sink.topics),
            })
            .collect(),
    }
}

/// An empty subscription list means every topic
fn effective_topics(topics: &[Topic]) -> Vec<Topic> {
    if topics.is_empty() {
        Topic::ALL.to_vec()
    } else {
        topics.to_vec()
    }
}

fn print_config_info(blueprint: &PipelineBlueprint) {
    let engine = &blueprint.engine;
    let model = &engine.model;
    let alerts = &engine.alerts;

    println!("\n=== Configuration ({:?}) ===", blueprint.version);

    println!("\nEmission model:");
    println!("  Base factor:        {} g/km", model.base_emission_factor);
    println!(
        "  Load penalty:       {} g/km per 1000 kg",
        model.load_penalty_per_1000kg
    );
    println!(
        "  Optimal band:       {}-{} km/h",
        model.optimal_speed_min, model.optimal_speed_max
    );
    println!(
        "  Slopes (low/high):  {} / {} per km/h",
        model.low_speed_slope, model.high_speed_slope
    );
    println!(
        "  Idle:               {} g/s, capped at {} s per reading",
        model.idle_emission_rate_g_per_s, model.idle_cap_seconds
    );
    println!("  Stationary below:   {} km/h", model.stationary_speed_kmh);
    println!("  Reading distance:   {} km", model.reading_distance_km);

    println!("\nAlerts:");
    println!(
        "  Idle warning/critical: {} s / {} s",
        alerts.idle_warning_seconds, alerts.idle_critical_seconds
    );
    println!(
        "  Spike:                 > {} g/km above {} km/h",
        alerts.emission_spike_g_per_km, alerts.spike_min_speed_kmh
    );

    println!("\nWindows:");
    println!("  Duration: {} ms", engine.window.duration_ms);
    println!("  Lateness: {} ms", engine.window.lateness_ms);
    println!("  Telemetry history: {}", engine.fusion.telemetry_history);

    let ingestion = &blueprint.ingestion;
    println!("\nIngestion:");
    println!(
        "  Positions: {}",
        ingestion.positions_path.as_deref().unwrap_or("-")
    );
    println!(
        "  Telemetry: {}",
        ingestion.telemetry_path.as_deref().unwrap_or("-")
    );
    println!("  Channel capacity: {}", ingestion.channel_capacity);
    println!("  Replay speed: {}", ingestion.replay_speed);

    if blueprint.sinks.is_empty() {
        println!("\nSinks: none");
    } else {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            let topics: Vec<_> = effective_topics(&sink.topics)
                .iter()
                .map(Topic::as_str)
                .collect();
            println!(
                "  - {} ({:?}, queue {}) <- {}",
                sink.name,
                sink.sink_type,
                sink.queue_capacity,
                topics.join(", ")
            );
            for (key, value) in &sink.params {
                println!("      {key} = {value}");
            }
        }
    }

    println!();
}
