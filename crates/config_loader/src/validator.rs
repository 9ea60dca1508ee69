//! Config validation
//!
//! Rules:
//! - emission model coefficients are positive / non-negative, speed band ordered
//! - idle warning threshold below critical threshold
//! - window duration > 0, fusion history >= 1
//! - ingestion channel capacity > 0, replay speed 0 (unpaced) or >= MIN_REPLAY_SPEED
//! - sink names unique and non-empty, queue capacity > 0, file sinks have a path

use std::collections::HashSet;

use contracts::{ContractError, PipelineBlueprint, SinkType};

/// Slowest accepted pacing factor; slower speeds turn event gaps into sleeps
/// too long to represent
pub const MIN_REPLAY_SPEED: f64 = 0.001;

/// Validate a PipelineBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    validate_model(blueprint)?;
    validate_alerts(blueprint)?;
    validate_window_and_fusion(blueprint)?;
    validate_ingestion(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

fn validate_model(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    let model = &blueprint.engine.model;

    let positive = [
        ("engine.model.base_emission_factor", model.base_emission_factor),
        ("engine.model.reading_distance_km", model.reading_distance_km),
        (
            "engine.model.idle_emission_rate_g_per_s",
            model.idle_emission_rate_g_per_s,
        ),
    ];
    for (field, value) in positive {
        if !(value.is_finite() && value > 0.0) {
            return Err(ContractError::config_validation(
                field,
                format!("must be > 0, got {value}"),
            ));
        }
    }

    let non_negative = [
        (
            "engine.model.load_penalty_per_1000kg",
            model.load_penalty_per_1000kg,
        ),
        ("engine.model.low_speed_slope", model.low_speed_slope),
        ("engine.model.high_speed_slope", model.high_speed_slope),
        ("engine.model.stationary_speed_kmh", model.stationary_speed_kmh),
        ("engine.model.optimal_speed_min", model.optimal_speed_min),
    ];
    for (field, value) in non_negative {
        if !(value.is_finite() && value >= 0.0) {
            return Err(ContractError::config_validation(
                field,
                format!("must be >= 0, got {value}"),
            ));
        }
    }

    if !(model.optimal_speed_max.is_finite() && model.optimal_speed_min <= model.optimal_speed_max)
    {
        return Err(ContractError::config_validation(
            "engine.model.optimal_speed_min / engine.model.optimal_speed_max",
            format!(
                "optimal_speed_min ({}) must be <= optimal_speed_max ({})",
                model.optimal_speed_min, model.optimal_speed_max
            ),
        ));
    }

    Ok(())
}

fn validate_alerts(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    let alerts = &blueprint.engine.alerts;

    if alerts.idle_warning_seconds >= alerts.idle_critical_seconds {
        return Err(ContractError::config_validation(
            "engine.alerts.idle_warning_seconds / engine.alerts.idle_critical_seconds",
            format!(
                "idle_warning_seconds ({}) must be < idle_critical_seconds ({})",
                alerts.idle_warning_seconds, alerts.idle_critical_seconds
            ),
        ));
    }

    let non_negative = [
        (
            "engine.alerts.emission_spike_g_per_km",
            alerts.emission_spike_g_per_km,
        ),
        ("engine.alerts.spike_min_speed_kmh", alerts.spike_min_speed_kmh),
        (
            "engine.alerts.idle_waste_rate_g_per_s",
            alerts.idle_waste_rate_g_per_s,
        ),
    ];
    for (field, value) in non_negative {
        if !(value.is_finite() && value >= 0.0) {
            return Err(ContractError::config_validation(
                field,
                format!("must be >= 0, got {value}"),
            ));
        }
    }

    Ok(())
}

fn validate_window_and_fusion(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    if blueprint.engine.window.duration_ms == 0 {
        return Err(ContractError::config_validation(
            "engine.window.duration_ms",
            "duration_ms must be > 0",
        ));
    }
    if blueprint.engine.fusion.telemetry_history == 0 {
        return Err(ContractError::config_validation(
            "engine.fusion.telemetry_history",
            "telemetry_history must be >= 1",
        ));
    }
    Ok(())
}

fn validate_ingestion(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    let ingestion = &blueprint.ingestion;

    if ingestion.channel_capacity == 0 {
        return Err(ContractError::config_validation(
            "ingestion.channel_capacity",
            "channel_capacity must be > 0",
        ));
    }
    let speed = ingestion.replay_speed;
    if !(speed.is_finite() && (speed == 0.0 || speed >= MIN_REPLAY_SPEED)) {
        return Err(ContractError::config_validation(
            "ingestion.replay_speed",
            format!("replay_speed must be 0 or >= {MIN_REPLAY_SPEED}, got {speed}"),
        ));
    }
    Ok(())
}

fn validate_sinks(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }
        if sink.sink_type == SinkType::File && !sink.params.contains_key("path") {
            return Err(ContractError::config_validation(
                format!("sinks[{}].params.path", sink.name),
                "file sink requires a 'path' param",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ConfigVersion, EngineConfig, IngestionConfig, SinkConfig};
    use std::collections::HashMap;

    fn minimal_blueprint() -> PipelineBlueprint {
        PipelineBlueprint {
            version: ConfigVersion::V1,
            engine: EngineConfig::default(),
            ingestion: IngestionConfig::default(),
            sinks: vec![SinkConfig {
                name: "log".into(),
                sink_type: SinkType::Log,
                queue_capacity: 100,
                topics: vec![],
                params: HashMap::new(),
            }],
        }
    }

    fn error_of(bp: &PipelineBlueprint) -> String {
        validate(bp).unwrap_err().to_string()
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&minimal_blueprint()).is_ok());
    }

    #[test]
    fn test_inverted_speed_band() {
        let mut bp = minimal_blueprint();
        bp.engine.model.optimal_speed_min = 80.0;
        let err = error_of(&bp);
        assert!(err.contains("optimal_speed_min"), "got: {err}");
    }

    #[test]
    fn test_zero_base_factor() {
        let mut bp = minimal_blueprint();
        bp.engine.model.base_emission_factor = 0.0;
        let err = error_of(&bp);
        assert!(err.contains("base_emission_factor"), "got: {err}");
    }

    #[test]
    fn test_negative_slope() {
        let mut bp = minimal_blueprint();
        bp.engine.model.high_speed_slope = -0.1;
        let err = error_of(&bp);
        assert!(err.contains("high_speed_slope"), "got: {err}");
    }

    #[test]
    fn test_warning_not_below_critical() {
        let mut bp = minimal_blueprint();
        bp.engine.alerts.idle_warning_seconds = 120;
        let err = error_of(&bp);
        assert!(err.contains("idle_warning_seconds"), "got: {err}");
    }

    #[test]
    fn test_zero_window_duration() {
        let mut bp = minimal_blueprint();
        bp.engine.window.duration_ms = 0;
        let err = error_of(&bp);
        assert!(err.contains("duration_ms"), "got: {err}");
    }

    #[test]
    fn test_zero_telemetry_history() {
        let mut bp = minimal_blueprint();
        bp.engine.fusion.telemetry_history = 0;
        let err = error_of(&bp);
        assert!(err.contains("telemetry_history"), "got: {err}");
    }

    #[test]
    fn test_negative_replay_speed() {
        let mut bp = minimal_blueprint();
        bp.ingestion.replay_speed = -1.0;
        let err = error_of(&bp);
        assert!(err.contains("replay_speed"), "got: {err}");
    }

    #[test]
    fn test_tiny_replay_speed() {
        let mut bp = minimal_blueprint();
        bp.ingestion.replay_speed = 1e-300;
        let err = error_of(&bp);
        assert!(err.contains("replay_speed"), "got: {err}");

        bp.ingestion.replay_speed = 0.0;
        assert!(validate(&bp).is_ok());
        bp.ingestion.replay_speed = MIN_REPLAY_SPEED;
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_zero_channel_capacity() {
        let mut bp = minimal_blueprint();
        bp.ingestion.channel_capacity = 0;
        let err = error_of(&bp);
        assert!(err.contains("channel_capacity"), "got: {err}");
    }

    #[test]
    fn test_empty_sink_name() {
        let mut bp = minimal_blueprint();
        bp.sinks[0].name = String::new();
        let err = error_of(&bp);
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_duplicate_sink_name() {
        let mut bp = minimal_blueprint();
        bp.sinks.push(bp.sinks[0].clone());
        let err = error_of(&bp);
        assert!(err.contains("duplicate sink name"), "got: {err}");
    }

    #[test]
    fn test_zero_queue_capacity() {
        let mut bp = minimal_blueprint();
        bp.sinks[0].queue_capacity = 0;
        let err = error_of(&bp);
        assert!(err.contains("queue_capacity"), "got: {err}");
    }

    #[test]
    fn test_file_sink_requires_path() {
        let mut bp = minimal_blueprint();
        bp.sinks[0].sink_type = SinkType::File;
        let err = error_of(&bp);
        assert!(err.contains("path"), "got: {err}");

        bp.sinks[0]
            .params
            .insert("path".into(), "out/emissions.ndjson".into());
        assert!(validate(&bp).is_ok());
    }
}
