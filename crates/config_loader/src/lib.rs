//! # Config Loader
//!
//! Turns a fleet pipeline config file into a checked `PipelineBlueprint`.
//!
//! A blueprint carries the emission model coefficients, alert thresholds,
//! window and fusion settings, the replay inputs and the sink routing table.
//! Every engine section is optional and falls back to the BS-VI defaults, so
//! a config only needs to name what it changes.
//!
//! Semantic checks run after parsing and report the first offending field by
//! its path, e.g. `engine.alerts.idle_warning_seconds`.
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("demos/fleet.toml")).unwrap();
//! println!("Window: {} ms", blueprint.engine.window.duration_ms);
//! ```

mod parser;
mod validator;

pub use contracts::PipelineBlueprint;
pub use parser::ConfigFormat;
pub use validator::MIN_REPLAY_SPEED;

use contracts::ContractError;
use std::path::Path;

/// Loads and checks pipeline blueprints
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a blueprint from a `.toml` or `.json` file
    ///
    /// # Errors
    /// Unreadable file, unknown extension, parse failure or a rejected value.
    pub fn load_from_path(path: &Path) -> Result<PipelineBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Parse and check blueprint text
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<PipelineBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Re-check a blueprint after CLI overrides were applied to it
    pub fn validate(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    /// Render the effective blueprint, defaults included, as TOML
    pub fn to_toml(blueprint: &PipelineBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Render the effective blueprint, defaults included, as JSON
    pub fn to_json(blueprint: &PipelineBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}
