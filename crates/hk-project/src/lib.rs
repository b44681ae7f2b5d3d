//! hk-project: simulation configuration format and validation.

pub mod schema;
pub mod validate;

use std::path::Path;

use hk_core::{KernelError, SimClock};

pub use schema::*;
pub use validate::{ValidationError, validate_config};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unsupported config format: {path}")]
    UnsupportedFormat { path: String },

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimulationConfig {
    /// `ceil(totalTime / dt)`.
    pub fn total_ticks(&self) -> ProjectResult<u64> {
        let params = &self.simulation_params;
        Ok(SimClock::ticks_for(params.total_time, params.dt)?)
    }
}

pub fn from_yaml_str(content: &str) -> ProjectResult<SimulationConfig> {
    let config: SimulationConfig = serde_yaml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn from_json_str(content: &str) -> ProjectResult<SimulationConfig> {
    let config: SimulationConfig = serde_json::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn load_yaml(path: &Path) -> ProjectResult<SimulationConfig> {
    from_yaml_str(&std::fs::read_to_string(path)?)
}

pub fn load_json(path: &Path) -> ProjectResult<SimulationConfig> {
    from_json_str(&std::fs::read_to_string(path)?)
}

/// Load by file extension (`.yaml`/`.yml` or `.json`).
pub fn load(path: &Path) -> ProjectResult<SimulationConfig> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml" | "yml") => load_yaml(path),
        Some("json") => load_json(path),
        _ => Err(ProjectError::UnsupportedFormat {
            path: path.display().to_string(),
        }),
    }
}

pub fn save_yaml(path: &Path, config: &SimulationConfig) -> ProjectResult<()> {
    validate_config(config)?;
    std::fs::write(path, serde_yaml::to_string(config)?)?;
    Ok(())
}

pub fn save_json(path: &Path, config: &SimulationConfig) -> ProjectResult<()> {
    validate_config(config)?;
    std::fs::write(path, serde_json::to_string_pretty(config)?)?;
    Ok(())
}
