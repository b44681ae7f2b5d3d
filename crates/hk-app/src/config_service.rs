//! Config loading, validation, and introspection.

use std::collections::BTreeMap;
use std::path::Path;

use hk_graph::Topology;
use hk_project::{ProjectError, SimulationConfig};

use crate::compile::build_topology;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};

/// Summary of a validated config for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSummary {
    pub component_count: usize,
    pub connection_count: usize,
    pub event_count: usize,
    pub total_ticks: u64,
    pub dt: f64,
    /// Execution order as agent ids per stage.
    pub stages: Vec<Vec<String>>,
    /// Component count per type tag.
    pub type_counts: BTreeMap<String, usize>,
}

/// Load a config from a `.yaml`/`.yml` or `.json` file.
pub fn load_config(path: &Path) -> AppResult<SimulationConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::ConfigFileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml" | "yml") => hk_project::from_yaml_str(&content)?,
        Some("json") => hk_project::from_json_str(&content)?,
        _ => {
            return Err(ProjectError::UnsupportedFormat {
                path: path.display().to_string(),
            }
            .into());
        }
    };

    tracing::debug!(
        path = %path.display(),
        components = config.components.len(),
        "config loaded"
    );
    Ok(config)
}

/// Full validation: the structural checks plus a topology build against
/// the context's registry (type tags, properties, ports, order, cycles).
pub fn validate_config(ctx: &AppContext, config: &SimulationConfig) -> AppResult<ConfigSummary> {
    hk_project::validate_config(config).map_err(ProjectError::from)?;
    let topology = build_topology(config, ctx.registry())?;
    summarize(config, &topology)
}

pub fn summarize(config: &SimulationConfig, topology: &Topology) -> AppResult<ConfigSummary> {
    let mut type_counts = BTreeMap::new();
    for (_, def) in config.components.iter() {
        *type_counts.entry(def.type_tag.clone()).or_insert(0) += 1;
    }

    Ok(ConfigSummary {
        component_count: topology.len(),
        connection_count: topology.connections().len(),
        event_count: config.events.len(),
        total_ticks: config.total_ticks()?,
        dt: config.simulation_params.dt,
        stages: describe_order(topology),
        type_counts,
    })
}

/// Execution order as agent ids, one list per stage.
pub fn describe_order(topology: &Topology) -> Vec<Vec<String>> {
    topology
        .stage_ids()
        .into_iter()
        .map(|stage| stage.into_iter().map(|id| id.to_string()).collect())
        .collect()
}
