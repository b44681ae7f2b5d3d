//! Compile a [`SimulationConfig`] into a runnable topology and scheduler.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use hk_components::{
    ComponentRegistry, Decision, DecisionGate, DecisionOutcome, Properties,
};
use hk_core::{AgentId, AttrRef};
use hk_dispatch::{DispatchConfig, Dispatcher};
use hk_graph::{Feed, OrderEntry, Topology, TopologyBuilder};
use hk_project::{
    ComponentDef, DispatchDef, FailSafeDef, FailurePolicyDef, FeedDef, OrderEntryDef,
    SimulationConfig, ValidationError,
};
use hk_sim::{FailedSourcePolicy, LoggerConfig, ScheduledEvent, Scheduler, SchedulerOptions};
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Scheduler ready to run, with the clock settings taken from the config.
pub struct CompiledRun {
    pub scheduler: Scheduler,
    pub total_ticks: u64,
    pub dt: f64,
}

impl std::fmt::Debug for CompiledRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledRun")
            .field("agents", &self.scheduler.topology().len())
            .field("total_ticks", &self.total_ticks)
            .field("dt", &self.dt)
            .finish()
    }
}

/// Component properties with a `dataset` reference replaced by the named
/// dataset's values under `values`.
pub fn resolve_properties(
    id: &str,
    def: &ComponentDef,
    datasets: &BTreeMap<String, Vec<f64>>,
) -> AppResult<Properties> {
    let mut properties = def.properties.clone();
    let Some(reference) = properties.remove("dataset") else {
        return Ok(properties);
    };

    let name = reference.as_str().ok_or_else(|| {
        AppError::InvalidInput(format!("component '{id}': dataset must be a string"))
    })?;
    let values = datasets.get(name).ok_or_else(|| {
        AppError::Project(
            ValidationError::MissingReference {
                id: name.to_string(),
                context: format!("datasets (component '{id}')"),
            }
            .into(),
        )
    })?;
    if properties.contains_key("values") {
        return Err(AppError::InvalidInput(format!(
            "component '{id}': both 'dataset' and 'values' given"
        )));
    }
    properties.insert(
        "values".to_string(),
        Value::Array(values.iter().map(|&v| Value::from(v)).collect()),
    );
    Ok(properties)
}

/// Build and validate the topology described by `config`.
pub fn build_topology(config: &SimulationConfig, registry: &ComponentRegistry) -> AppResult<Topology> {
    let mut builder = TopologyBuilder::new();

    for (id, def) in config.components.iter() {
        let properties = resolve_properties(id, def, &config.datasets)?;
        builder.add_component(id, def.type_tag.as_str(), properties);
    }

    for conn in &config.connections {
        let feed = match conn.feed {
            FeedDef::SameTick => Feed::SameTick,
            FeedDef::PreviousTick => Feed::PreviousTick,
        };
        builder.connect(AttrRef::parse(&conn.source)?, AttrRef::parse(&conn.target)?, feed);
    }

    if let Some(order) = &config.execution_order {
        let entries = order
            .iter()
            .map(|entry| match entry {
                OrderEntryDef::Single(id) => OrderEntry::Single(AgentId::new(id)),
                OrderEntryDef::Stage(ids) => {
                    OrderEntry::Stage(ids.iter().map(AgentId::new).collect())
                }
            })
            .collect();
        builder.execution_order(entries);
    }

    Ok(builder.build(registry)?)
}

/// Compile `config` into a scheduler with its policy, logger and events.
pub fn compile_config(config: &SimulationConfig, registry: &ComponentRegistry) -> AppResult<CompiledRun> {
    let topology = build_topology(config, registry)?;

    let options = SchedulerOptions {
        failure_policy: match config.failure_policy {
            FailurePolicyDef::HoldLast => FailedSourcePolicy::HoldLast,
            FailurePolicyDef::Unavailable => FailedSourcePolicy::Unavailable,
        },
        logger: LoggerConfig {
            record_every: config.logger_config.record_every,
        },
    };

    let events = config
        .events
        .iter()
        .map(|event| -> AppResult<ScheduledEvent> {
            Ok(ScheduledEvent {
                time: event.time,
                target: AttrRef::parse(&event.target)?,
                value: event.value,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let scheduler = Scheduler::new(topology)
        .with_options(options)
        .with_events(events)?;

    tracing::debug!(
        agents = scheduler.topology().len(),
        stages = scheduler.topology().order().stages().len(),
        "config compiled"
    );

    Ok(CompiledRun {
        scheduler,
        total_ticks: config.total_ticks()?,
        dt: config.simulation_params.dt,
    })
}

/// Decision gate for one run: the shared dispatcher, with the run's own
/// timeout and fail-safe where its config sets them.
#[derive(Debug, Clone)]
pub struct RunGate {
    dispatcher: Arc<Dispatcher>,
    config: DispatchConfig,
}

impl RunGate {
    pub fn new(dispatcher: Arc<Dispatcher>, settings: Option<&DispatchDef>) -> Self {
        let mut config = *dispatcher.config();
        if let Some(settings) = settings {
            if let Some(secs) = settings.decision_timeout {
                match Duration::try_from_secs_f64(secs) {
                    Ok(timeout) => config.decision_timeout = timeout,
                    Err(err) => tracing::warn!(
                        decision_timeout = secs,
                        error = %err,
                        "ignoring invalid decision timeout; keeping dispatcher default"
                    ),
                }
            }
            if let Some(fail_safe) = settings.fail_safe {
                config.fail_safe = match fail_safe {
                    FailSafeDef::Approve => Decision::Approve,
                    FailSafeDef::Reject => Decision::Reject,
                };
            }
        }
        Self { dispatcher, config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }
}

impl DecisionGate for RunGate {
    fn request(&self, agent_id: &AgentId, payload: Value) -> DecisionOutcome {
        self.dispatcher.request_with(agent_id, payload, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(yaml: &str) -> SimulationConfig {
        hk_project::from_yaml_str(yaml).unwrap()
    }

    #[test]
    fn dataset_is_inlined_as_values() {
        let config = config(
            "
simulationParams: { totalTime: 3.0, dt: 1.0 }
components:
  rain: { type: series, properties: { dataset: rainfall, hold: true } }
datasets:
  rainfall: [0.0, 1.5, 3.0]
",
        );
        let (id, def) = config.components.iter().next().unwrap();
        let props = resolve_properties(id, def, &config.datasets).unwrap();
        assert!(!props.contains_key("dataset"));
        assert_eq!(props["values"], json!([0.0, 1.5, 3.0]));
        assert_eq!(props["hold"], json!(true));
    }

    #[test]
    fn dataset_and_values_together_are_rejected() {
        let mut datasets = BTreeMap::new();
        datasets.insert("d".to_string(), vec![1.0]);
        let def = ComponentDef::new(
            "series",
            json!({"dataset": "d", "values": [2.0]})
                .as_object()
                .cloned()
                .unwrap(),
        );
        assert!(matches!(
            resolve_properties("s", &def, &datasets),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn compile_maps_clock_and_order() {
        let config = config(
            "
simulationParams: { totalTime: 2.5, dt: 0.5 }
components:
  A: { type: constant, properties: { value: 1.0 } }
  B: { type: gain, properties: { gain: 3.0 } }
  C: { type: dummy }
connections:
  - { source: A.output, target: B.input }
executionOrder: [[A, C], B]
",
        );
        let compiled = compile_config(&config, &ComponentRegistry::with_builtins()).unwrap();
        assert_eq!(compiled.total_ticks, 5);
        assert_eq!(compiled.dt, 0.5);
        let stages: Vec<Vec<String>> = compiled
            .scheduler
            .topology()
            .stage_ids()
            .into_iter()
            .map(|s| s.into_iter().map(|id| id.to_string()).collect())
            .collect();
        assert_eq!(stages, vec![vec!["A", "C"], vec!["B"]]);
    }

    #[test]
    fn run_gate_overrides_dispatcher_settings() {
        let dispatcher = Arc::new(Dispatcher::default());
        let gate = RunGate::new(
            Arc::clone(&dispatcher),
            Some(&DispatchDef {
                decision_timeout: Some(0.25),
                fail_safe: Some(FailSafeDef::Approve),
            }),
        );
        assert_eq!(gate.config().decision_timeout, Duration::from_millis(250));
        assert_eq!(gate.config().fail_safe, Decision::Approve);

        let plain = RunGate::new(dispatcher, None);
        assert_eq!(plain.config().decision_timeout, Duration::from_secs(30));
        assert_eq!(plain.config().fail_safe, Decision::Reject);
    }

    #[test]
    fn run_gate_keeps_default_for_invalid_timeout() {
        let dispatcher = Arc::new(Dispatcher::default());
        for secs in [-1.0, f64::NAN, f64::INFINITY] {
            let gate = RunGate::new(
                Arc::clone(&dispatcher),
                Some(&DispatchDef {
                    decision_timeout: Some(secs),
                    fail_safe: Some(FailSafeDef::Approve),
                }),
            );
            assert_eq!(gate.config().decision_timeout, Duration::from_secs(30));
            assert_eq!(gate.config().fail_safe, Decision::Approve);
        }
    }
}
