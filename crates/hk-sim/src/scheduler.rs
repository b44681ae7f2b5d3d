//! Tick loop: events, propagation, guarded steps, logging.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hk_components::{DecisionGate, Inputs, StepContext};
use hk_core::{AgentId, AttrRef, SimClock};
use hk_graph::{Feed, Topology};
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::error::{SimError, SimResult};
use crate::fault::{AgentState, FailedSourcePolicy, FaultEvent};
use crate::guard::{StepOutcome, guarded_step};
use crate::logger::{DataLogger, LoggerConfig};

/// Attribute write applied at the start of the tick whose interval
/// `[t, t + dt)` contains `time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub time: f64,
    pub target: AttrRef,
    pub value: f64,
}

/// A scheduled event that could not be applied. The run continues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventError {
    pub tick: u64,
    pub target: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerOptions {
    pub failure_policy: FailedSourcePolicy,
    pub logger: LoggerConfig,
}

/// Progress snapshot emitted after every completed tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SimProgress {
    pub tick: u64,
    pub total_ticks: u64,
    pub time: f64,
    pub faults: usize,
}

impl SimProgress {
    pub fn fraction_complete(&self) -> f64 {
        if self.total_ticks == 0 {
            1.0
        } else {
            (self.tick + 1) as f64 / self.total_ticks as f64
        }
    }
}

/// Summary of a finished (or cancelled) run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub ticks_completed: u64,
    pub total_ticks: u64,
    pub dt: f64,
    pub cancelled: bool,
    pub faults: Vec<FaultEvent>,
    pub event_errors: Vec<EventError>,
    pub wall_time: Duration,
    pub logger: DataLogger,
}

impl RunReport {
    pub fn failed_agents(&self) -> Vec<&AgentId> {
        self.faults.iter().map(|f| &f.agent_id).collect()
    }
}

/// Drives a [`Topology`] through a fixed number of ticks.
pub struct Scheduler {
    topology: Topology,
    options: SchedulerOptions,
    events: Vec<ScheduledEvent>,
    gate: Option<Arc<dyn DecisionGate>>,
}

impl Scheduler {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            options: SchedulerOptions::default(),
            events: Vec::new(),
            gate: None,
        }
    }

    pub fn with_options(mut self, options: SchedulerOptions) -> Self {
        self.options = options;
        self
    }

    /// Attach scheduled events. Every target must name an agent.
    pub fn with_events(mut self, events: Vec<ScheduledEvent>) -> SimResult<Self> {
        if let Some(bad) = events
            .iter()
            .find(|e| self.topology.index_of(e.target.agent.as_str()).is_none())
        {
            return Err(SimError::UnknownEventTarget {
                target: bad.target.to_string(),
            });
        }
        if events.iter().any(|e| !e.time.is_finite() || !e.value.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "event time and value must be finite",
            });
        }
        self.events = events;
        Ok(self)
    }

    /// Supervisory layer offered to agents through [`StepContext`].
    pub fn with_gate(mut self, gate: Arc<dyn DecisionGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Run to completion.
    pub fn run(self, total_ticks: u64, dt: f64) -> SimResult<RunReport> {
        self.run_with_progress(total_ticks, dt, &CancelToken::new(), |_| {})
    }

    /// Run, reporting after each tick and stopping between ticks once
    /// `cancel` is set.
    pub fn run_with_progress<F>(
        mut self,
        total_ticks: u64,
        dt: f64,
        cancel: &CancelToken,
        mut progress: F,
    ) -> SimResult<RunReport>
    where
        F: FnMut(&SimProgress),
    {
        let mut clock = SimClock::new(dt, total_ticks)?;
        let started = Instant::now();
        let agent_count = self.topology.len();

        tracing::info!(
            agents = agent_count,
            stages = self.topology.order().stages().len(),
            total_ticks,
            dt,
            "run started"
        );

        let order: Vec<Vec<usize>> = self.topology.order().stages().to_vec();
        let event_ticks: Vec<u64> = self
            .events
            .iter()
            .map(|e| (e.time / dt + 1e-9).floor().max(0.0) as u64)
            .collect();

        let mut state = vec![AgentState::Alive; agent_count];
        // Last good output values per agent, seeded with initial attributes.
        let mut current: Vec<BTreeMap<String, f64>> = (0..agent_count)
            .map(|idx| self.read_outputs(idx))
            .collect();
        let mut logger = DataLogger::new(self.options.logger);
        let mut faults = Vec::new();
        let mut event_errors = Vec::new();
        let mut cancelled = false;

        while !clock.is_finished() {
            if cancel.is_cancelled() {
                cancelled = true;
                tracing::info!(tick = clock.tick(), "run cancelled");
                break;
            }
            let tick = clock.tick();
            let time = clock.time();

            self.apply_events(tick, &event_ticks, &state, &mut event_errors);

            let previous = current.clone();
            for stage in &order {
                for &idx in stage {
                    if state[idx] == AgentState::Failed {
                        continue;
                    }
                    let inputs = self.gather_inputs(idx, &state, &current, &previous);

                    let gate = self.gate.as_deref();
                    let Some(slot) = self.topology.agent_mut(idx) else {
                        continue;
                    };
                    let ctx = StepContext::new(&slot.id, tick, dt).with_gate(gate);
                    match guarded_step(slot.agent.as_mut(), &ctx, &inputs) {
                        StepOutcome::Completed => {
                            current[idx] = self.read_outputs(idx);
                        }
                        StepOutcome::Faulted { kind, message } => {
                            tracing::warn!(
                                tick,
                                agent = %slot.id,
                                ?kind,
                                %message,
                                "agent failed; isolating"
                            );
                            faults.push(FaultEvent {
                                tick,
                                agent_id: slot.id.clone(),
                                kind,
                                message,
                            });
                            state[idx] = AgentState::Failed;
                        }
                    }
                }
            }

            if logger.should_record(tick, total_ticks) {
                let mut values = BTreeMap::new();
                for (idx, outputs) in current.iter().enumerate() {
                    if state[idx] == AgentState::Failed {
                        continue;
                    }
                    let id = &self.topology.agents()[idx].id;
                    for (attr, value) in outputs {
                        values.insert(format!("{id}.{attr}"), *value);
                    }
                }
                logger.record(tick, time, values)?;
            }

            progress(&SimProgress {
                tick,
                total_ticks,
                time,
                faults: faults.len(),
            });
            clock.advance();
        }

        let report = RunReport {
            ticks_completed: clock.tick(),
            total_ticks,
            dt,
            cancelled,
            faults,
            event_errors,
            wall_time: started.elapsed(),
            logger,
        };
        tracing::info!(
            ticks = report.ticks_completed,
            faults = report.faults.len(),
            cancelled = report.cancelled,
            wall_ms = report.wall_time.as_millis() as u64,
            "run finished"
        );
        Ok(report)
    }

    fn read_outputs(&self, idx: usize) -> BTreeMap<String, f64> {
        let Some(slot) = self.topology.agent(idx) else {
            return BTreeMap::new();
        };
        slot.agent
            .ports()
            .outputs
            .iter()
            .filter_map(|name| {
                slot.agent
                    .attribute(name)
                    .map(|value| (name.clone(), value))
            })
            .collect()
    }

    fn gather_inputs(
        &self,
        idx: usize,
        state: &[AgentState],
        current: &[BTreeMap<String, f64>],
        previous: &[BTreeMap<String, f64>],
    ) -> Inputs {
        let mut inputs = Inputs::new();
        for binding in self.topology.bindings(idx) {
            if state[binding.source] == AgentState::Failed
                && self.options.failure_policy == FailedSourcePolicy::Unavailable
            {
                continue;
            }
            let snapshot = match binding.feed {
                Feed::SameTick => &current[binding.source],
                Feed::PreviousTick => &previous[binding.source],
            };
            if let Some(&value) = snapshot.get(&binding.source_attr) {
                inputs.insert(binding.input.clone(), value);
            }
        }
        inputs
    }

    fn apply_events(
        &mut self,
        tick: u64,
        event_ticks: &[u64],
        state: &[AgentState],
        errors: &mut Vec<EventError>,
    ) {
        for (event, &at) in self.events.iter().zip(event_ticks) {
            if at != tick {
                continue;
            }
            let Some(idx) = self.topology.index_of(event.target.agent.as_str()) else {
                continue;
            };
            if state[idx] == AgentState::Failed {
                tracing::debug!(tick, target = %event.target, "skipping event for failed agent");
                continue;
            }
            let Some(slot) = self.topology.agent_mut(idx) else {
                continue;
            };
            if let Err(err) = slot.agent.set_attribute(&event.target.attr, event.value) {
                tracing::warn!(tick, target = %event.target, error = %err, "event not applied");
                errors.push(EventError {
                    tick,
                    target: event.target.to_string(),
                    message: err.to_string(),
                });
            }
        }
    }
}
