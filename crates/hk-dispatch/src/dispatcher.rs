//! Supervisory context shared by the simulation and network handlers.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use hk_components::{Decision, DecisionGate, DecisionOutcome};
use hk_core::AgentId;
use serde_json::{Map, Value};

use crate::decision::{DecisionRequest, DecisionState, DecisionTable, SubmitAck};
use crate::error::DispatchResult;
use crate::status::{DeviceStatus, StatusStore};

/// Decision handling settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchConfig {
    /// How long an agent waits for an operator before the fail-safe applies.
    pub decision_timeout: Duration,
    /// Decision used when a request expires.
    pub fail_safe: Decision,
    /// How long fulfilled or expired requests stay in the table. Within this
    /// window a repeated response is a duplicate or a late answer; after it,
    /// the request id is unknown.
    pub resolved_retention: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            decision_timeout: Duration::from_secs(30),
            fail_safe: Decision::Reject,
            resolved_retention: Duration::from_secs(600),
        }
    }
}

/// Notified whenever a new decision request is created.
///
/// Called on the requesting (simulation) thread with no lock held; it must
/// not block for long.
pub trait DecisionListener: Send + Sync {
    fn on_request(&self, request: &DecisionRequest);
}

/// Owns the status store and decision table for one hosted kernel.
pub struct Dispatcher {
    statuses: StatusStore,
    decisions: DecisionTable,
    config: DispatchConfig,
    listener: Option<Arc<dyn DecisionListener>>,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            statuses: StatusStore::new(),
            decisions: DecisionTable::new(),
            config,
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn DecisionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn statuses(&self) -> &StatusStore {
        &self.statuses
    }

    pub fn decisions(&self) -> &DecisionTable {
        &self.decisions
    }

    pub fn update_device_status(
        &self,
        device_id: impl Into<String>,
        values: Map<String, Value>,
    ) -> DeviceStatus {
        self.statuses.update_device_status(device_id, values)
    }

    pub fn get_all_statuses(&self) -> BTreeMap<String, DeviceStatus> {
        self.statuses.get_all_statuses()
    }

    pub fn submit_decision(&self, request_id: &str, decision: Decision) -> DispatchResult<SubmitAck> {
        self.decisions.submit_decision(request_id, decision)
    }

    pub fn pending_decisions(&self) -> Vec<DecisionRequest> {
        self.decisions.pending()
    }

    pub fn decision_state(&self, request_id: &str) -> Option<DecisionState> {
        self.decisions.state_of(request_id)
    }

    /// Drop resolved requests older than the configured retention.
    pub fn prune_resolved(&self) -> usize {
        let pruned = self.decisions.prune_resolved(self.config.resolved_retention);
        if pruned > 0 {
            tracing::debug!(pruned, remaining = self.decisions.len(), "pruned resolved decisions");
        }
        pruned
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("statuses", &self.statuses)
            .field("decisions", &self.decisions)
            .field("config", &self.config)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl Dispatcher {
    /// Issue a decision request with settings other than the dispatcher's
    /// own, e.g. per-run timeouts taken from a simulation config.
    pub fn request_with(
        &self,
        agent_id: &AgentId,
        payload: Value,
        config: DispatchConfig,
    ) -> DecisionOutcome {
        self.prune_resolved();
        let (request, pending) = self
            .decisions
            .request_decision(Some(agent_id.clone()), payload);
        tracing::info!(
            request_id = %request.request_id,
            agent = %agent_id,
            "decision requested"
        );
        if let Some(listener) = &self.listener {
            listener.on_request(&request);
        }
        pending.wait(config.decision_timeout, config.fail_safe)
    }
}

impl DecisionGate for Dispatcher {
    fn request(&self, agent_id: &AgentId, payload: Value) -> DecisionOutcome {
        self.request_with(agent_id, payload, self.config)
    }
}
