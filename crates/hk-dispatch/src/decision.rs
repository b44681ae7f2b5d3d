//! Decision request/response correlation.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use hk_components::{Decision, DecisionOutcome, Resolution};
use hk_core::AgentId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{DecisionCorrelationError, DispatchResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionState {
    Pending,
    Fulfilled,
    Expired,
}

/// Public view of one decision request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    pub payload: Value,
    pub state: DecisionState,
    pub created_at: DateTime<Utc>,
    /// When the request was fulfilled or expired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// How an accepted submission was treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitAck {
    /// Delivered to the waiting flow.
    Accepted,
    /// Request was already fulfilled; this response was ignored.
    Duplicate,
}

struct Entry {
    request: DecisionRequest,
    sender: Option<SyncSender<Decision>>,
}

type Entries = Arc<Mutex<HashMap<String, Entry>>>;

fn lock(entries: &Entries) -> MutexGuard<'_, HashMap<String, Entry>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Table of decision requests keyed by request id.
///
/// Clones share the same table.
#[derive(Clone, Default)]
pub struct DecisionTable {
    entries: Entries,
}

impl DecisionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending request and return the handle to wait on it.
    pub fn request_decision(
        &self,
        agent_id: Option<AgentId>,
        payload: Value,
    ) -> (DecisionRequest, PendingDecision) {
        let (sender, receiver) = mpsc::sync_channel(1);
        let request = DecisionRequest {
            request_id: Uuid::new_v4().to_string(),
            agent_id,
            payload,
            state: DecisionState::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        };
        lock(&self.entries).insert(
            request.request_id.clone(),
            Entry {
                request: request.clone(),
                sender: Some(sender),
            },
        );
        let pending = PendingDecision {
            request_id: request.request_id.clone(),
            receiver,
            entries: Arc::clone(&self.entries),
        };
        (request, pending)
    }

    /// Deliver `decision` to the request `request_id`.
    pub fn submit_decision(
        &self,
        request_id: &str,
        decision: Decision,
    ) -> DispatchResult<SubmitAck> {
        let mut entries = lock(&self.entries);
        let Some(entry) = entries.get_mut(request_id) else {
            tracing::warn!(request_id, "decision for unknown request");
            return Err(DecisionCorrelationError::UnknownRequest {
                request_id: request_id.to_string(),
            });
        };

        match entry.request.state {
            DecisionState::Expired => {
                tracing::warn!(request_id, "decision arrived after expiry");
                Err(DecisionCorrelationError::Expired {
                    request_id: request_id.to_string(),
                })
            }
            DecisionState::Fulfilled => {
                tracing::debug!(request_id, "duplicate decision ignored");
                Ok(SubmitAck::Duplicate)
            }
            DecisionState::Pending => {
                entry.request.state = DecisionState::Fulfilled;
                entry.request.resolved_at = Some(Utc::now());
                if let Some(sender) = entry.sender.take() {
                    match sender.try_send(decision) {
                        Ok(()) => {}
                        Err(TrySendError::Disconnected(_)) => {
                            tracing::debug!(request_id, "waiter already gone");
                        }
                        Err(TrySendError::Full(_)) => {
                            tracing::warn!(request_id, "decision channel unexpectedly full");
                        }
                    }
                }
                Ok(SubmitAck::Accepted)
            }
        }
    }

    pub fn get(&self, request_id: &str) -> Option<DecisionRequest> {
        lock(&self.entries)
            .get(request_id)
            .map(|entry| entry.request.clone())
    }

    pub fn state_of(&self, request_id: &str) -> Option<DecisionState> {
        lock(&self.entries)
            .get(request_id)
            .map(|entry| entry.request.state)
    }

    /// Pending requests, oldest first.
    pub fn pending(&self) -> Vec<DecisionRequest> {
        let mut pending: Vec<DecisionRequest> = lock(&self.entries)
            .values()
            .filter(|entry| entry.request.state == DecisionState::Pending)
            .map(|entry| entry.request.clone())
            .collect();
        pending.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.request_id.cmp(&b.request_id))
        });
        pending
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Forget requests resolved more than `retention` ago. Returns how many
    /// were dropped. Pending requests are never pruned.
    ///
    /// A pruned request id is unknown to later submissions.
    pub fn prune_resolved(&self, retention: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(retention)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            return 0;
        };
        let mut entries = lock(&self.entries);
        let before = entries.len();
        entries.retain(|_, entry| match entry.request.resolved_at {
            Some(resolved_at) => resolved_at > cutoff,
            None => true,
        });
        before - entries.len()
    }
}

impl std::fmt::Debug for DecisionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionTable")
            .field("len", &self.len())
            .finish()
    }
}

/// Waiting half of one decision request.
pub struct PendingDecision {
    request_id: String,
    receiver: Receiver<Decision>,
    entries: Entries,
}

impl PendingDecision {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Block until the decision arrives or `timeout` elapses.
    ///
    /// On timeout the request becomes `Expired` and the outcome carries
    /// `fail_safe`.
    pub fn wait(self, timeout: Duration, fail_safe: Decision) -> DecisionOutcome {
        match self.receiver.recv_timeout(timeout) {
            Ok(decision) => return self.fulfilled(decision),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {}
        }

        let late = {
            let mut entries = lock(&self.entries);
            match entries.get_mut(&self.request_id) {
                Some(entry) if entry.request.state == DecisionState::Pending => {
                    entry.request.state = DecisionState::Expired;
                    entry.request.resolved_at = Some(Utc::now());
                    entry.sender = None;
                    None
                }
                // Fulfilled between the timeout and taking the lock.
                Some(_) => self.receiver.try_recv().ok(),
                None => None,
            }
        };
        if let Some(decision) = late {
            return self.fulfilled(decision);
        }

        tracing::warn!(
            request_id = %self.request_id,
            ?fail_safe,
            "decision request expired; applying fail-safe"
        );
        DecisionOutcome {
            request_id: self.request_id,
            decision: fail_safe,
            resolution: Resolution::Expired,
        }
    }

    fn fulfilled(self, decision: Decision) -> DecisionOutcome {
        DecisionOutcome {
            request_id: self.request_id,
            decision,
            resolution: Resolution::Fulfilled,
        }
    }
}
