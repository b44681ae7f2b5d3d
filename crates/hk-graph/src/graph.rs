//! Core topology data structures.

use std::collections::HashMap;
use std::fmt;

use hk_components::Steppable;
use hk_core::{AgentId, AttrRef};
use serde::{Deserialize, Serialize};

/// When a connection's source value becomes visible to its target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    /// Value computed earlier in the same tick (source must run first).
    #[default]
    SameTick,
    /// Value from the end of the previous tick. Breaks algebraic loops.
    PreviousTick,
}

/// Directed edge `source.attr -> target.attr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub source: AttrRef,
    pub target: AttrRef,
    pub feed: Feed,
}

/// One connected input of an agent, resolved to arena indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBinding {
    /// Input attribute name on the target agent.
    pub input: String,
    /// Arena index of the source agent.
    pub source: usize,
    pub source_attr: String,
    pub feed: Feed,
}

/// An instantiated agent in the arena.
pub struct AgentSlot {
    pub id: AgentId,
    pub type_tag: String,
    pub agent: Box<dyn Steppable>,
}

impl fmt::Debug for AgentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSlot")
            .field("id", &self.id)
            .field("type_tag", &self.type_tag)
            .finish_non_exhaustive()
    }
}

/// Ordered stages of arena indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOrder {
    stages: Vec<Vec<usize>>,
}

impl ExecutionOrder {
    pub(crate) fn new(stages: Vec<Vec<usize>>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Vec<usize>] {
        &self.stages
    }

    /// Flattened execution sequence.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.stages.iter().flatten().copied()
    }

    /// `(stage, slot)` of every arena index.
    pub fn positions(&self, agent_count: usize) -> Vec<Option<(usize, usize)>> {
        let mut positions = vec![None; agent_count];
        for (stage, members) in self.stages.iter().enumerate() {
            for (slot, &idx) in members.iter().enumerate() {
                if let Some(pos) = positions.get_mut(idx) {
                    *pos = Some((stage, slot));
                }
            }
        }
        positions
    }
}

/// A validated, instantiated component graph.
///
/// Agents live in a `Vec` arena in declaration order; connections are a
/// separate edge list. Per-agent input bindings are precomputed so the
/// scheduler never searches the edge list during a tick.
#[derive(Debug)]
pub struct Topology {
    pub(crate) agents: Vec<AgentSlot>,
    pub(crate) index: HashMap<AgentId, usize>,
    pub(crate) connections: Vec<Connection>,
    pub(crate) bindings: Vec<Vec<InputBinding>>,
    pub(crate) order: ExecutionOrder,
}

impl Topology {
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> &[AgentSlot] {
        &self.agents
    }

    pub fn agent(&self, idx: usize) -> Option<&AgentSlot> {
        self.agents.get(idx)
    }

    pub fn agent_mut(&mut self, idx: usize) -> Option<&mut AgentSlot> {
        self.agents.get_mut(idx)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Connected inputs of the agent at `idx`, in connection declaration order.
    pub fn bindings(&self, idx: usize) -> &[InputBinding] {
        self.bindings.get(idx).map_or(&[], Vec::as_slice)
    }

    pub fn order(&self) -> &ExecutionOrder {
        &self.order
    }

    /// Execution stages as agent ids.
    pub fn stage_ids(&self) -> Vec<Vec<&AgentId>> {
        self.order
            .stages()
            .iter()
            .map(|stage| stage.iter().map(|&idx| &self.agents[idx].id).collect())
            .collect()
    }
}
