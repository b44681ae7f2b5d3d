//! Topology validation logic.

use std::collections::{HashMap, HashSet};

use hk_core::AgentId;

use crate::error::ConfigError;
use crate::graph::{AgentSlot, Connection, ExecutionOrder, Feed, InputBinding};

/// Check connection endpoints against agent ports and resolve them into
/// per-target input bindings.
pub(crate) fn resolve_connections(
    agents: &[AgentSlot],
    index: &HashMap<AgentId, usize>,
    connections: &[Connection],
) -> Result<Vec<Vec<InputBinding>>, ConfigError> {
    let lookup = |id: &AgentId, reference: &dyn std::fmt::Display| {
        index
            .get(id)
            .copied()
            .ok_or_else(|| ConfigError::UnknownAgent {
                id: id.clone(),
                reference: reference.to_string(),
            })
    };

    let mut bindings: Vec<Vec<InputBinding>> = vec![Vec::new(); agents.len()];
    let mut driven: HashSet<(usize, &str)> = HashSet::new();

    for conn in connections {
        let source = lookup(&conn.source.agent, &conn.source)?;
        let target = lookup(&conn.target.agent, &conn.target)?;

        if !agents[source].agent.ports().has_output(&conn.source.attr) {
            return Err(ConfigError::UnknownOutput {
                agent: conn.source.agent.clone(),
                reference: conn.source.to_string(),
            });
        }
        if !agents[target].agent.ports().has_input(&conn.target.attr) {
            return Err(ConfigError::UnknownInput {
                agent: conn.target.agent.clone(),
                reference: conn.target.to_string(),
            });
        }
        if !driven.insert((target, conn.target.attr.as_str())) {
            return Err(ConfigError::InputAlreadyDriven {
                target: conn.target.to_string(),
            });
        }

        bindings[target].push(InputBinding {
            input: conn.target.attr.clone(),
            source,
            source_attr: conn.source.attr.clone(),
            feed: conn.feed,
        });
    }

    Ok(bindings)
}

/// Check an explicit execution order: every agent exactly once, no empty
/// stage, and every same-tick source placed before its target.
pub(crate) fn validate_explicit_order(
    agents: &[AgentSlot],
    order: &ExecutionOrder,
    bindings: &[Vec<InputBinding>],
) -> Result<(), ConfigError> {
    if order.stages().iter().any(Vec::is_empty) {
        return Err(ConfigError::EmptyStage);
    }

    let mut seen = vec![false; agents.len()];
    for idx in order.iter() {
        if std::mem::replace(&mut seen[idx], true) {
            return Err(ConfigError::OrderDuplicate {
                id: agents[idx].id.clone(),
            });
        }
    }
    if let Some(missing) = seen.iter().position(|&s| !s) {
        return Err(ConfigError::OrderMissing {
            id: agents[missing].id.clone(),
        });
    }

    let positions = order.positions(agents.len());
    for (target, inputs) in bindings.iter().enumerate() {
        for binding in inputs.iter().filter(|b| b.feed == Feed::SameTick) {
            if positions[binding.source] >= positions[target] {
                return Err(ConfigError::OrderViolation {
                    upstream: format!("{}.{}", agents[binding.source].id, binding.source_attr),
                    downstream: format!("{}.{}", agents[target].id, binding.input),
                });
            }
        }
    }

    Ok(())
}
