//! Build-phase error types.

use hk_components::ComponentError;
use hk_core::{AgentId, KernelError};
use thiserror::Error;

/// Malformed topology: bad component declarations, dangling connections or
/// an unusable explicit execution order.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error("Duplicate agent id '{id}'")]
    DuplicateAgent { id: AgentId },

    #[error("Connection references unknown agent '{id}' ({reference})")]
    UnknownAgent { id: AgentId, reference: String },

    #[error("'{reference}' is not an output of agent '{agent}'")]
    UnknownOutput { agent: AgentId, reference: String },

    #[error("'{reference}' is not an input of agent '{agent}'")]
    UnknownInput { agent: AgentId, reference: String },

    #[error("Input '{target}' is driven by more than one connection")]
    InputAlreadyDriven { target: String },

    #[error("Execution order references unknown agent '{id}'")]
    OrderUnknownAgent { id: AgentId },

    #[error("Agent '{id}' appears more than once in the execution order")]
    OrderDuplicate { id: AgentId },

    #[error("Agent '{id}' is missing from the execution order")]
    OrderMissing { id: AgentId },

    #[error("Execution order contains an empty stage")]
    EmptyStage,

    #[error("Execution order runs '{downstream}' before its same-tick source '{upstream}'")]
    OrderViolation { upstream: String, downstream: String },
}

/// Same-tick connections form a loop that no ordering can satisfy.
///
/// `agents` lists every agent the layered sort could not place, in
/// declaration order.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Cyclic same-tick dependency among agents: {}", join_ids(.agents))]
pub struct CyclicDependencyError {
    pub agents: Vec<AgentId>,
}

fn join_ids(ids: &[AgentId]) -> String {
    ids.iter()
        .map(AgentId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Any failure of [`crate::TopologyBuilder::build`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cyclic(#[from] CyclicDependencyError),
}

impl GraphError {
    pub fn is_cyclic(&self) -> bool {
        matches!(self, GraphError::Cyclic(_))
    }
}

impl From<ComponentError> for GraphError {
    fn from(err: ComponentError) -> Self {
        GraphError::Config(err.into())
    }
}

pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyclic_error_names_agents() {
        let err = GraphError::from(CyclicDependencyError {
            agents: vec![AgentId::new("A"), AgentId::new("B")],
        });
        assert!(err.is_cyclic());
        assert_eq!(
            err.to_string(),
            "Cyclic same-tick dependency among agents: A, B"
        );
    }
}
