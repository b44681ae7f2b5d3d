//! Incremental topology builder.

use std::collections::HashMap;

use hk_components::{ComponentRegistry, Properties};
use hk_core::{AgentId, AttrRef};

use crate::error::{ConfigError, CyclicDependencyError, GraphResult};
use crate::graph::{AgentSlot, Connection, ExecutionOrder, Feed, Topology};
use crate::order::layered_order;
use crate::validate;

/// One entry of an explicit execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderEntry {
    /// A stage holding a single agent.
    Single(AgentId),
    /// A stage holding several agents, run in the listed order.
    Stage(Vec<AgentId>),
}

#[derive(Debug, Clone)]
struct ComponentDecl {
    id: AgentId,
    type_tag: String,
    properties: Properties,
}

/// Builder for constructing a topology incrementally.
///
/// Declare components and connections, optionally an explicit order, then
/// call `build()` to instantiate every agent through the registry and freeze
/// the result into an immutable [`Topology`].
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    components: Vec<ComponentDecl>,
    connections: Vec<Connection>,
    order: Option<Vec<OrderEntry>>,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a component. Declaration order is significant: it breaks ties
    /// within a derived stage.
    pub fn add_component(
        &mut self,
        id: impl Into<AgentId>,
        type_tag: impl Into<String>,
        properties: Properties,
    ) -> &mut Self {
        self.components.push(ComponentDecl {
            id: id.into(),
            type_tag: type_tag.into(),
            properties,
        });
        self
    }

    pub fn connect(&mut self, source: AttrRef, target: AttrRef, feed: Feed) -> &mut Self {
        self.connections.push(Connection {
            source,
            target,
            feed,
        });
        self
    }

    /// Use an explicit execution order instead of deriving one.
    pub fn execution_order(&mut self, entries: Vec<OrderEntry>) -> &mut Self {
        self.order = Some(entries);
        self
    }

    /// Instantiate, validate and order.
    pub fn build(self, registry: &ComponentRegistry) -> GraphResult<Topology> {
        let mut agents = Vec::with_capacity(self.components.len());
        let mut index = HashMap::with_capacity(self.components.len());

        for decl in self.components {
            decl.id.validate().map_err(ConfigError::from)?;
            if index.contains_key(&decl.id) {
                return Err(ConfigError::DuplicateAgent { id: decl.id }.into());
            }
            let agent = registry.create(&decl.type_tag, &decl.id, &decl.properties)?;
            index.insert(decl.id.clone(), agents.len());
            agents.push(AgentSlot {
                id: decl.id,
                type_tag: decl.type_tag,
                agent,
            });
        }

        let bindings = validate::resolve_connections(&agents, &index, &self.connections)?;

        let same_tick_edges: Vec<(usize, usize)> = bindings
            .iter()
            .enumerate()
            .flat_map(|(target, inputs)| {
                inputs
                    .iter()
                    .filter(|b| b.feed == Feed::SameTick)
                    .map(move |b| (b.source, target))
            })
            .collect();

        let derived = layered_order(agents.len(), &same_tick_edges).map_err(|unplaced| {
            CyclicDependencyError {
                agents: unplaced.iter().map(|&idx| agents[idx].id.clone()).collect(),
            }
        })?;

        let order = match self.order {
            Some(entries) => {
                let order = resolve_entries(&index, entries)?;
                validate::validate_explicit_order(&agents, &order, &bindings)?;
                order
            }
            None => ExecutionOrder::new(derived),
        };

        tracing::debug!(
            agents = agents.len(),
            connections = self.connections.len(),
            stages = order.stages().len(),
            "topology built"
        );

        Ok(Topology {
            agents,
            index,
            connections: self.connections,
            bindings,
            order,
        })
    }
}

fn resolve_entries(
    index: &HashMap<AgentId, usize>,
    entries: Vec<OrderEntry>,
) -> Result<ExecutionOrder, ConfigError> {
    let lookup = |id: AgentId| {
        index
            .get(&id)
            .copied()
            .ok_or(ConfigError::OrderUnknownAgent { id })
    };
    let stages = entries
        .into_iter()
        .map(|entry| -> Result<Vec<usize>, ConfigError> {
            match entry {
                OrderEntry::Single(id) => Ok(vec![lookup(id)?]),
                OrderEntry::Stage(ids) => ids.into_iter().map(lookup).collect(),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ExecutionOrder::new(stages))
}
