//! hk-graph: topology layer for hydrokernel.
//!
//! Provides:
//! - Agent arena and connection edge list (`Topology`)
//! - Builder that instantiates agents through the registry and validates wiring
//! - Staged execution order, derived (layered topological sort) or explicit
//!
//! # Example
//!
//! ```
//! use hk_components::{ComponentRegistry, Properties};
//! use hk_core::AttrRef;
//! use hk_graph::{Feed, TopologyBuilder};
//!
//! let registry = ComponentRegistry::with_builtins();
//! let mut builder = TopologyBuilder::new();
//! let value = serde_json::json!({"value": 5.0});
//! builder.add_component("A", "constant", value.as_object().cloned().unwrap());
//! builder.add_component("B", "gain", Properties::new());
//! builder.connect(
//!     AttrRef::new("A", "output"),
//!     AttrRef::new("B", "input"),
//!     Feed::SameTick,
//! );
//! let topology = builder.build(&registry).unwrap();
//!
//! assert_eq!(topology.len(), 2);
//! assert_eq!(topology.order().stages().len(), 2);
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub(crate) mod order;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::{OrderEntry, TopologyBuilder};
pub use error::{ConfigError, CyclicDependencyError, GraphError, GraphResult};
pub use graph::{AgentSlot, Connection, ExecutionOrder, Feed, InputBinding, Topology};
