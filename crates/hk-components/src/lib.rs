//! hk-components: the component capability and registry for hydrokernel.
//!
//! Every simulated component implements [`Steppable`]:
//! - constructed from an id + property map by a registered factory,
//! - stepped once per tick with its gathered [`Inputs`],
//! - read and written through named attributes.
//!
//! The stock components here are physics-free building blocks (sources,
//! gains, delays, fault injection, a supervised switch). Domain models plug
//! in through [`ComponentRegistry::register`].
//!
//! # Example
//!
//! ```
//! use hk_components::{ComponentRegistry, Inputs, StepContext};
//! use hk_core::AgentId;
//!
//! let registry = ComponentRegistry::with_builtins();
//! let id = AgentId::new("A");
//! let props = serde_json::json!({"value": 5.0});
//! let mut agent = registry
//!     .create("constant", &id, props.as_object().unwrap())
//!     .unwrap();
//! agent.step(&StepContext::new(&id, 0, 1.0), &Inputs::new()).unwrap();
//! assert_eq!(agent.attribute("output"), Some(5.0));
//! ```

pub mod accumulator;
pub(crate) mod common;
pub mod constant;
pub mod delay;
pub mod dummy;
pub mod error;
pub mod faulty;
pub mod gain;
pub mod gate;
pub mod lag;
pub mod properties;
pub mod registry;
pub mod series;
pub mod sum;
pub mod switch;
pub mod traits;

// Re-exports
pub use accumulator::Accumulator;
pub use constant::Constant;
pub use delay::Delay;
pub use dummy::Dummy;
pub use error::{ComponentError, ComponentResult, StepError, StepResult};
pub use faulty::{FaultMode, Faulty};
pub use gain::Gain;
pub use gate::{Decision, DecisionGate, DecisionOutcome, Resolution};
pub use lag::Lag;
pub use properties::{Properties, PropertyReader};
pub use registry::{ComponentFactory, ComponentRegistry};
pub use series::Series;
pub use sum::Sum;
pub use switch::SupervisedSwitch;
pub use traits::{Inputs, Ports, StepContext, Steppable};
