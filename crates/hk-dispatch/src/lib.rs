//! hk-dispatch: supervisory layer shared between the simulation thread and
//! network handlers.
//!
//! Provides:
//! - `StatusStore`: last-write-wins device status snapshots
//! - `DecisionTable`: correlation of decision requests and responses
//! - `Dispatcher`: context owning both, usable as a `DecisionGate`
//!
//! All shared state sits behind short `std::sync::Mutex` critical sections;
//! no lock is held while a decision is awaited.

pub mod decision;
pub mod dispatcher;
pub mod error;
pub mod status;

pub use decision::{DecisionRequest, DecisionState, DecisionTable, PendingDecision, SubmitAck};
pub use dispatcher::{DecisionListener, DispatchConfig, Dispatcher};
pub use error::{DecisionCorrelationError, DispatchResult};
pub use status::{DeviceStatus, StatusStore};
