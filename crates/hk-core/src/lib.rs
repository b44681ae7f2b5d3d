//! hk-core: stable foundation for hydrokernel.
//!
//! Contains:
//! - ids (agent ids and `"agent.attr"` references)
//! - clock (fixed-step simulation clock)
//! - error (shared error types)

pub mod clock;
pub mod error;
pub mod ids;

// Re-exports: nice ergonomics for downstream crates
pub use clock::SimClock;
pub use error::{KernelError, KernelResult};
pub use ids::{AgentId, AttrRef};
