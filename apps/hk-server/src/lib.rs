//! HTTP and WebSocket surface for a hosted hydrokernel.

pub mod api;
pub mod protocol;
pub mod state;

pub use api::create_router;
pub use state::{ServerState, run_decision_cleanup};
