//! Session orchestration (C8), the event bus (C10), and the session registry (C9) —
//! the layer that turns a configured game into a running, observable, multiplexed
//! set of Texas Hold'em tables.

pub mod event_bus;
pub mod orchestrator;
pub mod registry;

pub use orchestrator::{list_agents, Session};
pub use registry::SessionRegistry;
