//! # holdem_sessions
//!
//! Session orchestration and agent decision pipeline for a multi-table Texas Hold'em
//! server. This crate owns the lifecycle of one running hand at a time per session —
//! turn dispatch, phantom-chip bookkeeping correction, prompt construction for LLM
//! seats, rule-based opponent personalities, and the human-input mailbox — and drives
//! all of it against an external [`rules_engine::RulesEngine`] collaborator rather
//! than implementing Texas Hold'em itself.
//!
//! Explicitly out of scope (consumed as external collaborators instead): the rules
//! engine and hand evaluator (`rules_engine`), the LLM gateway (`agents::llm::LlmGateway`),
//! transport, authentication, and persistence.
//!
//! ## Module map
//!
//! - [`entities`] — shared data model and the wire-facing `GameState` projection
//! - [`error`] — typed errors at each component boundary
//! - [`config`] — session configuration and validation
//! - [`rules_engine`] — the Rules Engine contract, plus a reference/test implementation
//! - [`phantom`] — phantom-chip correction (C1)
//! - [`analyzer`] — hand strength / pot odds / position helpers (C2)
//! - [`validator`] — action legality clamp and fallback ladder (C6)
//! - [`agents`] — prompt building (C3), the LLM pipeline (C4), rule-based personalities
//!   (C5), and the human input bridge (C7)
//! - [`session`] — the orchestrator (C8), registry (C9), and event bus (C10)

pub mod agents;
pub mod analyzer;
pub mod config;
pub mod entities;
pub mod error;
pub mod phantom;
pub mod rules_engine;
pub mod session;
pub mod validator;

pub use config::{AgentSpec, CreateGameConfig};
pub use entities::{Action, ActionKind, AgentCatalogEntry, AgentTelemetry, GameState, Phase, SessionStatus};
pub use error::{AgentError, CoreError, EngineError};
pub use session::{list_agents, Session, SessionRegistry};
