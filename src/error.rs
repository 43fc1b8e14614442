//! Typed errors at each component boundary, `thiserror`-derived throughout: no
//! stringly-typed errors cross a module seam.

use thiserror::Error;

use crate::entities::SeatId;

/// Errors surfaced at the core operation boundary. These are the only errors a
/// caller driving `get_state`/`propose_action`/`advance`/`end` ever observes.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum CoreError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("game not found")]
    GameNotFound,
    #[error("not your turn")]
    OutOfTurn,
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error("a hand is still running")]
    NotReady,
    #[error("session is terminal")]
    SessionTerminal,
    #[error("registry is at capacity")]
    Overloaded,
}

/// Errors reported by a [`crate::rules_engine::RulesEngine`] implementation.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum EngineError {
    #[error("no hand is currently running")]
    NoHandRunning,
    #[error("seat {0} is not the current player")]
    NotCurrentPlayer(SeatId),
    #[error("action is not legal for the current decision")]
    IllegalAction,
    #[error("fewer than two seats have chips remaining")]
    InsufficientPlayers,
}

/// Internal failure kinds that never cross the core operation boundary directly:
/// `AgentFailure` collapses into the C6 fallback ladder, bookkeeping defects are
/// handled entirely by C1.
#[derive(Debug, Error, Clone)]
pub enum AgentError {
    #[error("agent for seat {seat} failed: {cause}")]
    AgentFailure { seat: SeatId, cause: String },
    #[error("llm gateway timed out")]
    Timeout,
    /// The gateway doesn't support structured output for this model; C4 falls back
    /// to `complete_text` instead of treating this as a hard failure.
    #[error("llm gateway does not support structured output: {0}")]
    Unsupported(String),
    #[error("llm response failed schema validation: {0}")]
    SchemaValidation(String),
    #[error("llm text-mode response could not be parsed: {0}")]
    ParseFailure(String),
}
