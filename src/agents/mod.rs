//! Agent pipeline (C3–C5, C7): everything that turns "seat N has a decision pending"
//! into a concrete [`crate::entities::Action`]. Dispatch between the three decision
//! sources is solely by [`crate::entities::AgentKind`] — exactly one of the rule-based,
//! LLM, or human decision sources ever runs for a given decision.
//!
//! Uses the `#[enum_dispatch]` trait-per-variant idiom, applied here to rule-based
//! personalities instead of state-machine states.

pub mod human;
pub mod llm;
pub mod prompt;
pub mod rule_based;

use rand::rngs::SmallRng;

use crate::analyzer::HandAnalysis;
use crate::entities::{Action, AvailableMoves, Chips, HandMemory, SeatId};
use rule_based::{
    AggressiveRandomAgent, BluffAgent, CallStation, LooseAgent, PassiveAgent,
    PositionAwareAgent, RandomAgent, RulePersonality, TightAgent,
};

/// Everything a decision source needs to know about the current turn. Built fresh by
/// the orchestrator from a Rules Engine snapshot plus the analyzer (C2) before every
/// dispatch.
#[derive(Clone, Debug)]
pub struct DecisionContext {
    pub seat: SeatId,
    pub hand_number: u32,
    pub board: Vec<crate::entities::Card>,
    pub hole_cards: Option<[crate::entities::Card; 2]>,
    pub pot_total: Chips,
    pub analysis: HandAnalysis,
    pub moves: AvailableMoves,
    pub memory: HandMemory,
}

/// The result of a decision, independent of which source produced it. `reasoning`
/// and `confidence` are only ever populated by the LLM decision pipeline; rule-based
/// and human decisions leave them `None`.
#[derive(Clone, Debug)]
pub struct Decision {
    pub action: Action,
    pub reasoning: Option<String>,
    pub confidence: Option<f32>,
}

impl Decision {
    #[must_use]
    pub fn plain(action: Action) -> Self {
        Self { action, reasoning: None, confidence: None }
    }
}

/// C5's dispatch seam: every rule-based personality implements this over a shared
/// `&mut SmallRng` so decisions stay replayable from the session's seed.
#[enum_dispatch::enum_dispatch]
pub trait RuleAgent {
    fn decide(&self, ctx: &DecisionContext, rng: &mut SmallRng) -> Action;
}
