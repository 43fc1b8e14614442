//! Session configuration. `CreateGameConfig` validates itself once at
//! session-creation time rather than scattering checks through the orchestrator.

use serde::{Deserialize, Serialize};

use crate::entities::{AgentKind, Chips};
use crate::error::CoreError;

/// How a seat at session-creation time should be filled. Resolved into a concrete
/// [`AgentKind`] plus, for `Rule`, a personality lookup (`crate::agents::rule_based`)
/// once the session is built.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentSpec {
    Human { display_name: String },
    Rule { display_name: String, personality: String },
    Llm { display_name: String, model_id: String, personality: String },
}

impl AgentSpec {
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Human { display_name } | Self::Rule { display_name, .. } | Self::Llm { display_name, .. } => display_name,
        }
    }

    #[must_use]
    pub fn agent_kind(&self) -> AgentKind {
        match self {
            Self::Human { .. } => AgentKind::Human,
            Self::Rule { personality, .. } => AgentKind::Rule { name: personality.clone() },
            Self::Llm { model_id, personality, .. } => AgentKind::Llm { model_id: model_id.clone(), personality: personality.clone() },
        }
    }
}

/// What `create_game` takes. Validated once, at creation time, by
/// [`CreateGameConfig::validate`] — nothing downstream re-checks these invariants.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateGameConfig {
    pub seats: Vec<AgentSpec>,
    pub starting_chips: Chips,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub max_hands: u32,
    pub debug_mode: bool,
    pub human_turn_timeout_secs: u64,
    pub llm_turn_timeout_secs: u64,
    pub event_queue_capacity: usize,
    /// If every seat is non-human, the session starts `Running` immediately on
    /// creation instead of waiting for an initial external `advance()` call.
    pub auto_start: bool,
}

impl Default for CreateGameConfig {
    fn default() -> Self {
        Self {
            seats: Vec::new(),
            starting_chips: 1000,
            small_blind: 10,
            big_blind: 20,
            max_hands: 0,
            debug_mode: false,
            human_turn_timeout_secs: 30,
            llm_turn_timeout_secs: 20,
            event_queue_capacity: 64,
            auto_start: false,
        }
    }
}

impl CreateGameConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.seats.len() < 2 {
            return Err(CoreError::InvalidConfig("a game needs at least two seats".to_string()));
        }
        if self.seats.len() > 10 {
            return Err(CoreError::InvalidConfig("a game supports at most ten seats".to_string()));
        }
        if self.small_blind == 0 {
            return Err(CoreError::InvalidConfig("small blind must be positive".to_string()));
        }
        if self.big_blind <= self.small_blind {
            return Err(CoreError::InvalidConfig("big blind must exceed small blind".to_string()));
        }
        if self.starting_chips < self.big_blind * 2 {
            return Err(CoreError::InvalidConfig("starting chips must cover at least two big blinds".to_string()));
        }
        if self.human_turn_timeout_secs == 0 {
            return Err(CoreError::InvalidConfig("human turn timeout must be positive".to_string()));
        }
        if self.llm_turn_timeout_secs == 0 {
            return Err(CoreError::InvalidConfig("llm turn timeout must be positive".to_string()));
        }
        if self.event_queue_capacity == 0 {
            return Err(CoreError::InvalidConfig("event queue capacity must be positive".to_string()));
        }
        for spec in &self.seats {
            if let AgentSpec::Rule { personality, .. } = spec {
                if crate::agents::rule_based::by_name(personality).is_none() {
                    return Err(CoreError::InvalidConfig(format!("unknown rule personality \"{personality}\"")));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_humans() -> CreateGameConfig {
        CreateGameConfig {
            seats: vec![
                AgentSpec::Human { display_name: "alice".into() },
                AgentSpec::Human { display_name: "bob".into() },
            ],
            ..CreateGameConfig::default()
        }
    }

    #[test]
    fn default_two_seat_config_is_valid() {
        assert!(two_humans().validate().is_ok());
    }

    #[test]
    fn rejects_single_seat() {
        let mut cfg = two_humans();
        cfg.seats.truncate(1);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_big_blind_not_exceeding_small_blind() {
        let mut cfg = two_humans();
        cfg.big_blind = cfg.small_blind;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_unknown_rule_personality() {
        let mut cfg = two_humans();
        cfg.seats.push(AgentSpec::Rule { display_name: "bot".into(), personality: "not-a-real-one".into() });
        assert!(cfg.validate().is_err());
    }
}
