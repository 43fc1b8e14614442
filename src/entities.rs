//! Data model shared across the session orchestrator, the agent pipeline, and the
//! wire-facing `GameState` projection.
//!
//! Types here are intentionally thin: the Rules Engine (an external collaborator, see
//! [`crate::rules_engine`]) owns the authoritative game truth. Everything in this module
//! is either a value type handed across that seam (`Card`, `Action`) or a cached
//! projection of engine truth meant for serialization to subscribers (`GameState`,
//! `SeatView`, `PotView`).

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 0-based, dense seat identifier.
pub type SeatId = usize;

/// Whole-chip amount. Poker chips don't have fractional cents worth arguing over.
pub type Chips = u32;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Clubs => "♣",
            Self::Diamonds => "♦",
            Self::Hearts => "♥",
            Self::Spades => "♠",
        };
        write!(f, "{repr}")
    }
}

/// Rank 2..=9, then T/J/Q/K/A. Ordered low to high.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
            Self::Six => "6",
            Self::Seven => "7",
            Self::Eight => "8",
            Self::Nine => "9",
            Self::Ten => "T",
            Self::Jack => "J",
            Self::Queen => "Q",
            Self::King => "K",
            Self::Ace => "A",
        };
        write!(f, "{repr}")
    }
}

/// A single card. `id` is the numeric identifier handed to the Rules Engine
/// (`rank_index * 4 + suit_index`, 0..52); `rank`/`suit` are the display pair.
/// Immutable by construction — there is no mutating method on this type.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
    pub id: u8,
}

impl Card {
    #[must_use]
    pub fn new(rank: Rank, suit: Suit) -> Self {
        let id = rank as u8 * 4 + suit as u8;
        Self { rank, suit, id }
    }

    /// Reconstruct a card from its Rules Engine numeric identifier.
    #[must_use]
    pub fn from_id(id: u8) -> Self {
        const SUITS: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];
        const RANKS: [Rank; 13] = [
            Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six, Rank::Seven,
            Rank::Eight, Rank::Nine, Rank::Ten, Rank::Jack, Rank::Queen, Rank::King, Rank::Ace,
        ];
        let rank = RANKS[(id / 4) as usize];
        let suit = SUITS[(id % 4) as usize];
        Self { rank, suit, id }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// Cached projection of Rules Engine truth for a seat. Updated from a fresh
/// [`crate::rules_engine::RulesEngine`] read after every applied action.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SeatStatus {
    In,
    ToCall,
    AllIn,
    Folded,
    Skip,
}

/// How a seat's decisions are produced. Determines dispatch in the turn loop:
/// exactly one of the rule-based, LLM, or human decision sources runs for a given
/// seat, chosen solely by this tag.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentKind {
    Human,
    Rule { name: String },
    Llm { model_id: String, personality: String },
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::Rule { name } => write!(f, "rule:{name}"),
            Self::Llm { model_id, personality } => write!(f, "llm:{model_id}/{personality}"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Seat {
    pub player_id: SeatId,
    pub agent_kind: AgentKind,
    pub display_name: String,
    pub chips: Chips,
    pub status: SeatStatus,
}

/// Two hole cards. Visibility to a given observer is computed by
/// [`HoleCards::visible_to`], never baked into the struct itself.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct HoleCards(pub [Card; 2]);

impl HoleCards {
    /// Visible when `debug_mode`, or the observer owns the seat, or the hand has
    /// reached showdown.
    #[must_use]
    pub fn visible_to(owner: SeatId, observer: Option<SeatId>, debug_mode: bool, showdown: bool) -> bool {
        debug_mode || showdown || observer == Some(owner)
    }
}

/// One of possibly several simultaneous pots (side pots form when an all-in
/// forces a split). `eligible` holds the seats entitled to win this pot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PotView {
    pub pot_id: usize,
    pub total: Chips,
    pub eligible: BTreeSet<SeatId>,
}

/// A proposed or applied player action. `Raise`'s `amount` is always the new total
/// bet for the current street, never a delta.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Fold,
    Check,
    Call,
    Raise { amount: Chips },
}

impl Action {
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Fold => ActionKind::Fold,
            Self::Check => ActionKind::Check,
            Self::Call => ActionKind::Call,
            Self::Raise { .. } => ActionKind::Raise,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fold => write!(f, "folds"),
            Self::Check => write!(f, "checks"),
            Self::Call => write!(f, "calls"),
            Self::Raise { amount } => write!(f, "raises to ${amount}"),
        }
    }
}

/// Action tag without a payload — what `get_available_moves()` reports as legal.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Raise,
}

/// Betting-phase lifecycle, advanced street by street within a hand.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    PreHand,
    PreFlop,
    Flop,
    Turn,
    River,
    Settle,
}

impl Phase {
    #[must_use]
    pub fn is_betting_phase(self) -> bool {
        matches!(self, Self::PreFlop | Self::Flop | Self::Turn | Self::River)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Waiting,
    Running,
    Paused,
    Completed,
    Error,
}

/// One entry in a seat's per-hand action history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerActionRecord {
    pub player_id: SeatId,
    pub phase: Phase,
    pub action_kind: ActionKind,
    pub amount: Option<Chips>,
    pub reasoning: Option<String>,
    pub confidence: Option<f32>,
    pub pot_before: Chips,
    pub chips_remaining_after: Chips,
}

/// Ordered list of one seat's own applied actions during the current hand, read by
/// the prompt builder for that seat's LLM decisions. Created empty at `PreHand`,
/// discarded at `Settle`.
pub type HandMemory = Vec<PlayerActionRecord>;

/// The legal action set and, when `Raise` is legal, the concrete `[min_total,
/// max_total]` range — always sourced from `get_available_moves()`, never from the
/// advisory `min_raise()`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AvailableMoves {
    pub legal: Vec<ActionKind>,
    pub raise_range: Option<(Chips, Chips)>,
}

impl AvailableMoves {
    #[must_use]
    pub fn contains(&self, kind: ActionKind) -> bool {
        self.legal.contains(&kind)
    }
}

/// The wire-facing snapshot of one session, as returned by `get_state` and carried
/// in `StateUpdate` events.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    pub game_id: uuid::Uuid,
    /// Monotonically increasing per-session counter, bumped on every applied action.
    /// Lets a subscriber detect whether a `StateUpdate` it received is stale relative
    /// to one it already has, even across a dropped/evicted event.
    pub revision: u64,
    pub status: SessionStatus,
    pub phase: Phase,
    pub hand_number: u32,
    pub max_hands: u32,
    pub board: Vec<Card>,
    pub seats: Vec<Seat>,
    pub pots: Vec<PotView>,
    pub current_player: Option<SeatId>,
    pub available_actions: Vec<ActionKind>,
    pub min_raise_amount: Option<Chips>,
    pub debug_mode: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry of the `list_agents` catalogue: a decision source a seat can be
/// configured with at session-creation time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentCatalogEntry {
    pub agent_id: String,
    pub kind: String,
    pub description: String,
    pub available: bool,
}

/// Per-seat counters on the decision pipeline: how many hands this seat has acted
/// in, how many of its proposed actions the validator had to clamp or fall back,
/// and how many turns timed out (human silence or an LLM call that didn't return in
/// time). A read-only snapshot, not persisted past the session's lifetime.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct AgentTelemetry {
    pub hands_acted: u32,
    pub fallbacks_triggered: u32,
    pub timeouts: u32,
}

/// One entry of `final_rankings`, frozen once `status == Completed`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RankingEntry {
    pub player_id: SeatId,
    pub display_name: String,
    pub chips: Chips,
}

/// Sort seats by chips descending, tie-broken by `player_id` ascending.
#[must_use]
pub fn rank_seats(seats: &[Seat]) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = seats
        .iter()
        .map(|s| RankingEntry {
            player_id: s.player_id,
            display_name: s.display_name.clone(),
            chips: s.chips,
        })
        .collect();
    entries.sort_by(|a, b| b.chips.cmp(&a.chips).then(a.player_id.cmp(&b.player_id)));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_id_roundtrips() {
        let card = Card::new(Rank::Queen, Suit::Hearts);
        assert_eq!(Card::from_id(card.id), card);
    }

    #[test]
    fn ranking_breaks_ties_by_player_id() {
        let seats = vec![
            Seat { player_id: 2, agent_kind: AgentKind::Human, display_name: "c".into(), chips: 500, status: SeatStatus::In },
            Seat { player_id: 0, agent_kind: AgentKind::Human, display_name: "a".into(), chips: 500, status: SeatStatus::In },
            Seat { player_id: 1, agent_kind: AgentKind::Human, display_name: "b".into(), chips: 900, status: SeatStatus::In },
        ];
        let ranked = rank_seats(&seats);
        assert_eq!(ranked[0].player_id, 1);
        assert_eq!(ranked[1].player_id, 0);
        assert_eq!(ranked[2].player_id, 2);
    }
}
