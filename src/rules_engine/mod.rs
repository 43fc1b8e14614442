//! The Rules Engine contract — the orchestrator's external collaborator for card
//! dealing, betting legality, pot construction, and showdown evaluation. None of
//! that is implemented here: this module only defines the trait the orchestrator
//! (`crate::session`), the validator (`crate::validator`), and the hand analyzer
//! (`crate::analyzer`) are written against, plus a small reference/test implementation
//! (`simple`) used by this crate's own test suite.

pub mod simple;

use crate::entities::{Action, AvailableMoves, Card, Chips, Phase, SeatId, SeatStatus};
use crate::error::EngineError;

/// One pot as reported by `pots()`, as a named struct rather than a tuple for
/// readability at call sites.
#[derive(Clone, Debug)]
pub struct PotSnapshot {
    pub pot_id: usize,
    pub total: Chips,
    pub eligible: Vec<SeatId>,
}

/// The abstract game object the session orchestrator drives. A real implementation
/// wraps a full Texas Hold'em rules engine (dealing, betting legality, pot
/// construction) and a 7-card hand evaluator — both live in a separate collaborator
/// crate, not here.
///
/// All methods here are synchronous: every Rules Engine call is treated as
/// non-blocking CPU work, never a suspension point.
pub trait RulesEngine: std::fmt::Debug + Send {
    /// True while the table is solvent (two or more seats still hold chips).
    fn is_game_running(&self) -> bool;

    /// True during `PreFlop..River`.
    fn is_hand_running(&self) -> bool;

    /// Deals hole cards, posts blinds, advances to `PreFlop`.
    fn start_hand(&mut self) -> Result<(), EngineError>;

    /// Seat id with a decision pending; defined only during betting phases.
    fn current_player(&self) -> Option<SeatId>;

    fn hand_phase(&self) -> Phase;

    /// 1-based count of hands started so far this session.
    fn hand_number(&self) -> u32;

    /// Ordered community cards dealt so far.
    fn board(&self) -> &[Card];

    /// Hole cards for a seat, if any have been dealt this hand.
    fn hand_of(&self, seat: SeatId) -> Option<[Card; 2]>;

    /// Non-negative amount the seat must add to call the current bet.
    fn chips_to_call(&self, seat: SeatId) -> Chips;

    /// Advisory only — known to diverge from the enforced raise range. Callers must
    /// use `get_available_moves()` for validation and for UI-facing `min_raise_amount`.
    fn min_raise(&self) -> Chips;

    /// The legal action set and, for `Raise`, the concrete `[min_total, max_total]`
    /// range, for the current decision.
    fn get_available_moves(&self) -> AvailableMoves;

    /// Whether `action` would be accepted for `seat` right now. Pure — does not
    /// mutate engine state.
    fn validate_move(&self, seat: SeatId, action: Action) -> bool;

    /// Applies `action` for `seat`. May advance `hand_phase()`.
    fn take_action(&mut self, seat: SeatId, action: Action) -> Result<(), EngineError>;

    /// All pots live right now (more than one only when an all-in has forced a side
    /// pot).
    fn pots(&self) -> Vec<PotSnapshot>;

    /// Zero every pot's total. Used exclusively by the phantom-chip correction (C1)
    /// after reconciling pot totals against chip deltas.
    fn zero_pots(&mut self);

    /// Dense seat count (includes empty seats the orchestrator has not filled).
    fn seat_count(&self) -> usize;

    fn seat_chips(&self, seat: SeatId) -> Chips;

    fn seat_status(&self, seat: SeatId) -> SeatStatus;

    /// Seat holding the dealer button this hand.
    fn button_seat(&self) -> SeatId;

    /// The order seats act in, starting from the seat immediately after the button,
    /// restricted to seats still in the hand. Used by [`crate::analyzer::position`].
    fn action_order(&self) -> Vec<SeatId>;

    /// Normalized 5-card-best rank percentile in `[0, 1]`, as reported by the Rules
    /// Engine's hand evaluator. The evaluator itself lives outside this crate; this
    /// is the seam through which its output is consumed.
    fn strength_percentile(&self, seat: SeatId) -> f32;

    /// True once the hand has reached showdown (used to gate hole-card visibility).
    fn at_showdown(&self) -> bool;
}
