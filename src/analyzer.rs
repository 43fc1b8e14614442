//! C2 — hand analyzer. Pure read-through helpers over a [`RulesEngine`] snapshot,
//! used by the prompt builder (C3) and the rule-based agents (C5). Nothing here
//! mutates engine state or holds state of its own between calls.
//!
//! Adapted from a single bot's private pot-odds and hand-strength arithmetic,
//! generalized into a seam any caller can query for any seat.

use crate::entities::SeatId;
use crate::rules_engine::RulesEngine;

/// Coarse table-relative seating bucket, computed from the action order rather than
/// raw seat index so it stays meaningful as seats fold.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Position {
    Early,
    Middle,
    Late,
}

/// Everything the prompt builder and rule-based agents need about a seat's current
/// decision, computed fresh from the Rules Engine on every call.
#[derive(Clone, Copy, Debug)]
pub struct HandAnalysis {
    pub strength_percentile: f32,
    pub pot_odds: f32,
    pub position: Position,
    pub chips_to_call: u32,
    pub effective_stack: u32,
}

/// Normalized hand-strength percentile for `seat`, straight from the Rules Engine's
/// evaluator — this crate never re-derives hand strength itself.
#[must_use]
pub fn strength(engine: &dyn RulesEngine, seat: SeatId) -> f32 {
    engine.strength_percentile(seat)
}

/// `chips_to_call / (pot_total + chips_to_call)`, the fraction of the resulting pot a
/// call would cost. `0.0` when there is nothing to call (checking is free, so the
/// question is moot).
#[must_use]
pub fn pot_odds(engine: &dyn RulesEngine, seat: SeatId) -> f32 {
    let to_call = engine.chips_to_call(seat) as f32;
    if to_call <= 0.0 {
        return 0.0;
    }
    let pot_total: u32 = engine.pots().iter().map(|p| p.total).sum();
    to_call / (pot_total as f32 + to_call)
}

/// Bucket `seat`'s distance from the button along the current action order, split
/// into thirds (early/middle/late) by how many seats still act after this one. The
/// button is the last seat to act in a street, so it always buckets as `Late`.
#[must_use]
pub fn position(engine: &dyn RulesEngine, seat: SeatId) -> Position {
    let order = engine.action_order();
    let Some(idx) = order.iter().position(|&s| s == seat) else {
        return Position::Early;
    };
    let n = order.len().max(1);
    let fraction = (idx + 1) as f32 / n as f32;
    if fraction <= 1.0 / 3.0 {
        Position::Early
    } else if fraction <= 2.0 / 3.0 {
        Position::Middle
    } else {
        Position::Late
    }
}

/// The smaller of `seat`'s stack and the largest stack among the other seats still in
/// the hand — the most either side can actually win or lose this hand.
#[must_use]
pub fn effective_stack(engine: &dyn RulesEngine, seat: SeatId) -> u32 {
    let mine = engine.seat_chips(seat);
    let others_max = (0..engine.seat_count())
        .filter(|&s| s != seat)
        .map(|s| engine.seat_chips(s))
        .max()
        .unwrap_or(0);
    mine.min(others_max)
}

/// All four measures for `seat` in one call, the shape C3/C5 actually consume.
#[must_use]
pub fn analyze(engine: &dyn RulesEngine, seat: SeatId) -> HandAnalysis {
    HandAnalysis {
        strength_percentile: strength(engine, seat),
        pot_odds: pot_odds(engine, seat),
        position: position(engine, seat),
        chips_to_call: engine.chips_to_call(seat),
        effective_stack: effective_stack(engine, seat),
    }
}
