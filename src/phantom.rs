//! C1 — phantom-chip correction.
//!
//! The reference Rules Engine (and real ones) can leave a pot's `total` non-zero
//! after a hand ends by fold, because the fold path credits the winner's stack
//! directly without also clearing the pot's bookkeeping. Left alone this stale total
//! re-appears in the next hand's `GameState.pots` and silently violates chip
//! conservation. The orchestrator calls [`detect_and_correct`] once per completed
//! hand, before starting the next one, then reasserts conservation with
//! [`verify_conservation`] — a reassertion failure means something deeper than the
//! known stale-pot defect is wrong, and the session has to stop rather than keep
//! dealing on top of untrustworthy chip counts.

use crate::entities::Chips;
use crate::rules_engine::RulesEngine;

/// One correction the orchestrator applied. Carried on the `ActionApplied` /
/// `StateUpdate` event stream so subscribers can see it happened, and always
/// logged server-side regardless of `debug_mode`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PhantomCorrection {
    pub hand_number: u32,
    pub stale_total: Chips,
}

/// Runs once after a hand concludes (i.e. `!engine.is_hand_running()`). Sums every
/// pot's leftover total; if any chips are still sitting there, zeroes every pot and
/// returns what was corrected. A clean hand end (showdown, or any engine that
/// already zeroes its own pots) returns `None`.
pub fn detect_and_correct(engine: &mut dyn RulesEngine) -> Option<PhantomCorrection> {
    if engine.is_hand_running() {
        return None;
    }
    let stale_total: Chips = engine.pots().iter().map(|p| p.total).sum();
    if stale_total == 0 {
        return None;
    }
    log::warn!(
        "phantom chips detected after hand {}: {stale_total} chips stuck in pot bookkeeping, zeroing",
        engine.hand_number(),
    );
    engine.zero_pots();
    Some(PhantomCorrection { hand_number: engine.hand_number(), stale_total })
}

/// Reasserts that every chip is accounted for: `Σ pot.total + Σ seat.chips` must
/// equal `expected_total` (seats × buy-in at session creation; chips move between
/// seats and pots, they never leave the table). Called after [`detect_and_correct`]
/// so a correction that papered over the known defect without actually restoring
/// balance doesn't silently continue.
#[must_use]
pub fn verify_conservation(engine: &dyn RulesEngine, expected_total: Chips) -> bool {
    let pots: Chips = engine.pots().iter().map(|p| p.total).sum();
    let seats: Chips = (0..engine.seat_count()).map(|s| engine.seat_chips(s)).sum();
    pots + seats == expected_total
}
