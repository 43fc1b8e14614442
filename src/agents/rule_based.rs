//! C5 — rule-based agent personalities. No LLM round trip, no human wait: a decision
//! is produced synchronously from the current [`DecisionContext`] and the session's
//! seeded RNG, so replaying a session with the same seed reproduces the same actions.
//!
//! Adapted from a difficulty-preset decision maker (Easy/Standard/Hard mapped to
//! call-heavy, balanced, and tight-aggressive play), generalized into named
//! personalities any seat can select independent of a fixed difficulty tier.

use enum_dispatch::enum_dispatch;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::entities::{Action, ActionKind};

use super::{DecisionContext, RuleAgent};

/// Never folds, never raises: checks when free, otherwise calls whatever is legal.
#[derive(Clone, Copy, Debug, Default)]
pub struct CallStation;

impl RuleAgent for CallStation {
    fn decide(&self, ctx: &DecisionContext, _rng: &mut SmallRng) -> Action {
        if ctx.moves.contains(ActionKind::Check) {
            Action::Check
        } else if ctx.moves.contains(ActionKind::Call) {
            Action::Call
        } else {
            Action::Fold
        }
    }
}

/// Picks uniformly among the legal action kinds; a legal raise gets a uniformly
/// random amount within its range.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomAgent;

impl RuleAgent for RandomAgent {
    fn decide(&self, ctx: &DecisionContext, rng: &mut SmallRng) -> Action {
        let idx = rng.random_range(0..ctx.moves.legal.len());
        match ctx.moves.legal[idx] {
            ActionKind::Fold => Action::Fold,
            ActionKind::Check => Action::Check,
            ActionKind::Call => Action::Call,
            ActionKind::Raise => {
                let (min, max) = ctx.moves.raise_range.unwrap_or((0, 0));
                Action::Raise { amount: if max > min { rng.random_range(min..=max) } else { min } }
            }
        }
    }
}

/// Uniform over every legal action kind except `Fold`; falls back to `Fold` only when
/// it's the single legal move. A raise gets a uniformly random amount within range.
#[derive(Clone, Copy, Debug, Default)]
pub struct AggressiveRandomAgent;

impl RuleAgent for AggressiveRandomAgent {
    fn decide(&self, ctx: &DecisionContext, rng: &mut SmallRng) -> Action {
        let non_fold: Vec<ActionKind> =
            ctx.moves.legal.iter().copied().filter(|&kind| kind != ActionKind::Fold).collect();
        let pool = if non_fold.is_empty() { &ctx.moves.legal } else { &non_fold };
        let idx = rng.random_range(0..pool.len());
        match pool[idx] {
            ActionKind::Fold => Action::Fold,
            ActionKind::Check => Action::Check,
            ActionKind::Call => Action::Call,
            ActionKind::Raise => {
                let (min, max) = ctx.moves.raise_range.unwrap_or((0, 0));
                Action::Raise { amount: if max > min { rng.random_range(min..=max) } else { min } }
            }
        }
    }
}

/// Checks when free; otherwise calls as long as the call is cheap relative to its own
/// stack, and folds once it isn't.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassiveAgent;

impl RuleAgent for PassiveAgent {
    fn decide(&self, ctx: &DecisionContext, _rng: &mut SmallRng) -> Action {
        if ctx.moves.contains(ActionKind::Check) {
            return Action::Check;
        }
        let cheap = (ctx.analysis.chips_to_call as f32) <= 0.4 * ctx.analysis.effective_stack as f32;
        if ctx.moves.contains(ActionKind::Call) && cheap {
            return Action::Call;
        }
        Action::Fold
    }
}

/// Shared fold/call/raise-to-2x-min ladder parameterized by a strength band, used by
/// both [`TightAgent`] and [`PositionAwareAgent`].
fn tight_ladder(ctx: &DecisionContext, fold_below: f32, raise_above: f32) -> Action {
    if ctx.analysis.strength_percentile < fold_below {
        return if ctx.moves.contains(ActionKind::Check) { Action::Check } else { Action::Fold };
    }
    if ctx.analysis.strength_percentile <= raise_above {
        if ctx.moves.contains(ActionKind::Check) {
            return Action::Check;
        }
        return if ctx.moves.contains(ActionKind::Call) { Action::Call } else { Action::Fold };
    }
    if ctx.moves.contains(ActionKind::Raise) {
        let (min, max) = ctx.moves.raise_range.unwrap();
        return Action::Raise { amount: (min * 2).min(max) };
    }
    if ctx.moves.contains(ActionKind::Call) { Action::Call } else { Action::Check }
}

/// Folds to a bet below 0.35 strength, calls between 0.35 and 0.6, raises to twice the
/// minimum raise above that.
#[derive(Clone, Copy, Debug, Default)]
pub struct TightAgent;

impl RuleAgent for TightAgent {
    fn decide(&self, ctx: &DecisionContext, _rng: &mut SmallRng) -> Action {
        tight_ladder(ctx, 0.35, 0.6)
    }
}

/// Plays a much wider range than [`TightAgent`]: calls down to 0.2 strength, raises
/// the minimum at 0.55 or above.
#[derive(Clone, Copy, Debug, Default)]
pub struct LooseAgent;

impl RuleAgent for LooseAgent {
    fn decide(&self, ctx: &DecisionContext, _rng: &mut SmallRng) -> Action {
        if ctx.analysis.strength_percentile >= 0.55 && ctx.moves.contains(ActionKind::Raise) {
            let (min, _max) = ctx.moves.raise_range.unwrap();
            return Action::Raise { amount: min };
        }
        if ctx.moves.contains(ActionKind::Check) {
            return Action::Check;
        }
        if ctx.analysis.strength_percentile >= 0.2 && ctx.moves.contains(ActionKind::Call) {
            return Action::Call;
        }
        Action::Fold
    }
}

/// Plays like [`PassiveAgent`] except on the flop and turn, where it occasionally
/// raises with nothing to keep opponents honest.
#[derive(Clone, Copy, Debug, Default)]
pub struct BluffAgent;

impl RuleAgent for BluffAgent {
    fn decide(&self, ctx: &DecisionContext, rng: &mut SmallRng) -> Action {
        let on_flop_or_turn = matches!(ctx.board.len(), 3 | 4);
        if on_flop_or_turn && ctx.moves.contains(ActionKind::Raise) && rng.random_bool(0.15) {
            let (min, max) = ctx.moves.raise_range.unwrap();
            return Action::Raise { amount: min.min(max) };
        }
        PassiveAgent.decide(ctx, rng)
    }
}

/// [`TightAgent`]'s ladder with both thresholds lowered by 0.1 once the seat is in the
/// last third of the current action order — late position can see more before acting,
/// so it can afford to play a wider range.
#[derive(Clone, Copy, Debug, Default)]
pub struct PositionAwareAgent;

impl RuleAgent for PositionAwareAgent {
    fn decide(&self, ctx: &DecisionContext, _rng: &mut SmallRng) -> Action {
        use crate::analyzer::Position;
        let adjust = if matches!(ctx.analysis.position, Position::Late) { 0.1 } else { 0.0 };
        tight_ladder(ctx, 0.35 - adjust, 0.6 - adjust)
    }
}

#[enum_dispatch(RuleAgent)]
#[derive(Clone, Copy, Debug)]
pub enum RulePersonality {
    CallStation,
    RandomAgent,
    AggressiveRandomAgent,
    PassiveAgent,
    TightAgent,
    LooseAgent,
    BluffAgent,
    PositionAwareAgent,
}

/// Every personality name the session orchestrator's `list_agents` catalogue exposes.
pub const PERSONALITY_NAMES: &[&str] =
    &["call", "random", "aggressive_random", "passive", "tight", "loose", "bluff", "position_aware"];

/// One-line description for the `list_agents` catalogue entry, matching
/// [`PERSONALITY_NAMES`]. `None` for anything not in that list.
#[must_use]
pub fn description(name: &str) -> Option<&'static str> {
    match name {
        "call" => Some("Never folds, never raises: checks when free, calls otherwise."),
        "random" => Some("Picks uniformly among the legal actions, with a uniformly random raise size."),
        "aggressive_random" => Some("Uniform over every legal action except fold."),
        "passive" => Some("Checks when free, calls a cheap bet, folds to an expensive one."),
        "tight" => Some("Folds below 0.35 strength, calls to 0.6, raises to double the minimum above that."),
        "loose" => Some("Plays a much wider range than tight, calling down to 0.2 strength."),
        "bluff" => Some("Plays passively except for occasional unprompted raises on the flop and turn."),
        "position_aware" => Some("Tight's ladder, widened by 0.1 strength once the seat is in late position."),
        _ => None,
    }
}

/// Resolve a catalogue name to a personality. `None` for anything not in
/// [`PERSONALITY_NAMES`].
#[must_use]
pub fn by_name(name: &str) -> Option<RulePersonality> {
    match name {
        "call" => Some(RulePersonality::CallStation(CallStation)),
        "random" => Some(RulePersonality::RandomAgent(RandomAgent)),
        "aggressive_random" => Some(RulePersonality::AggressiveRandomAgent(AggressiveRandomAgent)),
        "passive" => Some(RulePersonality::PassiveAgent(PassiveAgent)),
        "tight" => Some(RulePersonality::TightAgent(TightAgent)),
        "loose" => Some(RulePersonality::LooseAgent(LooseAgent)),
        "bluff" => Some(RulePersonality::BluffAgent(BluffAgent)),
        "position_aware" => Some(RulePersonality::PositionAwareAgent(PositionAwareAgent)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{HandAnalysis, Position};
    use crate::entities::AvailableMoves;
    use rand::SeedableRng;

    fn ctx_at(moves: AvailableMoves, strength: f32, position: Position, chips_to_call: u32) -> DecisionContext {
        DecisionContext {
            seat: 0,
            hand_number: 1,
            board: vec![],
            hole_cards: None,
            pot_total: 100,
            analysis: HandAnalysis {
                strength_percentile: strength,
                pot_odds: 0.2,
                position,
                chips_to_call,
                effective_stack: 500,
            },
            moves,
            memory: vec![],
        }
    }

    fn ctx(moves: AvailableMoves, strength: f32) -> DecisionContext {
        ctx_at(moves, strength, Position::Middle, 0)
    }

    #[test]
    fn call_station_never_folds_when_check_is_free() {
        let moves = AvailableMoves { legal: vec![ActionKind::Fold, ActionKind::Check, ActionKind::Raise], raise_range: Some((20, 500)) };
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(CallStation.decide(&ctx(moves, 0.1), &mut rng), Action::Check);
    }

    #[test]
    fn tight_folds_weak_hands_facing_a_bet() {
        let moves = AvailableMoves { legal: vec![ActionKind::Fold, ActionKind::Call], raise_range: None };
        let mut rng = SmallRng::seed_from_u64(2);
        assert_eq!(TightAgent.decide(&ctx_at(moves, 0.1, Position::Middle, 40), &mut rng), Action::Fold);
    }

    #[test]
    fn tight_calls_medium_strength() {
        let moves = AvailableMoves { legal: vec![ActionKind::Fold, ActionKind::Call, ActionKind::Raise], raise_range: Some((40, 500)) };
        let mut rng = SmallRng::seed_from_u64(3);
        assert_eq!(TightAgent.decide(&ctx_at(moves, 0.5, Position::Middle, 40), &mut rng), Action::Call);
    }

    #[test]
    fn tight_raises_to_double_min_with_a_premium_hand() {
        let moves = AvailableMoves { legal: vec![ActionKind::Fold, ActionKind::Call, ActionKind::Raise], raise_range: Some((40, 500)) };
        let mut rng = SmallRng::seed_from_u64(4);
        assert_eq!(TightAgent.decide(&ctx_at(moves, 0.9, Position::Middle, 40), &mut rng), Action::Raise { amount: 80 });
    }

    #[test]
    fn loose_calls_down_to_a_low_floor() {
        let moves = AvailableMoves { legal: vec![ActionKind::Fold, ActionKind::Call], raise_range: None };
        let mut rng = SmallRng::seed_from_u64(5);
        assert_eq!(LooseAgent.decide(&ctx_at(moves, 0.25, Position::Middle, 40), &mut rng), Action::Call);
    }

    #[test]
    fn position_aware_plays_wider_in_late_position() {
        let moves = AvailableMoves { legal: vec![ActionKind::Fold, ActionKind::Call], raise_range: None };
        let mut rng = SmallRng::seed_from_u64(6);
        // 0.3 is below tight's 0.35 floor but above the late-position-adjusted 0.25 floor.
        assert_eq!(PositionAwareAgent.decide(&ctx_at(moves.clone(), 0.3, Position::Early, 40), &mut rng), Action::Fold);
        assert_eq!(PositionAwareAgent.decide(&ctx_at(moves, 0.3, Position::Late, 40), &mut rng), Action::Call);
    }

    #[test]
    fn aggressive_random_never_folds_when_another_move_is_legal() {
        let moves = AvailableMoves { legal: vec![ActionKind::Fold, ActionKind::Check], raise_range: None };
        for seed in 0..20 {
            let mut rng = SmallRng::seed_from_u64(seed);
            assert_eq!(AggressiveRandomAgent.decide(&ctx(moves.clone(), 0.1), &mut rng), Action::Check);
        }
    }

    #[test]
    fn aggressive_random_folds_when_it_is_the_only_option() {
        let moves = AvailableMoves { legal: vec![ActionKind::Fold], raise_range: None };
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(AggressiveRandomAgent.decide(&ctx(moves, 0.1), &mut rng), Action::Fold);
    }

    #[test]
    fn by_name_covers_every_listed_personality() {
        for name in PERSONALITY_NAMES {
            assert!(by_name(name).is_some(), "missing personality: {name}");
        }
        assert!(by_name("nonexistent").is_none());
    }

    #[test]
    fn description_covers_every_listed_personality() {
        for name in PERSONALITY_NAMES {
            assert!(description(name).is_some(), "missing description: {name}");
        }
        assert!(description("nonexistent").is_none());
    }
}
