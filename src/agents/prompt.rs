//! C3 — prompt builder. Turns a [`DecisionContext`] plus an LLM seat's personality
//! string into the text sent to the LLM Gateway. Pure and synchronous: building a
//! prompt never touches the network.

use std::fmt::Write as _;

use crate::entities::{ActionKind, Phase};

use super::DecisionContext;

/// The rendered prompt plus the personality tag it was built for, kept together so
/// callers can log what went out without re-deriving it.
#[derive(Clone, Debug)]
pub struct Prompt {
    pub personality: String,
    pub text: String,
}

/// Render `ctx` into a prompt for `personality`. Includes the board, the seat's own
/// hole cards (never an opponent's — this function only ever receives the calling
/// seat's own context), pot odds, position, and this hand's action transcript so far.
#[must_use]
pub fn build(ctx: &DecisionContext, personality: &str) -> Prompt {
    let mut text = String::new();
    let _ = writeln!(text, "You are playing Texas Hold'em as seat {} with a \"{personality}\" personality.", ctx.seat);
    let _ = writeln!(text, "Hand #{}, phase {:?}.", ctx.hand_number, phase_of(ctx));

    if let Some(hole) = ctx.hole_cards {
        let _ = writeln!(text, "Your hole cards: {} {}", hole[0], hole[1]);
    }
    if ctx.board.is_empty() {
        let _ = writeln!(text, "Board: (none yet)");
    } else {
        let board = ctx.board.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
        let _ = writeln!(text, "Board: {board}");
    }

    let _ = writeln!(text, "Pot: {}. Chips to call: {}.", ctx.pot_total, ctx.analysis.chips_to_call);
    let _ = writeln!(text, "Your estimated hand strength percentile: {:.2}", ctx.analysis.strength_percentile);
    let _ = writeln!(text, "Pot odds if you call: {:.2}", ctx.analysis.pot_odds);
    let _ = writeln!(text, "Your position: {:?}", ctx.analysis.position);
    let _ = writeln!(text, "Your effective stack: {}", ctx.analysis.effective_stack);

    if ctx.memory.is_empty() {
        let _ = writeln!(text, "No actions have been taken yet this hand.");
    } else {
        let _ = writeln!(text, "Actions so far this hand:");
        for record in &ctx.memory {
            let amount = record.amount.map(|a| format!(" to {a}")).unwrap_or_default();
            let _ = writeln!(text, "  - seat {} {:?} in {:?}{amount}", record.player_id, record.action_kind, record.phase);
        }
    }

    let _ = write!(text, "Legal actions: {}", render_legal(&ctx.moves.legal));
    if let Some((min, max)) = ctx.moves.raise_range {
        let _ = write!(text, " (raise range {min}-{max})");
    }
    text.push('\n');
    text.push_str("Respond with a JSON object: {\"action\": \"fold\"|\"check\"|\"call\"|\"raise\", \"amount\": <int, only for raise>, \"reasoning\": <string>, \"confidence\": <0..1 float>}.");

    Prompt { personality: personality.to_string(), text }
}

fn phase_of(ctx: &DecisionContext) -> Phase {
    match ctx.board.len() {
        0 => Phase::PreFlop,
        3 => Phase::Flop,
        4 => Phase::Turn,
        _ => Phase::River,
    }
}

fn render_legal(kinds: &[ActionKind]) -> String {
    kinds
        .iter()
        .map(|k| format!("{k:?}").to_lowercase())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{HandAnalysis, Position};
    use crate::entities::AvailableMoves;

    #[test]
    fn prompt_mentions_personality_and_legal_actions() {
        let ctx = DecisionContext {
            seat: 2,
            hand_number: 5,
            board: vec![],
            hole_cards: None,
            pot_total: 60,
            analysis: HandAnalysis { strength_percentile: 0.5, pot_odds: 0.25, position: Position::Middle, chips_to_call: 20, effective_stack: 400 },
            moves: AvailableMoves { legal: vec![ActionKind::Fold, ActionKind::Call], raise_range: None },
            memory: vec![],
        };
        let prompt = build(&ctx, "tight");
        assert!(prompt.text.contains("tight"));
        assert!(prompt.text.contains("fold"));
        assert!(prompt.text.contains("call"));
    }
}
