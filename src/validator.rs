//! C6 — action validator. A pure function between the agent pipeline (C4/C5/C7) and
//! the Rules Engine: clamps a proposed action into the legal range when it's close,
//! and falls back through Check → Call → Fold when it isn't, rather than ever
//! bubbling a malformed agent decision straight into `take_action`.
//!
//! Uses a straightforward clamp style (`raise_amount.min(max_total)`) before a
//! decision is ever applied to the table.

use crate::entities::{Action, ActionKind, AvailableMoves};
use crate::error::AgentError;

/// What the validator did to a proposed action before it reached the Rules Engine.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Resolution {
    /// The action was already legal as proposed.
    Accepted,
    /// A `Raise` amount was outside `[min_total, max_total]` and was clamped to the
    /// nearest bound.
    Clamped,
    /// The proposed action kind was not legal at all; the fallback ladder
    /// (Check → Call → Fold) substituted the first legal one.
    FellBack,
}

#[derive(Clone, Copy, Debug)]
pub struct Validated {
    pub action: Action,
    pub resolution: Resolution,
}

/// Validate and, if necessary, repair `proposed` against `moves`. Returns
/// `AgentError::AgentFailure` only when even the fallback ladder has nothing legal to
/// offer (`moves.legal` is empty) — at that point the caller is expected to report the
/// seat's decision as a failure rather than invent an action.
pub fn validate(seat: crate::entities::SeatId, proposed: Action, moves: &AvailableMoves) -> Result<Validated, AgentError> {
    if moves.legal.is_empty() {
        return Err(AgentError::AgentFailure {
            seat,
            cause: "no legal actions available for this decision".to_string(),
        });
    }

    if moves.contains(proposed.kind()) {
        if let Action::Raise { amount } = proposed {
            if let Some((min, max)) = moves.raise_range {
                if amount < min || amount > max {
                    return Ok(Validated { action: Action::Raise { amount: amount.clamp(min, max) }, resolution: Resolution::Clamped });
                }
            }
        }
        return Ok(Validated { action: proposed, resolution: Resolution::Accepted });
    }

    for fallback in [ActionKind::Check, ActionKind::Call, ActionKind::Fold] {
        if moves.contains(fallback) {
            let action = match fallback {
                ActionKind::Check => Action::Check,
                ActionKind::Call => Action::Call,
                ActionKind::Fold => Action::Fold,
                ActionKind::Raise => unreachable!("fallback ladder never offers Raise"),
            };
            return Ok(Validated { action, resolution: Resolution::FellBack });
        }
    }

    Err(AgentError::AgentFailure { seat, cause: "fallback ladder exhausted".to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moves_with_raise(min: u32, max: u32) -> AvailableMoves {
        AvailableMoves { legal: vec![ActionKind::Fold, ActionKind::Call, ActionKind::Raise], raise_range: Some((min, max)) }
    }

    #[test]
    fn accepts_legal_action_unchanged() {
        let moves = moves_with_raise(40, 1000);
        let result = validate(0, Action::Call, &moves).unwrap();
        assert_eq!(result.resolution, Resolution::Accepted);
        assert_eq!(result.action, Action::Call);
    }

    #[test]
    fn clamps_raise_below_minimum() {
        let moves = moves_with_raise(40, 1000);
        let result = validate(0, Action::Raise { amount: 10 }, &moves).unwrap();
        assert_eq!(result.resolution, Resolution::Clamped);
        assert_eq!(result.action, Action::Raise { amount: 40 });
    }

    #[test]
    fn clamps_raise_above_maximum() {
        let moves = moves_with_raise(40, 1000);
        let result = validate(0, Action::Raise { amount: 5000 }, &moves).unwrap();
        assert_eq!(result.action, Action::Raise { amount: 1000 });
    }

    #[test]
    fn falls_back_to_check_when_raise_illegal() {
        let moves = AvailableMoves { legal: vec![ActionKind::Fold, ActionKind::Check], raise_range: None };
        let result = validate(0, Action::Raise { amount: 100 }, &moves).unwrap();
        assert_eq!(result.resolution, Resolution::FellBack);
        assert_eq!(result.action, Action::Check);
    }

    #[test]
    fn falls_back_to_fold_when_only_fold_legal() {
        let moves = AvailableMoves { legal: vec![ActionKind::Fold], raise_range: None };
        let result = validate(0, Action::Call, &moves).unwrap();
        assert_eq!(result.action, Action::Fold);
    }

    #[test]
    fn errors_when_no_legal_actions() {
        let moves = AvailableMoves { legal: vec![], raise_range: None };
        assert!(validate(0, Action::Fold, &moves).is_err());
    }
}
