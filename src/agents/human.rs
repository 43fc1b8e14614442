//! C7 — human input bridge. A single-slot mailbox between a connected client and the
//! turn loop: one `oneshot` pair is installed per turn, and whichever arrives first —
//! a submitted action, or the turn timeout — resolves the decision. A human who never
//! answers defaults to Check (if legal) or Fold, and that default applies only to the
//! current turn.
//!
//! Narrowed from a per-request `oneshot::Sender` idiom to "one reply per human turn".

use std::time::Duration;

use tokio::sync::{oneshot, Mutex};

use crate::entities::{Action, ActionKind, AvailableMoves};
use crate::error::AgentError;

use super::Decision;

/// How a human's turn was ultimately resolved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HumanOutcome {
    Submitted,
    TimedOut,
}

/// Per-seat mailbox. The orchestrator owns one of these per human seat for the
/// lifetime of the session; `await_action` is called once per turn and always
/// installs a fresh slot, so a stale submission from a prior turn can never resolve
/// the wrong decision.
#[derive(Debug)]
pub struct HumanInputBridge {
    slot: Mutex<Option<oneshot::Sender<Action>>>,
    turn_timeout: Duration,
}

impl HumanInputBridge {
    #[must_use]
    pub fn new(turn_timeout: Duration) -> Self {
        Self { slot: Mutex::new(None), turn_timeout }
    }

    /// Installs a fresh slot and waits for either a submission or the turn timeout.
    /// On timeout, returns the default action for `moves` rather than an error — a
    /// silent human is not a pipeline failure.
    pub async fn await_action(&self, moves: &AvailableMoves) -> (Decision, HumanOutcome) {
        let (tx, rx) = oneshot::channel();
        {
            let mut slot = self.slot.lock().await;
            *slot = Some(tx);
        }
        match tokio::time::timeout(self.turn_timeout, rx).await {
            Ok(Ok(action)) => (Decision::plain(action), HumanOutcome::Submitted),
            Ok(Err(_)) | Err(_) => {
                let mut slot = self.slot.lock().await;
                *slot = None;
                (Decision::plain(default_action(moves)), HumanOutcome::TimedOut)
            }
        }
    }

    /// Delivers a client-submitted action to whichever turn is currently waiting.
    /// Errors if no turn is pending for this seat right now — the client answered a
    /// turn that already moved on.
    pub async fn submit(&self, action: Action) -> Result<(), AgentError> {
        let mut slot = self.slot.lock().await;
        match slot.take() {
            Some(tx) => tx.send(action).map_err(|_| AgentError::AgentFailure {
                seat: 0,
                cause: "turn already resolved before submission arrived".to_string(),
            }),
            None => Err(AgentError::AgentFailure { seat: 0, cause: "no turn is currently pending for this seat".to_string() }),
        }
    }
}

/// Check if legal, otherwise Fold. Never Call or Raise — a silent player should never
/// be charged chips they didn't choose to risk.
#[must_use]
pub fn default_action(moves: &AvailableMoves) -> Action {
    if moves.contains(ActionKind::Check) {
        Action::Check
    } else {
        Action::Fold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submitted_action_resolves_before_timeout() {
        let bridge = HumanInputBridge::new(Duration::from_secs(5));
        let moves = AvailableMoves { legal: vec![ActionKind::Fold, ActionKind::Check], raise_range: None };

        let wait = bridge.await_action(&moves);
        tokio::pin!(wait);

        tokio::time::sleep(Duration::from_millis(10)).await;
        bridge.submit(Action::Check).await.unwrap();

        let (decision, outcome) = wait.await;
        assert_eq!(outcome, HumanOutcome::Submitted);
        assert_eq!(decision.action, Action::Check);
    }

    #[tokio::test]
    async fn timeout_defaults_to_check_when_legal() {
        let bridge = HumanInputBridge::new(Duration::from_millis(20));
        let moves = AvailableMoves { legal: vec![ActionKind::Fold, ActionKind::Check], raise_range: None };
        let (decision, outcome) = bridge.await_action(&moves).await;
        assert_eq!(outcome, HumanOutcome::TimedOut);
        assert_eq!(decision.action, Action::Check);
    }

    #[tokio::test]
    async fn timeout_defaults_to_fold_when_check_illegal() {
        let bridge = HumanInputBridge::new(Duration::from_millis(20));
        let moves = AvailableMoves { legal: vec![ActionKind::Fold, ActionKind::Call], raise_range: None };
        let (decision, _) = bridge.await_action(&moves).await;
        assert_eq!(decision.action, Action::Fold);
    }

    #[tokio::test]
    async fn submit_without_pending_turn_errors() {
        let bridge = HumanInputBridge::new(Duration::from_secs(5));
        assert!(bridge.submit(Action::Check).await.is_err());
    }
}
