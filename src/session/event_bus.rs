//! C10 — event bus. Per-session fan-out with one independent bounded queue per
//! subscriber, so a slow subscriber never stalls the turn loop and never starves a
//! fast one. `StateUpdate` is the only event type allowed to be dropped under
//! pressure (the oldest buffered one is evicted to make room); `ActionApplied`,
//! `TimeoutAction`, `Error`, and `Terminal` are never dropped.
//!
//! `tokio::sync::broadcast` doesn't support per-event-type drop policy, so this is a
//! small hand-rolled queue instead, shaped like a subscriber map
//! (`HashMap<id, mpsc::Sender<Notification>>`) but built on a `Mutex<VecDeque<_>>` +
//! `Notify` so the eviction policy can inspect and rewrite the buffer before delivery
//! rather than just push-or-fail.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, Notify, RwLock};

use crate::entities::{Action, GameState, RankingEntry, SeatId};

pub type SubscriberId = u64;

/// Machine-readable category for an [`Event::Error`], so subscribers can branch on
/// failure kind without parsing `message`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    LlmTimeout,
    LlmFailure,
    PhantomCorrectionFailed,
}

/// Everything a subscriber can observe about a running session.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    StateUpdate {
        revision: u64,
        state: GameState,
    },
    ActionApplied {
        seat: SeatId,
        action: Action,
        reasoning: Option<String>,
        confidence: Option<f32>,
    },
    /// A human seat's turn timer expired and the default action (`Check` if legal,
    /// else `Fold`) was applied on its behalf.
    TimeoutAction {
        seat: SeatId,
        action: Action,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
    Terminal {
        final_rankings: Vec<RankingEntry>,
    },
}

impl Event {
    fn is_state_update(&self) -> bool {
        matches!(self, Self::StateUpdate { .. })
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal { .. })
    }
}

struct SubscriberQueue {
    buffer: Mutex<VecDeque<Event>>,
    notify: Notify,
    closed: AtomicBool,
    state_update_capacity: usize,
}

impl SubscriberQueue {
    fn new(state_update_capacity: usize) -> Self {
        Self { buffer: Mutex::new(VecDeque::new()), notify: Notify::new(), closed: AtomicBool::new(false), state_update_capacity }
    }

    async fn push(&self, event: Event) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        let mut buffer = self.buffer.lock().await;
        if event.is_state_update() {
            let pending = buffer.iter().filter(|e| e.is_state_update()).count();
            if pending >= self.state_update_capacity {
                if let Some(pos) = buffer.iter().position(Event::is_state_update) {
                    buffer.remove(pos);
                }
            }
        }
        if event.is_terminal() {
            self.closed.store(true, Ordering::Release);
        }
        buffer.push_back(event);
        drop(buffer);
        self.notify.notify_one();
    }

    async fn recv(&self) -> Option<Event> {
        loop {
            {
                let mut buffer = self.buffer.lock().await;
                if let Some(event) = buffer.pop_front() {
                    return Some(event);
                }
                if self.closed.load(Ordering::Acquire) {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }
}

/// Handle returned by [`EventBus::subscribe`]. Dropping it without calling
/// [`Subscription::unsubscribe`] leaves the bus holding a queue no one drains until
/// the session ends and publishes a `Terminal` event (closing it); callers that
/// disconnect early should unsubscribe explicitly.
pub struct Subscription {
    id: SubscriberId,
    queue: Arc<SubscriberQueue>,
}

impl Subscription {
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub async fn recv(&self) -> Option<Event> {
        self.queue.recv().await
    }
}

/// Owns every subscriber queue for one session.
pub struct EventBus {
    subscribers: RwLock<HashMap<SubscriberId, Arc<SubscriberQueue>>>,
    next_id: AtomicU64,
    state_update_capacity: usize,
}

impl EventBus {
    #[must_use]
    pub fn new(state_update_capacity: usize) -> Self {
        Self { subscribers: RwLock::new(HashMap::new()), next_id: AtomicU64::new(1), state_update_capacity }
    }

    pub async fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let queue = Arc::new(SubscriberQueue::new(self.state_update_capacity));
        self.subscribers.write().await.insert(id, queue.clone());
        Subscription { id, queue }
    }

    pub async fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.write().await.remove(&id);
    }

    /// Fan `event` out to every current subscriber. Cheap clones only — `Event` is
    /// small relative to a WebSocket write, and each subscriber's copy must be
    /// independently evictable.
    pub async fn publish(&self, event: Event) {
        let subscribers = self.subscribers.read().await;
        for queue in subscribers.values() {
            queue.push(event.clone()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_state_update() -> Event {
        Event::Error { kind: ErrorKind::LlmTimeout, message: "placeholder".to_string() }
    }

    #[tokio::test]
    async fn drops_oldest_state_update_under_pressure() {
        let queue = SubscriberQueue::new(2);
        for i in 0..5 {
            queue.push(Event::StateUpdate { revision: u64::from(i), state: test_state(i) }).await;
        }
        let buffer = queue.buffer.lock().await;
        let pending: Vec<_> = buffer.iter().filter(|e| e.is_state_update()).collect();
        assert_eq!(pending.len(), 2);
    }

    #[tokio::test]
    async fn never_drops_action_applied_or_terminal() {
        let queue = SubscriberQueue::new(1);
        for _ in 0..10 {
            queue.push(Event::ActionApplied { seat: 0, action: Action::Check, reasoning: None, confidence: None }).await;
        }
        let buffer = queue.buffer.lock().await;
        assert_eq!(buffer.len(), 10);
    }

    #[tokio::test]
    async fn subscriber_receives_published_events_in_order() {
        let bus = EventBus::new(8);
        let sub = bus.subscribe().await;
        bus.publish(dummy_state_update()).await;
        bus.publish(Event::Terminal { final_rankings: vec![] }).await;
        assert!(matches!(sub.recv().await, Some(Event::Error { .. })));
        assert!(matches!(sub.recv().await, Some(Event::Terminal { .. })));
        assert!(sub.recv().await.is_none());
    }

    fn test_state(hand_number: u32) -> GameState {
        GameState {
            game_id: uuid::Uuid::nil(),
            revision: u64::from(hand_number),
            status: crate::entities::SessionStatus::Running,
            phase: crate::entities::Phase::PreFlop,
            hand_number,
            max_hands: 10,
            board: vec![],
            seats: vec![],
            pots: vec![],
            current_player: None,
            available_actions: vec![],
            min_raise_amount: None,
            debug_mode: false,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }
}
