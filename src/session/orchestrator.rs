//! C8 — session orchestrator. Owns one hand-lifecycle state machine and drives the
//! turn loop across whichever decision sources (C5/C4/C7) the seats require.
//!
//! `advance()` is an idempotent hand-boundary trigger, not a step function: it errors
//! with `NotReady` while a hand is in progress, and otherwise runs a hand start to
//! finish, suspending in place on human mailbox waits and LLM calls rather than
//! returning control between turns. A roster with no human seats keeps dealing
//! further hands automatically within the same call; a roster with a human seat stops
//! after one hand so the caller can observe it before triggering the next. Owns its
//! table state directly and drives its own lifecycle, the way a table actor would,
//! but adapted from an actor's mailbox loop to a `Mutex`-guarded shared handle since
//! callers here want direct, synchronous-looking method calls (`snapshot`,
//! `propose_action`, `advance`) rather than a message protocol.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::agents::human::HumanInputBridge;
use crate::agents::{self, rule_based, DecisionContext, RuleAgent};
use crate::analyzer;
use crate::config::{AgentSpec, CreateGameConfig};
use crate::entities::{
    Action, AgentCatalogEntry, AgentKind, AgentTelemetry, Chips, GameState, HandMemory, PlayerActionRecord, PotView, Seat, SeatId,
    SessionStatus,
};
use crate::error::CoreError;
use crate::phantom;
use crate::rules_engine::RulesEngine;
use crate::session::event_bus::{ErrorKind, Event, EventBus, Subscription};
use crate::validator;

struct SeatRuntime {
    display_name: String,
    agent_kind: AgentKind,
    human_bridge: Option<HumanInputBridge>,
}

enum TurnOutcome {
    Applied,
    HandEnded(GameState),
}

enum BeginOutcome {
    Started,
    Completed(GameState),
}

struct SessionInner {
    game_id: Uuid,
    engine: Mutex<Box<dyn RulesEngine>>,
    seats: Vec<SeatRuntime>,
    expected_total_chips: Chips,
    max_hands: u32,
    debug_mode: bool,
    llm_turn_timeout: Duration,
    llm_gateway: Option<Arc<dyn agents::llm::LlmGateway>>,
    rng: Mutex<SmallRng>,
    /// One seat's memory is the ordered transcript of that seat's own applied
    /// actions this hand — never another seat's. Keyed by seat so no seat's context
    /// or prompt ever sees another seat's history.
    hand_memory: Mutex<HashMap<SeatId, HandMemory>>,
    telemetry: Mutex<Vec<AgentTelemetry>>,
    status: Mutex<SessionStatus>,
    event_bus: EventBus,
    revision: AtomicU64,
    created_at: chrono::DateTime<Utc>,
    updated_at: Mutex<chrono::DateTime<Utc>>,
}

/// Shared handle to one running game. Cloning is cheap (an `Arc` bump); every clone
/// observes the same underlying state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("game_id", &self.inner.game_id).finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        game_id: Uuid,
        config: &CreateGameConfig,
        engine: Box<dyn RulesEngine>,
        llm_gateway: Option<Arc<dyn agents::llm::LlmGateway>>,
        rng_seed: u64,
    ) -> Self {
        let seats = config
            .seats
            .iter()
            .map(|spec| SeatRuntime {
                display_name: spec.display_name().to_string(),
                agent_kind: spec.agent_kind(),
                human_bridge: matches!(spec, AgentSpec::Human { .. })
                    .then(|| HumanInputBridge::new(Duration::from_secs(config.human_turn_timeout_secs))),
            })
            .collect();
        let now = Utc::now();
        let seat_count = config.seats.len();
        Self {
            inner: Arc::new(SessionInner {
                game_id,
                engine: Mutex::new(engine),
                expected_total_chips: config.starting_chips * config.seats.len() as Chips,
                seats,
                max_hands: config.max_hands,
                debug_mode: config.debug_mode,
                llm_turn_timeout: Duration::from_secs(config.llm_turn_timeout_secs),
                llm_gateway,
                rng: Mutex::new(SmallRng::seed_from_u64(rng_seed)),
                hand_memory: Mutex::new(HashMap::new()),
                telemetry: Mutex::new(vec![AgentTelemetry::default(); seat_count]),
                status: Mutex::new(SessionStatus::Waiting),
                event_bus: EventBus::new(config.event_queue_capacity),
                revision: AtomicU64::new(0),
                created_at: now,
                updated_at: Mutex::new(now),
            }),
        }
    }

    #[must_use]
    pub fn game_id(&self) -> Uuid {
        self.inner.game_id
    }

    pub async fn subscribe(&self) -> Subscription {
        self.inner.event_bus.subscribe().await
    }

    /// Per-seat decision-pipeline counters, indexed the same way as `seats` in
    /// [`GameState`]. Reset at session creation only, not per hand.
    pub async fn agent_telemetry(&self) -> Vec<AgentTelemetry> {
        self.inner.telemetry.lock().await.clone()
    }

    /// A read-only snapshot, safe to call at any time.
    pub async fn snapshot(&self) -> GameState {
        let engine = self.inner.engine.lock().await;
        self.snapshot_locked(&**engine).await
    }

    async fn snapshot_locked(&self, engine: &dyn RulesEngine) -> GameState {
        let status = *self.inner.status.lock().await;
        let current_player = engine.current_player();
        let available_actions = current_player.map(|_| engine.get_available_moves().legal).unwrap_or_default();
        let min_raise_amount = current_player.and_then(|_| engine.get_available_moves().raise_range).map(|(min, _)| min);

        let seats = self
            .inner
            .seats
            .iter()
            .enumerate()
            .map(|(id, rt)| Seat {
                player_id: id,
                agent_kind: rt.agent_kind.clone(),
                display_name: rt.display_name.clone(),
                chips: engine.seat_chips(id),
                status: engine.seat_status(id),
            })
            .collect();

        let pots = engine
            .pots()
            .into_iter()
            .map(|p| PotView { pot_id: p.pot_id, total: p.total, eligible: p.eligible.into_iter().collect::<BTreeSet<_>>() })
            .collect();

        GameState {
            game_id: self.inner.game_id,
            revision: self.inner.revision.load(Ordering::Acquire),
            status,
            phase: engine.hand_phase(),
            hand_number: engine.hand_number(),
            max_hands: self.inner.max_hands,
            board: engine.board().to_vec(),
            seats,
            pots,
            current_player,
            available_actions,
            min_raise_amount,
            debug_mode: self.inner.debug_mode,
            created_at: self.inner.created_at,
            updated_at: *self.inner.updated_at.lock().await,
        }
    }

    /// Delivers a human seat's chosen action to whichever turn is currently waiting
    /// on it. The turn-ownership check runs before the human-seat check, so an
    /// out-of-turn proposal for any seat is rejected the same way regardless of that
    /// seat's `agent_kind` — state is never touched on this path.
    pub async fn propose_action(&self, seat: SeatId, action: Action) -> Result<(), CoreError> {
        {
            let engine = self.inner.engine.lock().await;
            if engine.current_player() != Some(seat) {
                return Err(CoreError::OutOfTurn);
            }
        }
        let rt = self.inner.seats.get(seat).ok_or(CoreError::InvalidAction("no such seat".to_string()))?;
        let bridge = rt.human_bridge.as_ref().ok_or(CoreError::InvalidAction("seat is not human-controlled".to_string()))?;
        bridge.submit(action).await.map_err(|e| CoreError::InvalidAction(e.to_string()))
    }

    /// Idempotent trigger to start the next hand. Fails with `NotReady` if a hand is
    /// already in progress. Once started, a hand runs autonomously through every turn
    /// — including waiting on human mailboxes and LLM calls, both of which suspend
    /// this call without blocking other sessions — all the way to `Settle`. If every
    /// seat is non-human, subsequent hands keep dealing automatically within this same
    /// call until the game concludes; a game with any human seat stops after one hand
    /// and waits for the next external `advance()` call.
    pub async fn advance(&self) -> Result<GameState, CoreError> {
        {
            let status = *self.inner.status.lock().await;
            if matches!(status, SessionStatus::Completed | SessionStatus::Error) {
                return Err(CoreError::SessionTerminal);
            }
        }
        {
            let engine = self.inner.engine.lock().await;
            if engine.is_hand_running() {
                log::debug!("session {}: advance() called mid-hand, no-op", self.inner.game_id);
                return Err(CoreError::NotReady);
            }
        }

        if let BeginOutcome::Completed(state) = self.begin_hand().await? {
            return Ok(state);
        }
        loop {
            match self.run_one_turn().await? {
                TurnOutcome::Applied => continue,
                TurnOutcome::HandEnded(state) => {
                    if self.has_human_seat() {
                        return Ok(state);
                    }
                    match self.begin_hand().await? {
                        BeginOutcome::Started => continue,
                        BeginOutcome::Completed(state) => return Ok(state),
                    }
                }
            }
        }
    }

    fn has_human_seat(&self) -> bool {
        self.inner.seats.iter().any(|s| matches!(s.agent_kind, AgentKind::Human))
    }

    /// Runs C1, reasserts chip conservation, then either starts the next hand or
    /// transitions the game to `Completed` and emits `Terminal`. Assumes no hand is
    /// currently running. If conservation still doesn't hold after correction, the
    /// session is fatal: it transitions to `Error` instead of dealing another hand.
    async fn begin_hand(&self) -> Result<BeginOutcome, CoreError> {
        let mut engine = self.inner.engine.lock().await;
        if let Some(correction) = phantom::detect_and_correct(engine.as_mut()) {
            log::warn!("session {}: {correction:?}", self.inner.game_id);
        }
        if !phantom::verify_conservation(&**engine, self.inner.expected_total_chips) {
            log::error!("session {}: chip conservation violated after correction, entering Error", self.inner.game_id);
            *self.inner.status.lock().await = SessionStatus::Error;
            self.inner.revision.fetch_add(1, Ordering::AcqRel);
            let state = self.snapshot_locked(&**engine).await;
            drop(engine);
            self.inner
                .event_bus
                .publish(Event::Error { kind: ErrorKind::PhantomCorrectionFailed, message: "chip conservation violated after phantom-chip correction".to_string() })
                .await;
            self.inner.event_bus.publish(Event::Terminal { final_rankings: vec![] }).await;
            self.inner.event_bus.publish(Event::StateUpdate { revision: state.revision, state: state.clone() }).await;
            return Ok(BeginOutcome::Completed(state));
        }
        let finished = self.inner.max_hands != 0 && engine.hand_number() >= self.inner.max_hands;
        if finished || !engine.is_game_running() {
            *self.inner.status.lock().await = SessionStatus::Completed;
            let rankings = crate::entities::rank_seats(&self.seats_snapshot(&**engine));
            self.inner.revision.fetch_add(1, Ordering::AcqRel);
            let state = self.snapshot_locked(&**engine).await;
            drop(engine);
            self.inner.event_bus.publish(Event::Terminal { final_rankings: rankings }).await;
            self.inner.event_bus.publish(Event::StateUpdate { revision: state.revision, state: state.clone() }).await;
            return Ok(BeginOutcome::Completed(state));
        }
        engine.start_hand().map_err(|e| CoreError::InvalidAction(e.to_string()))?;
        drop(engine);
        self.inner.hand_memory.lock().await.clear();
        *self.inner.status.lock().await = SessionStatus::Running;
        Ok(BeginOutcome::Started)
    }

    /// Drives exactly one seat's decision: build context, dispatch by `agent_kind`,
    /// validate, apply, record, and publish. Returns `HandEnded` (carrying the
    /// post-hand snapshot) once the Rules Engine reports the hand no longer running.
    async fn run_one_turn(&self) -> Result<TurnOutcome, CoreError> {
        let engine = self.inner.engine.lock().await;
        if !engine.is_hand_running() {
            let state = self.snapshot_locked(&**engine).await;
            return Ok(TurnOutcome::HandEnded(state));
        }
        let Some(seat) = engine.current_player() else {
            return Ok(TurnOutcome::Applied);
        };
        let moves = engine.get_available_moves();
        let ctx = self.build_context(&**engine, seat, moves.clone()).await;
        let agent_kind = self.inner.seats[seat].agent_kind.clone();
        drop(engine);

        let mut timed_out = false;
        let decision = match &agent_kind {
            AgentKind::Human => {
                let bridge = self.inner.seats[seat].human_bridge.as_ref().expect("human seat always has a bridge");
                let (decision, outcome) = bridge.await_action(&moves).await;
                if matches!(outcome, crate::agents::human::HumanOutcome::TimedOut) {
                    timed_out = true;
                    self.inner.event_bus.publish(Event::TimeoutAction { seat, action: decision.action }).await;
                }
                decision
            }
            AgentKind::Rule { name } => {
                let personality = rule_based::by_name(name).expect("validated at config time");
                let mut rng = self.inner.rng.lock().await;
                agents::Decision::plain(personality.decide(&ctx, &mut rng))
            }
            AgentKind::Llm { model_id, personality } => {
                let Some(gateway) = self.inner.llm_gateway.as_ref() else {
                    return Err(CoreError::InvalidAction("session has an LLM seat but no gateway was configured".to_string()));
                };
                let fallback_action = if ctx.analysis.chips_to_call == 0 { Action::Check } else { Action::Call };
                match tokio::time::timeout(self.inner.llm_turn_timeout, agents::llm::decide(gateway.as_ref(), &ctx, model_id, personality)).await {
                    Ok(Ok(decision)) => decision,
                    Ok(Err(cause)) => {
                        self.inner
                            .event_bus
                            .publish(Event::Error { kind: ErrorKind::LlmFailure, message: format!("seat {seat} llm call failed: {cause}") })
                            .await;
                        agents::Decision::plain(fallback_action)
                    }
                    Err(_) => {
                        timed_out = true;
                        self.inner
                            .event_bus
                            .publish(Event::Error { kind: ErrorKind::LlmTimeout, message: format!("seat {seat} llm call timed out") })
                            .await;
                        agents::Decision::plain(fallback_action)
                    }
                }
            }
        };

        let validated = validator::validate(seat, decision.action, &moves).map_err(|e| CoreError::InvalidAction(e.to_string()))?;

        let mut engine = self.inner.engine.lock().await;
        let pot_before: Chips = engine.pots().iter().map(|p| p.total).sum();
        engine.take_action(seat, validated.action).map_err(|e| CoreError::InvalidAction(e.to_string()))?;
        let chips_remaining_after = engine.seat_chips(seat);
        let phase = engine.hand_phase();
        *self.inner.updated_at.lock().await = Utc::now();

        self.inner.hand_memory.lock().await.entry(seat).or_default().push(PlayerActionRecord {
            player_id: seat,
            phase,
            action_kind: validated.action.kind(),
            amount: match validated.action {
                Action::Raise { amount } => Some(amount),
                _ => None,
            },
            reasoning: decision.reasoning.clone(),
            confidence: decision.confidence,
            pot_before,
            chips_remaining_after,
        });

        {
            let mut telemetry = self.inner.telemetry.lock().await;
            let entry = &mut telemetry[seat];
            entry.hands_acted += 1;
            if timed_out {
                entry.timeouts += 1;
            }
            if !matches!(validated.resolution, validator::Resolution::Accepted) {
                entry.fallbacks_triggered += 1;
            }
        }

        if let Some(r) = &decision.reasoning {
            log::debug!("session {} seat {seat} reasoning: {r}", self.inner.game_id);
        }
        let (reasoning, confidence) = if self.inner.debug_mode {
            (decision.reasoning.clone(), decision.confidence)
        } else {
            (None, None)
        };

        if let Some(correction) = phantom::detect_and_correct(engine.as_mut()) {
            log::warn!("session {}: {correction:?}", self.inner.game_id);
        }

        self.inner.revision.fetch_add(1, Ordering::AcqRel);
        let state = self.snapshot_locked(&**engine).await;
        drop(engine);

        self.inner
            .event_bus
            .publish(Event::ActionApplied { seat, action: validated.action, reasoning, confidence })
            .await;
        self.inner.event_bus.publish(Event::StateUpdate { revision: state.revision, state: state.clone() }).await;

        if !matches!(validated.resolution, validator::Resolution::Accepted) {
            log::warn!("session {} seat {seat} decision required {:?}", self.inner.game_id, validated.resolution);
        }

        Ok(TurnOutcome::Applied)
    }

    /// Stops the session immediately regardless of `max_hands`, freezing
    /// `final_rankings` at the current chip counts. Idempotent — ending an
    /// already-terminal session is a no-op.
    pub async fn end(&self) -> GameState {
        let mut status = self.inner.status.lock().await;
        if matches!(*status, SessionStatus::Completed | SessionStatus::Error) {
            drop(status);
            return self.snapshot().await;
        }
        *status = SessionStatus::Completed;
        drop(status);

        let engine = self.inner.engine.lock().await;
        let rankings = crate::entities::rank_seats(&self.seats_snapshot(&**engine));
        self.inner.revision.fetch_add(1, Ordering::AcqRel);
        let state = self.snapshot_locked(&**engine).await;
        drop(engine);

        self.inner.event_bus.publish(Event::Terminal { final_rankings: rankings }).await;
        self.inner.event_bus.publish(Event::StateUpdate { revision: state.revision, state: state.clone() }).await;
        state
    }

    fn seats_snapshot(&self, engine: &dyn RulesEngine) -> Vec<Seat> {
        self.inner
            .seats
            .iter()
            .enumerate()
            .map(|(id, rt)| Seat {
                player_id: id,
                agent_kind: rt.agent_kind.clone(),
                display_name: rt.display_name.clone(),
                chips: engine.seat_chips(id),
                status: engine.seat_status(id),
            })
            .collect()
    }

    async fn build_context(&self, engine: &dyn RulesEngine, seat: SeatId, moves: crate::entities::AvailableMoves) -> DecisionContext {
        let pot_total: Chips = engine.pots().iter().map(|p| p.total).sum();
        DecisionContext {
            seat,
            hand_number: engine.hand_number(),
            board: engine.board().to_vec(),
            hole_cards: engine.hand_of(seat),
            pot_total,
            analysis: analyzer::analyze(engine, seat),
            moves,
            memory: self.inner.hand_memory.lock().await.get(&seat).cloned().unwrap_or_default(),
        }
    }
}

/// The catalogue of compiled-in decision sources a caller can pick when building a
/// [`CreateGameConfig`]: one entry per rule-based personality. LLM seats aren't
/// listed here — a model id is an external, caller-supplied identifier rather than
/// one of a compiled-in set, so there is no fixed catalogue of them to enumerate; a
/// human seat isn't a decision source to pick at all. Every listed entry is
/// `available: true` since rule-based personalities have no external dependency
/// that could make them unavailable.
#[must_use]
pub fn list_agents() -> Vec<AgentCatalogEntry> {
    rule_based::PERSONALITY_NAMES
        .iter()
        .map(|&name| AgentCatalogEntry {
            agent_id: name.to_string(),
            kind: "rule".to_string(),
            description: rule_based::description(name).unwrap_or_default().to_string(),
            available: true,
        })
        .collect()
}
