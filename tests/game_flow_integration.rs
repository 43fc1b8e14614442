//! End-to-end scenarios against the public session API: the hand-boundary semantics
//! of `advance()`, turn ownership on `propose_action()`, auto-start for fully
//! autonomous rosters, the event bus's ordering guarantees, and registry GC.

use std::time::Duration;

use holdem_sessions::rules_engine::simple::SimpleEngine;
use holdem_sessions::session::event_bus::Event;
use holdem_sessions::{Action, AgentSpec, CoreError, CreateGameConfig, Session, SessionRegistry, SessionStatus};

fn two_humans(max_hands: u32) -> CreateGameConfig {
    CreateGameConfig {
        seats: vec![
            AgentSpec::Human { display_name: "alice".into() },
            AgentSpec::Human { display_name: "bob".into() },
        ],
        max_hands,
        human_turn_timeout_secs: 5,
        ..CreateGameConfig::default()
    }
}

fn two_rules(max_hands: u32) -> CreateGameConfig {
    CreateGameConfig {
        seats: vec![
            AgentSpec::Rule { display_name: "r1".into(), personality: "call".into() },
            AgentSpec::Rule { display_name: "r2".into(), personality: "call".into() },
        ],
        max_hands,
        ..CreateGameConfig::default()
    }
}

#[tokio::test]
async fn rosters_with_a_human_seat_do_not_auto_start() {
    let registry = SessionRegistry::new(4);
    let engine = Box::new(SimpleEngine::new(2, 1000, 10, 20, 1));
    let game_id = registry.create_game(two_humans(0), engine, None).await.unwrap();
    let session = registry.get(game_id).await.unwrap();
    assert_eq!(session.snapshot().await.status, SessionStatus::Waiting);
}

#[tokio::test]
async fn fully_autonomous_roster_auto_starts_and_completes() {
    let registry = SessionRegistry::new(4);
    let engine = Box::new(SimpleEngine::new(2, 1000, 10, 20, 5));
    let game_id = registry.create_game(two_rules(3), engine, None).await.unwrap();
    let session = registry.get(game_id).await.unwrap();
    let state = session.snapshot().await;
    assert_eq!(state.status, SessionStatus::Completed);
    assert!(state.hand_number >= 1 && state.hand_number <= 3);
    assert!(state.revision > 0);
    let total: u32 = state.seats.iter().map(|s| s.chips).sum::<u32>() + state.pots.iter().map(|p| p.total).sum::<u32>();
    assert_eq!(total, 2000);
}

#[tokio::test]
async fn out_of_turn_proposal_is_rejected_without_touching_state() {
    let registry = SessionRegistry::new(4);
    let engine = Box::new(SimpleEngine::new(2, 1000, 10, 20, 2));
    let game_id = registry.create_game(two_humans(1), engine, None).await.unwrap();
    let session = registry.get(game_id).await.unwrap();

    let advance = session.advance();
    tokio::pin!(advance);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let state_before = session.snapshot().await;
    let actor = state_before.current_player.expect("a human seat should be on the clock");
    let other = 1 - actor;

    assert_eq!(session.propose_action(other, Action::Fold).await.unwrap_err(), CoreError::OutOfTurn);
    let state_after = session.snapshot().await;
    assert_eq!(state_before.revision, state_after.revision);

    session.propose_action(actor, Action::Fold).await.unwrap();
    let final_state = advance.await.unwrap();
    assert_eq!(final_state.status, SessionStatus::Running);
}

#[tokio::test]
async fn advance_errors_not_ready_while_a_hand_is_in_progress() {
    let registry = SessionRegistry::new(4);
    let engine = Box::new(SimpleEngine::new(2, 1000, 10, 20, 4));
    let game_id = registry.create_game(two_humans(0), engine, None).await.unwrap();
    let session = registry.get(game_id).await.unwrap();

    let advance = session.advance();
    tokio::pin!(advance);
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(session.advance().await.unwrap_err(), CoreError::NotReady);

    let actor = session.snapshot().await.current_player.unwrap();
    session.propose_action(actor, Action::Fold).await.unwrap();
    advance.await.unwrap();
}

#[tokio::test]
async fn advance_past_completion_errors_session_terminal() {
    let registry = SessionRegistry::new(4);
    let engine = Box::new(SimpleEngine::new(2, 1000, 10, 20, 6));
    let game_id = registry.create_game(two_humans(1), engine, None).await.unwrap();
    let session = registry.get(game_id).await.unwrap();

    let advance = session.advance();
    tokio::pin!(advance);
    tokio::time::sleep(Duration::from_millis(20)).await;
    let actor = session.snapshot().await.current_player.unwrap();
    session.propose_action(actor, Action::Fold).await.unwrap();
    advance.await.unwrap();

    let final_state = session.advance().await.unwrap();
    assert_eq!(final_state.status, SessionStatus::Completed);
    assert_eq!(session.advance().await.unwrap_err(), CoreError::SessionTerminal);
}

#[tokio::test]
async fn event_bus_reports_monotonic_revisions_and_a_terminal_event() {
    let config = two_rules(1);
    let engine = Box::new(SimpleEngine::new(2, 1000, 10, 20, 9));
    let session = Session::new(uuid::Uuid::new_v4(), &config, engine, None, 1);
    let sub = session.subscribe().await;

    session.advance().await.unwrap();

    let mut last_revision = 0u64;
    let mut saw_terminal = false;
    while let Some(event) = sub.recv().await {
        match event {
            Event::StateUpdate { revision, .. } => {
                assert!(revision >= last_revision, "revisions must never go backwards");
                last_revision = revision;
            }
            Event::Terminal { .. } => saw_terminal = true,
            _ => {}
        }
    }
    assert!(saw_terminal, "a completed game must publish Terminal");
    assert!(last_revision > 0);
}

#[tokio::test]
async fn silent_human_seat_times_out_and_publishes_timeout_action() {
    let config = CreateGameConfig {
        seats: vec![
            AgentSpec::Human { display_name: "alice".into() },
            AgentSpec::Human { display_name: "bob".into() },
        ],
        max_hands: 1,
        human_turn_timeout_secs: 1,
        ..CreateGameConfig::default()
    };
    let engine = Box::new(SimpleEngine::new(2, 1000, 10, 20, 11));
    let session = Session::new(uuid::Uuid::new_v4(), &config, engine, None, 2);
    let sub = session.subscribe().await;

    // Nobody ever calls propose_action; the first actor's turn times out, defaults
    // to Fold (facing the big blind), and ends the hand immediately.
    session.advance().await.unwrap();

    let mut saw_timeout = false;
    while let Some(event) = sub.recv().await {
        if matches!(event, Event::TimeoutAction { action: Action::Fold, .. }) {
            saw_timeout = true;
        }
    }
    assert!(saw_timeout);
}

#[tokio::test]
async fn sweep_evicts_completed_sessions_after_grace_period() {
    let registry = SessionRegistry::with_gc_grace(4, Duration::from_millis(30));
    let engine = Box::new(SimpleEngine::new(2, 1000, 10, 20, 12));
    let game_id = registry.create_game(two_rules(1), engine, None).await.unwrap();
    assert_eq!(registry.get(game_id).await.unwrap().snapshot().await.status, SessionStatus::Completed);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(registry.sweep().await, 1);
    assert_eq!(registry.get(game_id).await.unwrap_err(), CoreError::GameNotFound);
}
