mod common;

use std::sync::Arc;

use common::{GameHarness, config};
use hideseek::config::{GameConfig, HandConfig};
use hideseek::error::GameError;
use hideseek::game::{Condition, GamePhase};
use hideseek::observability::EventEmitter;

fn tiny_hand() -> GameConfig {
    GameConfig {
        hand: HandConfig { max_hand_size: 1 },
        ..config(&["Ben", "Adam"])
    }
}

/// Answers two radar questions so the hider holds two cards with a limit
/// of one.
async fn overfill(h: &mut GameHarness) {
    h.to_seeking().await;
    h.game.ask("radar:5km", "").await.unwrap();
    let first = h.game.answered_question("YES").await.unwrap();
    assert!(!first.hand_locked);
    assert!(!h.game.has_condition(Condition::HandLock));

    h.game.ask("radar:10km", "").await.unwrap();
    let second = h.game.answered_question("YES").await.unwrap();
    assert!(second.hand_locked);
    assert_eq!(h.game.deck().hand().len(), 2);
}

#[tokio::test]
async fn over_limit_hand_blocks_answers() {
    let mut h = GameHarness::with_config(tiny_hand());
    overfill(&mut h).await;
    assert!(h.game.has_condition(Condition::HandLock));

    h.game.ask("radar:15km", "").await.unwrap();
    let err = h.game.answered_question("NO").await.unwrap_err();
    assert_eq!(
        err,
        GameError::HandSizeExceeded {
            hand_size: 2,
            max_hand_size: 1
        }
    );
    // The question stays pending.
    assert!(h.game.has_condition(Condition::ActiveQuestion));
}

#[tokio::test]
async fn discarding_down_lifts_the_lock() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let events = Arc::new(EventEmitter::from_file(&path).unwrap());
    let mut h = GameHarness::with_events(tiny_hand(), events);
    overfill(&mut h).await;

    h.game.ask("radar:15km", "").await.unwrap();
    let discarded = h.game.discard_card("1").unwrap();
    assert!(!h.game.has_condition(Condition::HandLock));
    assert_eq!(h.game.deck().hand().len(), 1);
    assert!(!discarded.name.is_empty());

    h.game.answered_question("NO").await.unwrap();
    assert_eq!(h.game.phase(), GamePhase::SeekerPhase);

    let text = std::fs::read_to_string(&path).unwrap();
    let cleared = text
        .lines()
        .filter(|l| l.contains("\"ConditionCleared\"") && l.contains("hand_lock"))
        .count();
    assert_eq!(cleared, 1);
}

#[tokio::test]
async fn lock_survives_a_partial_discard() {
    let mut h = GameHarness::with_config(tiny_hand());
    h.to_seeking().await;
    h.game.ask("radar:5km", "").await.unwrap();
    h.game.answered_question("YES").await.unwrap();
    h.game
        .ask("tentacles:museums", "Art Gallery, Powerhouse")
        .await
        .unwrap();
    let report = h.game.answered_question("Powerhouse").await.unwrap();
    assert_eq!(report.reward.kept.len(), 2);
    assert_eq!(h.game.deck().hand().len(), 3);

    h.game.discard_card("1").unwrap();
    assert!(h.game.has_condition(Condition::HandLock));
    h.game.discard_card("1").unwrap();
    assert!(!h.game.has_condition(Condition::HandLock));
}

#[tokio::test]
async fn unknown_card_is_not_playable() {
    let mut h = GameHarness::with_config(tiny_hand());
    overfill(&mut h).await;
    let err = h.game.play_card("Card That Does Not Exist").await.unwrap_err();
    assert!(matches!(err, GameError::CardNotPlayable { .. }));
    assert!(h.game.has_condition(Condition::HandLock));
}

#[tokio::test]
async fn catching_clears_the_lock() {
    let mut h = GameHarness::with_config(tiny_hand());
    overfill(&mut h).await;
    h.game.hider_caught().await.unwrap();
    assert!(!h.game.has_condition(Condition::HandLock));
    assert!(h.game.snapshot().conditions.is_empty());
}
