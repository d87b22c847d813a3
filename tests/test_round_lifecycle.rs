mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{GameHarness, T0, config};
use hideseek::frontend::Notification;
use hideseek::game::{GamePhase, GameTask};
use hideseek::observability::EventEmitter;

/// Plays the current round out: catch the hider after `secs`, then wait
/// through planning and hiding so the next round is seeking.
async fn finish_round(h: &mut GameHarness, secs: i64) -> String {
    let hider = h.game.current_player().unwrap().to_string();
    h.clock.advance(secs);
    h.game.hider_caught().await.unwrap();
    assert_eq!(h.game.phase(), GamePhase::Inactive);
    h.advance(600).await;
    assert_eq!(h.game.phase(), GamePhase::HiderPhase);
    h.advance(2700).await;
    assert_eq!(h.game.phase(), GamePhase::SeekerPhase);
    hider
}

// ============================================================================
// Phase timing
// ============================================================================

#[tokio::test]
async fn start_delay_is_honoured() {
    let mut h = GameHarness::with_config(hideseek::config::GameConfig {
        start_delay: 5,
        ..config(&["Ben", "Adam"])
    });
    assert_eq!(h.game.tick().await.fired, 0);
    h.advance(4).await;
    assert_eq!(h.game.phase(), GamePhase::Inactive);
    h.advance(1).await;
    assert_eq!(h.game.phase(), GamePhase::HiderPhase);
    assert_eq!(
        h.frontend.notifications()[0],
        Notification::RoundStart {
            hider: h.game.current_player().unwrap().to_string(),
            hiding_ends_at: T0 + 5 + 2700,
        }
    );
}

#[tokio::test]
async fn late_tick_still_fires_everything_due() {
    let mut h = GameHarness::new();
    // One poll after a long gap runs the start; release is due only after.
    h.clock.advance(10_000);
    let report = h.game.tick().await;
    assert_eq!(report.fired, 1);
    assert_eq!(h.game.phase(), GamePhase::HiderPhase);
    assert_eq!(
        h.game.scheduler().due_of(&GameTask::ReleaseSeekers),
        Some(T0 + 10_000 + 2700)
    );
}

// ============================================================================
// Rotation
// ============================================================================

#[tokio::test]
async fn every_player_hides_before_anyone_repeats() {
    let mut h = GameHarness::with_config(config(&["Ben", "Adam", "Chloe"]));
    h.to_seeking().await;

    let mut hiders = HashSet::new();
    for secs in [100, 200, 300] {
        hiders.insert(finish_round(&mut h, secs).await);
    }
    assert_eq!(hiders.len(), 3);
    assert_eq!(h.game.round(), 4);
}

#[tokio::test]
async fn next_hider_skips_lowest_time_and_last_hider() {
    let mut h = GameHarness::with_config(config(&["Ben", "Adam", "Chloe"]));
    h.to_seeking().await;

    let slowest = finish_round(&mut h, 100).await;
    let middle = finish_round(&mut h, 200).await;
    let last = h.game.current_player().unwrap().to_string();
    h.clock.advance(300);
    h.game.hider_caught().await.unwrap();

    assert_ne!(h.game.next_player(), slowest);
    assert_ne!(h.game.next_player(), last);
    assert_eq!(h.game.next_player(), middle);
}

#[tokio::test]
async fn two_players_fall_back_to_the_other_player() {
    // The last hider is the only one above the minimum, so nobody is both
    // eligible and new; the other player must hide next.
    for seed in 0..8 {
        let mut h = GameHarness::with_config(hideseek::config::GameConfig {
            seed: Some(seed),
            ..config(&["Ben", "Adam"])
        });
        h.to_seeking().await;

        let shorter = finish_round(&mut h, 100).await;
        let longer = h.game.current_player().unwrap().to_string();
        assert_ne!(shorter, longer);
        h.clock.advance(200);
        h.game.hider_caught().await.unwrap();

        assert_eq!(h.game.times()[&shorter], 100);
        assert_eq!(h.game.times()[&longer], 200);
        assert_eq!(h.game.next_player(), shorter, "seed {seed}");
        assert_ne!(h.game.next_player(), longer, "seed {seed}");
    }
}

#[tokio::test]
async fn standings_keep_best_time_sorted() {
    let mut h = GameHarness::new();
    h.to_seeking().await;
    let first = finish_round(&mut h, 900).await;
    let second = finish_round(&mut h, 400).await;

    let standings = h.game.standings();
    assert_eq!(standings, vec![(first, 900), (second, 400)]);

    let notes = h.frontend.notifications();
    let results: Vec<_> = notes
        .iter()
        .filter_map(|n| match n {
            Notification::NextPlayer { last_result, .. } => last_result.clone(),
            _ => None,
        })
        .collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[1].secs, 400);
}

#[tokio::test]
async fn max_seeking_time_is_cancelled_by_a_catch() {
    let mut h = GameHarness::new();
    h.to_seeking().await;
    h.clock.advance(60);
    h.game.hider_caught().await.unwrap();
    h.advance(20_000).await;
    assert_eq!(
        h.frontend
            .count(|n| matches!(n, Notification::SeekingTimeExpired)),
        0
    );
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn round_is_recorded_in_event_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let events = Arc::new(EventEmitter::from_file(&path).unwrap());
    let mut h = GameHarness::with_events(config(&["Ben", "Adam"]), Arc::clone(&events));

    h.to_seeking().await;
    h.game.ask("radar:10km", "").await.unwrap();
    h.clock.advance(30);
    h.game.answered_question("YES").await.unwrap();
    h.clock.advance(30);
    h.game.hider_caught().await.unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let types: Vec<&str> = lines.iter().map(|v| v["type"].as_str().unwrap()).collect();
    assert_eq!(
        types,
        [
            "RoundStarted",
            "SeekersReleased",
            "QuestionAsked",
            "QuestionAnswered",
            "RewardResolved",
            "HiderCaught"
        ]
    );
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line["sequence"].as_u64(), Some(i as u64));
    }
    // Time bonuses kept from the reward count on top of the 60s.
    assert!(lines[5]["round_secs"].as_i64().unwrap() >= 60);
    assert_eq!(events.event_count(), 6);
}
