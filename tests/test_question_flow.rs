mod common;

use common::GameHarness;
use hideseek::error::GameError;
use hideseek::frontend::{Notification, Selection};
use hideseek::game::{Condition, GamePhase};

// ============================================================================
// Deadlines
// ============================================================================

#[tokio::test]
async fn on_time_answer_pays_reward_without_penalty() {
    let mut h = GameHarness::new();
    h.to_seeking().await;

    let deadline = h.game.ask("matching:commercial-airport", "").await.unwrap();
    assert_eq!(deadline, h.now() + 300);
    assert!(h.game.has_condition(Condition::ActiveQuestion));

    h.advance(299).await;
    assert_eq!(h.game.phase(), GamePhase::SeekerPhase);
    let report = h.game.answered_question("YES").await.unwrap();
    assert_eq!(report.penalty, None);
    assert_eq!(report.reward.draws, 1);
    assert_eq!(report.reward.kept.len(), 1);
    assert_eq!(report.reward.returned.len(), 2);

    // The cancelled deadline never fires.
    h.advance(10).await;
    assert_eq!(h.game.phase(), GamePhase::SeekerPhase);
}

#[tokio::test]
async fn missed_deadline_delays_hider_and_voids_reward() {
    let mut h = GameHarness::new();
    h.to_seeking().await;
    h.game.ask("radar:2km", "").await.unwrap();

    h.advance(300).await;
    assert_eq!(h.game.phase(), GamePhase::HiderDelay);
    assert_eq!(h.game.book().pending_multipliers(), vec![0]);

    h.clock.advance(90);
    let report = h.game.answered_question("NO").await.unwrap();
    assert_eq!(report.penalty, Some(90));
    assert_eq!(report.reward.draws, 0);
    assert!(h.game.deck().hand().is_empty());
    assert_eq!(h.game.phase(), GamePhase::SeekerPhase);

    let notes = h.frontend.notifications();
    assert!(notes.contains(&Notification::AnswerRevealed {
        id: "radar:2km".into(),
        answer: "NO".into(),
        penalty: Some(90),
    }));
}

#[tokio::test]
async fn penalty_is_subtracted_from_round_time() {
    let mut h = GameHarness::new();
    h.to_seeking().await;
    h.game.ask("photo:the-sky", "").await.unwrap();
    h.advance(600).await;
    h.clock.advance(120);
    h.game.answered_question("sent").await.unwrap();
    h.clock.advance(280);

    let result = h.game.hider_caught().await.unwrap();
    assert_eq!(result.secs, 1000 - 120);
}

#[tokio::test]
async fn delay_is_cleared_only_by_an_answer() {
    let mut h = GameHarness::new();
    h.to_seeking().await;
    h.game.ask("radar:1km", "").await.unwrap();
    h.advance(300).await;

    let err = h.game.ask("radar:5km", "").await.unwrap_err();
    assert!(matches!(err, GameError::InvalidPhase { .. }));
    h.advance(3600).await;
    assert_eq!(h.game.phase(), GamePhase::HiderDelay);
}

// ============================================================================
// Repeats and identity
// ============================================================================

#[tokio::test]
async fn repeating_a_question_scales_its_reward() {
    let mut h = GameHarness::with_config(hideseek::config::GameConfig {
        hand: hideseek::config::HandConfig { max_hand_size: 20 },
        ..common::config(&["Ben", "Adam"])
    });
    h.to_seeking().await;

    h.game.ask("thermometer:1km", "Central, Redfern").await.unwrap();
    let first = h.game.answered_question("hotter").await.unwrap();
    h.game.ask("thermometer:1km", "Redfern, Newtown").await.unwrap();
    let second = h.game.answered_question("colder").await.unwrap();

    assert_eq!(first.reward.times_answered, 1);
    assert_eq!(second.reward.times_answered, 2);
    assert_eq!(second.reward.draws, 2);
    assert_eq!(h.game.deck().hand().len(), 3);
}

#[tokio::test]
async fn second_ask_of_same_question_needs_second_answer() {
    let mut h = GameHarness::new();
    h.to_seeking().await;
    h.game.ask("matching:zoo", "").await.unwrap();
    h.game.answered_question("NO").await.unwrap();

    // The first answer must not satisfy the second deadline.
    h.game.ask("matching:zoo", "").await.unwrap();
    h.advance(300).await;
    assert_eq!(h.game.phase(), GamePhase::HiderDelay);
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn unknown_question_suggests_a_close_id() {
    let mut h = GameHarness::new();
    h.to_seeking().await;
    let err = h.game.ask("radar:5kn", "").await.unwrap_err();
    assert_eq!(
        err,
        GameError::UnknownQuestion {
            id: "radar:5kn".into(),
            suggestion: Some("radar:5km".into()),
        }
    );
    assert!(!h.game.has_condition(Condition::ActiveQuestion));
}

#[tokio::test]
async fn thermometer_needs_two_places() {
    let mut h = GameHarness::new();
    h.to_seeking().await;
    let err = h.game.ask("thermometer:5km", "Central").await.unwrap_err();
    assert!(matches!(err, GameError::InvalidQuestionInput { .. }));
}

#[tokio::test]
async fn tentacles_options_reach_the_frontend() {
    let mut h = GameHarness::new();
    h.to_seeking().await;
    h.game
        .ask("tentacles:museums", "Art Gallery, Powerhouse")
        .await
        .unwrap();
    assert!(h.frontend.notifications().contains(&Notification::QuestionPosed {
        id: "tentacles:museums".into()
    }));
}

// ============================================================================
// Selections
// ============================================================================

#[tokio::test]
async fn hider_choice_is_kept() {
    let mut h = GameHarness::new();
    h.to_seeking().await;
    h.frontend.push_selection(Selection::Pick(vec![2]));
    h.game.ask("matching:park", "").await.unwrap();
    let report = h.game.answered_question("YES").await.unwrap();

    let offered = h
        .frontend
        .notifications()
        .into_iter()
        .find_map(|n| match n {
            Notification::SelectionRequested { candidates, num, .. } => Some((candidates, num)),
            _ => None,
        })
        .unwrap();
    assert_eq!(offered.1, 1);
    assert_eq!(report.reward.kept[0].name, offered.0[2]);
    assert!(!report.reward.timed_out);
}

#[tokio::test(start_paused = true)]
async fn silent_hider_gets_default_pick() {
    let mut h = GameHarness::new();
    h.to_seeking().await;
    h.frontend.push_selection(Selection::Hang);
    h.game.ask("matching:park", "").await.unwrap();
    let report = h.game.answered_question("YES").await.unwrap();
    assert!(report.reward.timed_out);
    assert_eq!(report.reward.kept.len(), 1);
}

#[tokio::test]
async fn failing_frontend_falls_back() {
    let mut h = GameHarness::new();
    h.to_seeking().await;
    h.frontend.push_selection(Selection::Fail("gone".into()));
    h.game.ask("matching:park", "").await.unwrap();
    let report = h.game.answered_question("YES").await.unwrap();
    assert!(report.reward.timed_out);
    assert_eq!(report.reward.kept.len(), 1);
}
