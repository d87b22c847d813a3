//! Scripted frontend that records every notification.
//!
//! Card selections are answered from a queue of [`Selection`]s; once the
//! queue is empty the first `num` candidates are picked.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Frontend, RoundResult};
use crate::catalog::{Card, QuestionInstance};
use crate::error::FrontendError;

/// Something the game told the frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// `announce_round_start`
    RoundStart {
        /// Hider for the round
        hider: String,
        /// When seekers are released
        hiding_ends_at: i64,
    },
    /// `announce_seekers_released`
    SeekersReleased,
    /// `pose_question`
    QuestionPosed {
        /// Template id
        id: String,
    },
    /// `question_time_expired`
    QuestionExpired {
        /// Template id
        id: String,
    },
    /// `reveal_answer`
    AnswerRevealed {
        /// Template id
        id: String,
        /// Answer text
        answer: String,
        /// Late penalty in seconds
        penalty: Option<i64>,
    },
    /// `announce_next_player`
    NextPlayer {
        /// Next hider
        player: String,
        /// Result of the round that ended
        last_result: Option<RoundResult>,
    },
    /// `announce_seeking_time_expired`
    SeekingTimeExpired,
    /// `announce_curse`
    Curse {
        /// Card name
        card: String,
    },
    /// `announce_card_played`
    CardPlayed {
        /// Card name
        card: String,
    },
    /// `select_cards` was called
    SelectionRequested {
        /// Offered card names
        candidates: Vec<String>,
        /// How many to keep
        num: usize,
        /// Why the selection was requested
        reason: String,
    },
}

/// Scripted answer to a card selection.
#[derive(Debug, Clone)]
pub enum Selection {
    /// Return these indices
    Pick(Vec<usize>),
    /// Fail with [`FrontendError::Closed`]
    Fail(String),
    /// Never answer (exercises the selection timeout)
    Hang,
}

/// Frontend that records notifications for later inspection.
#[derive(Debug, Default)]
pub struct RecordingFrontend {
    log: Mutex<Vec<Notification>>,
    script: Mutex<VecDeque<Selection>>,
}

impl RecordingFrontend {
    /// Creates a frontend with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the answer to a future selection.
    pub fn push_selection(&self, selection: Selection) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(selection);
        }
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Recorded notifications, draining the log.
    #[must_use]
    pub fn take_notifications(&self) -> Vec<Notification> {
        self.log
            .lock()
            .map(|mut log| std::mem::take(&mut *log))
            .unwrap_or_default()
    }

    /// Number of recorded notifications matching `pred`.
    pub fn count<F>(&self, pred: F) -> usize
    where
        F: Fn(&Notification) -> bool,
    {
        self.log
            .lock()
            .map(|log| log.iter().filter(|n| pred(n)).count())
            .unwrap_or(0)
    }

    fn record(&self, notification: Notification) {
        if let Ok(mut log) = self.log.lock() {
            log.push(notification);
        }
    }

    fn next_selection(&self) -> Option<Selection> {
        self.script.lock().ok().and_then(|mut s| s.pop_front())
    }
}

#[async_trait]
impl Frontend for RecordingFrontend {
    async fn select_cards(
        &self,
        candidates: &[Card],
        num: usize,
        reason: &str,
    ) -> Result<Vec<usize>, FrontendError> {
        self.record(Notification::SelectionRequested {
            candidates: candidates.iter().map(|c| c.name.clone()).collect(),
            num,
            reason: reason.to_string(),
        });
        match self.next_selection() {
            Some(Selection::Pick(indices)) => Ok(indices),
            Some(Selection::Fail(message)) => Err(FrontendError::Closed(message)),
            Some(Selection::Hang) => std::future::pending().await,
            None => Ok((0..num.min(candidates.len())).collect()),
        }
    }

    async fn announce_round_start(&self, hider: &str, hiding_ends_at: i64) {
        self.record(Notification::RoundStart {
            hider: hider.to_string(),
            hiding_ends_at,
        });
    }

    async fn announce_seekers_released(&self) {
        self.record(Notification::SeekersReleased);
    }

    async fn pose_question(&self, question: &QuestionInstance) {
        self.record(Notification::QuestionPosed {
            id: question.id().to_string(),
        });
    }

    async fn question_time_expired(&self, question: &QuestionInstance) {
        self.record(Notification::QuestionExpired {
            id: question.id().to_string(),
        });
    }

    async fn reveal_answer(&self, question: &QuestionInstance, answer: &str, penalty: Option<i64>) {
        self.record(Notification::AnswerRevealed {
            id: question.id().to_string(),
            answer: answer.to_string(),
            penalty,
        });
    }

    async fn announce_next_player(&self, player: &str, last_result: Option<&RoundResult>) {
        self.record(Notification::NextPlayer {
            player: player.to_string(),
            last_result: last_result.cloned(),
        });
    }

    async fn announce_seeking_time_expired(&self) {
        self.record(Notification::SeekingTimeExpired);
    }

    async fn announce_curse(&self, card: &Card) {
        self.record(Notification::Curse {
            card: card.name.clone(),
        });
    }

    async fn announce_card_played(&self, card: &Card) {
        self.record(Notification::CardPlayed {
            card: card.name.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards() -> Vec<Card> {
        vec![Card::time_bonus(3), Card::time_bonus(6), Card::time_bonus(9)]
    }

    #[tokio::test]
    async fn default_selection_picks_first() {
        let frontend = RecordingFrontend::new();
        let picked = frontend.select_cards(&cards(), 2, "test").await.unwrap();
        assert_eq!(picked, vec![0, 1]);
        assert_eq!(
            frontend.count(|n| matches!(n, Notification::SelectionRequested { num: 2, .. })),
            1
        );
    }

    #[tokio::test]
    async fn scripted_selections_in_order() {
        let frontend = RecordingFrontend::new();
        frontend.push_selection(Selection::Pick(vec![2]));
        frontend.push_selection(Selection::Fail("gone".into()));

        assert_eq!(frontend.select_cards(&cards(), 1, "a").await.unwrap(), vec![2]);
        assert!(frontend.select_cards(&cards(), 1, "b").await.is_err());
        assert_eq!(frontend.select_cards(&cards(), 1, "c").await.unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn hang_never_resolves() {
        let frontend = RecordingFrontend::new();
        frontend.push_selection(Selection::Hang);
        let result = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            frontend.select_cards(&cards(), 1, "slow"),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn notifications_are_drained() {
        let frontend = RecordingFrontend::new();
        frontend.announce_seekers_released().await;
        frontend.announce_seeking_time_expired().await;
        assert_eq!(frontend.take_notifications().len(), 2);
        assert!(frontend.notifications().is_empty());
    }
}
