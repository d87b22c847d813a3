//! Interaction surfaces.
//!
//! The game core never talks to players directly. It announces what happened
//! through a [`Frontend`] and asks it for card choices. Notifications are
//! awaited before the core proceeds, so a frontend sees them in game order.

pub mod console;
pub mod recording;

use async_trait::async_trait;
use serde::Serialize;

use crate::catalog::{Card, QuestionInstance};
use crate::error::FrontendError;

pub use console::ConsoleFrontend;
pub use recording::{Notification, RecordingFrontend, Selection};

/// Outcome of a finished hiding round, reported with the next hider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundResult {
    /// Player who was hiding
    pub player: String,
    /// Seconds credited for the round, bonuses and penalties included
    pub secs: i64,
}

/// Capability set the game core needs from its interaction surface.
#[async_trait]
pub trait Frontend: Send + Sync {
    /// Asks the hider to keep `num` of `candidates`.
    ///
    /// Returns indices into `candidates`. The caller validates them.
    ///
    /// # Errors
    ///
    /// Returns a [`FrontendError`] when no choice can be obtained.
    async fn select_cards(
        &self,
        candidates: &[Card],
        num: usize,
        reason: &str,
    ) -> Result<Vec<usize>, FrontendError>;

    /// A hiding phase started; seekers are released at `hiding_ends_at`.
    async fn announce_round_start(&self, hider: &str, hiding_ends_at: i64);

    /// Hiding time is over.
    async fn announce_seekers_released(&self);

    /// The seekers asked a question.
    async fn pose_question(&self, question: &QuestionInstance);

    /// The hider missed the deadline for `question`.
    async fn question_time_expired(&self, question: &QuestionInstance);

    /// The hider answered; `penalty` is set for late answers.
    async fn reveal_answer(&self, question: &QuestionInstance, answer: &str, penalty: Option<i64>);

    /// Names the next hider, with the result of the round that just ended.
    async fn announce_next_player(&self, player: &str, last_result: Option<&RoundResult>);

    /// The maximum seeking time elapsed.
    async fn announce_seeking_time_expired(&self);

    /// A curse was cast on the seekers.
    async fn announce_curse(&self, card: &Card);

    /// The hider played a card the seekers must know about.
    async fn announce_card_played(&self, card: &Card);
}
