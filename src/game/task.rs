//! Deferred work the game schedules for itself.

use crate::catalog::QuestionInstance;
use crate::game::conditions::Condition;

/// A scheduled game task.
///
/// Tasks compare by value, which is how superseded tasks are cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameTask {
    /// Begin a hiding round.
    StartRound,
    /// End the hiding phase and release the seekers.
    ReleaseSeekers,
    /// The seekers have used up the maximum seeking time.
    MaxHidingTimeReached,
    /// Deadline for `question`: it must have been answered `expected` times.
    CheckQuestionAnswered {
        /// The question asked
        question: QuestionInstance,
        /// Answer count the question must have reached
        expected: u32,
    },
    /// Auto-expiry of a timed condition.
    ExpireCondition(Condition),
}

impl GameTask {
    /// Stable kind label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::StartRound => "start_round",
            Self::ReleaseSeekers => "release_seekers",
            Self::MaxHidingTimeReached => "max_hiding_time",
            Self::CheckQuestionAnswered { .. } => "check_question",
            Self::ExpireCondition(_) => "expire_condition",
        }
    }

    /// Returns `true` for question deadline checks.
    #[must_use]
    pub const fn is_question_check(&self) -> bool {
        matches!(self, Self::CheckQuestionAnswered { .. })
    }
}
