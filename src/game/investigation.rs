//! Per-round record of the seekers' questions.
//!
//! Answered questions are the only source of hider rewards: each answer
//! pays out the template's reward once per time the question has now been
//! answered, scaled by the next queued multiplier.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tracing::info;

use crate::catalog::{Card, QuestionId, QuestionInstance};
use crate::error::GameError;
use crate::frontend::Frontend;
use crate::game::deck::HiderDeck;

/// What an answer paid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsweredSummary {
    /// The question answered
    pub question: QuestionInstance,
    /// Times the question has been answered this round, this answer included
    pub times_answered: u32,
    /// Multiplier applied to this answer
    pub multiplier: u32,
    /// Reward negotiations run (`times_answered * multiplier`)
    pub draws: u32,
    /// Cards kept across all negotiations
    pub kept: Vec<Card>,
    /// Cards returned to the discard pile
    pub returned: Vec<Card>,
    /// At least one selection fell back to the default pick
    pub timed_out: bool,
}

/// Question bookkeeping for one hiding round.
#[derive(Debug, Default)]
pub struct InvestigationBook {
    current: Option<QuestionInstance>,
    times_answered: HashMap<QuestionId, u32>,
    multipliers: VecDeque<u32>,
}

impl InvestigationBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the question the hider is being asked.
    pub fn set_current_question(&mut self, question: QuestionInstance) {
        self.current = Some(question);
    }

    /// The question being asked, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&QuestionInstance> {
        self.current.as_ref()
    }

    /// Times `id` has been answered this round.
    #[must_use]
    pub fn times_answered(&self, id: &QuestionId) -> u32 {
        self.times_answered.get(id).copied().unwrap_or(0)
    }

    /// Multiplies the next `num_questions` reward multipliers by
    /// `multiplier`, queueing new entries where the queue is shorter.
    pub fn reward_mult(&mut self, multiplier: u32, num_questions: usize) {
        for i in 0..num_questions {
            match self.multipliers.get_mut(i) {
                Some(existing) => *existing *= multiplier,
                None => self.multipliers.push_back(multiplier),
            }
        }
    }

    /// Pending multipliers, next first.
    #[must_use]
    pub fn pending_multipliers(&self) -> Vec<u32> {
        self.multipliers.iter().copied().collect()
    }

    /// Credits an answer to the current question and pays its reward.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NoActiveQuestion`] if no question is current.
    pub async fn question_answered(
        &mut self,
        deck: &mut HiderDeck,
        frontend: &dyn Frontend,
        timeout: Duration,
    ) -> Result<AnsweredSummary, GameError> {
        let question = self.current.take().ok_or(GameError::NoActiveQuestion)?;

        let count = self.times_answered.entry(question.id().clone()).or_insert(0);
        *count += 1;
        let times_answered = *count;
        let multiplier = self.multipliers.pop_front().unwrap_or(1);
        let draws = times_answered * multiplier;

        let reward = question.reward();
        let mut summary = AnsweredSummary {
            question,
            times_answered,
            multiplier,
            draws,
            kept: Vec::new(),
            returned: Vec::new(),
            timed_out: false,
        };

        for _ in 0..draws {
            let outcome = deck.reward(reward.draw, reward.keep, frontend, timeout).await;
            summary.kept.extend(outcome.kept);
            summary.returned.extend(outcome.returned);
            summary.timed_out |= outcome.timed_out;
        }

        info!(
            question = %summary.question.id(),
            times_answered,
            multiplier,
            kept = summary.kept.len(),
            "reward resolved"
        );
        Ok(summary)
    }
}
