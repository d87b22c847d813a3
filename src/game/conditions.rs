//! Temporary status flags on the game.
//!
//! A condition is either present or absent. Adding one may schedule its own
//! expiry and attach a release action that the owner runs when the
//! condition is removed. Adding a condition twice or removing an absent one
//! is a bug in the caller and panics.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::game::task::GameTask;
use crate::scheduler::Scheduler;

/// Status flags the game can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// A question is awaiting an answer.
    ActiveQuestion,
    /// The hider holds too many cards and may only play or discard.
    HandLock,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ActiveQuestion => "active_question",
            Self::HandLock => "hand_lock",
        })
    }
}

/// What the owner does when a condition is lifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleaseAction {
    /// Nothing.
    #[default]
    Noop,
    /// Tell observers the condition cleared.
    AnnounceCleared,
}

/// The set of active conditions and their release actions.
#[derive(Debug, Default)]
pub struct ConditionManager {
    active: IndexMap<Condition, ReleaseAction>,
}

impl ConditionManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates `condition`.
    ///
    /// With a `duration`, an [`GameTask::ExpireCondition`] is scheduled at
    /// `now + duration`.
    ///
    /// # Panics
    ///
    /// Panics if `condition` is already active.
    pub fn add(
        &mut self,
        condition: Condition,
        duration: Option<i64>,
        release: ReleaseAction,
        now: i64,
        scheduler: &mut Scheduler<GameTask>,
    ) {
        assert!(
            !self.active.contains_key(&condition),
            "condition {condition} is already active"
        );
        self.active.insert(condition, release);
        if let Some(secs) = duration {
            scheduler.schedule(now.saturating_add(secs), GameTask::ExpireCondition(condition));
        }
        tracing::debug!(%condition, ?duration, "condition added");
    }

    /// Returns `true` if `condition` is active.
    #[must_use]
    pub fn has(&self, condition: Condition) -> bool {
        self.active.contains_key(&condition)
    }

    /// Lifts `condition`, cancelling a pending expiry, and returns the
    /// release action for the caller to run.
    ///
    /// # Panics
    ///
    /// Panics if `condition` is not active.
    pub fn remove(
        &mut self,
        condition: Condition,
        scheduler: &mut Scheduler<GameTask>,
    ) -> ReleaseAction {
        let Some(release) = self.active.shift_remove(&condition) else {
            panic!("condition {condition} is not active");
        };
        scheduler.cancel(&GameTask::ExpireCondition(condition));
        tracing::debug!(%condition, "condition removed");
        release
    }

    /// Drops every condition without running release actions and cancels
    /// their pending expiries.
    pub fn clear(&mut self, scheduler: &mut Scheduler<GameTask>) {
        scheduler.cancel_where(|task| matches!(task, GameTask::ExpireCondition(_)));
        self.active.clear();
    }

    /// Active conditions in activation order.
    #[must_use]
    pub fn active(&self) -> Vec<Condition> {
        self.active.keys().copied().collect()
    }
}
