//! Deferred task scheduler.
//!
//! Work items are tagged with the epoch second at which they become due and
//! are held until the owner polls [`Scheduler::take_due`]. The scheduler never
//! runs anything itself: the game actor drains due items once per tick and
//! dispatches them, so execution is serialized with every other game event.
//!
//! Identity for cancellation is the task value itself. Two tasks that compare
//! equal are the same task as far as [`Scheduler::cancel`] is concerned.

/// A task waiting for its due time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask<T> {
    /// Epoch second at or after which the task fires
    pub due: i64,
    /// The task payload
    pub task: T,
}

/// Ordered collection of pending tasks.
///
/// Insertion order is preserved, so tasks due on the same second fire in the
/// order they were scheduled.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    pending: Vec<ScheduledTask<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<T: PartialEq> Scheduler<T> {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `task` to fire at `due`.
    pub fn schedule(&mut self, due: i64, task: T) {
        self.pending.push(ScheduledTask { due, task });
    }

    /// Removes every pending item equal to `task`.
    ///
    /// Returns the number of items removed. Cancelling a task that is not
    /// pending is a no-op.
    pub fn cancel(&mut self, task: &T) -> usize {
        self.cancel_where(|pending| pending == task)
    }

    /// Removes every pending item matching `pred`.
    pub fn cancel_where<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.pending.len();
        self.pending.retain(|item| !pred(&item.task));
        before - self.pending.len()
    }

    /// Removes and returns every item due at or before `now`, in insertion
    /// order.
    ///
    /// Each item is returned at most once.
    pub fn take_due(&mut self, now: i64) -> Vec<ScheduledTask<T>> {
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|item| item.due <= now);
        self.pending = waiting;
        due
    }

    /// Returns `true` if an item equal to `task` is pending.
    #[must_use]
    pub fn contains(&self, task: &T) -> bool {
        self.pending.iter().any(|item| &item.task == task)
    }

    /// Returns the due time of `task` if it is pending.
    #[must_use]
    pub fn due_of(&self, task: &T) -> Option<i64> {
        self.pending
            .iter()
            .find(|item| &item.task == task)
            .map(|item| item.due)
    }

    /// Earliest due time among pending items.
    #[must_use]
    pub fn next_due(&self) -> Option<i64> {
        self.pending.iter().map(|item| item.due).min()
    }

    /// Number of pending items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Iterates over pending items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledTask<T>> {
        self.pending.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Job {
        Ping,
        Check(u32),
    }

    #[test]
    fn take_due_returns_items_in_insertion_order() {
        let mut sched = Scheduler::new();
        sched.schedule(10, Job::Check(1));
        sched.schedule(5, Job::Ping);
        sched.schedule(10, Job::Check(2));
        sched.schedule(20, Job::Check(3));

        let due: Vec<Job> = sched.take_due(10).into_iter().map(|t| t.task).collect();
        assert_eq!(due, vec![Job::Check(1), Job::Ping, Job::Check(2)]);
        assert_eq!(sched.len(), 1);
        assert_eq!(sched.next_due(), Some(20));
    }

    #[test]
    fn take_due_is_at_most_once() {
        let mut sched = Scheduler::new();
        sched.schedule(1, Job::Ping);
        assert_eq!(sched.take_due(1).len(), 1);
        assert!(sched.take_due(100).is_empty());
    }

    #[test]
    fn nothing_fires_before_due() {
        let mut sched = Scheduler::new();
        sched.schedule(100, Job::Ping);
        assert!(sched.take_due(99).is_empty());
        assert!(sched.contains(&Job::Ping));
    }

    #[test]
    fn cancel_removes_every_equal_item() {
        let mut sched = Scheduler::new();
        sched.schedule(1, Job::Check(7));
        sched.schedule(2, Job::Check(7));
        sched.schedule(3, Job::Check(8));

        assert_eq!(sched.cancel(&Job::Check(7)), 2);
        assert_eq!(sched.cancel(&Job::Check(7)), 0);
        assert_eq!(sched.due_of(&Job::Check(8)), Some(3));
    }

    #[test]
    fn cancel_where_matches_by_kind() {
        let mut sched = Scheduler::new();
        sched.schedule(1, Job::Check(1));
        sched.schedule(1, Job::Ping);
        sched.schedule(1, Job::Check(2));

        let removed = sched.cancel_where(|job| matches!(job, Job::Check(_)));
        assert_eq!(removed, 2);
        assert_eq!(sched.iter().count(), 1);
        assert!(!sched.is_empty());
    }
}
