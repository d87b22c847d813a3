//! The game phase machine.
//!
//! [`GameState`] owns the scheduler, conditions, investigation book and deck
//! of a single game. It reacts to player commands and to scheduler ticks,
//! validates each against the current phase and conditions, mutates its
//! parts, schedules follow-up work and tells the frontend what happened.
//!
//! All methods take `&mut self`: the runtime host serializes every command
//! and tick through one owner, so no locking happens here.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{Card, QuestionCatalog, QuestionInstance};
use crate::clock::Clock;
use crate::config::GameConfig;
use crate::error::GameError;
use crate::frontend::{Frontend, RoundResult};
use crate::game::conditions::{Condition, ConditionManager, ReleaseAction};
use crate::game::deck::{HiderDeck, PlayOutcome};
use crate::game::investigation::{AnsweredSummary, InvestigationBook};
use crate::game::task::GameTask;
use crate::observability::events::{Event, EventEmitter, timestamp_at};
use crate::observability::metrics;
use crate::scheduler::Scheduler;

// ============================================================================
// Phases
// ============================================================================

/// Phases of a hiding round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Between rounds.
    Inactive,
    /// The hider is getting away; seekers wait.
    HiderPhase,
    /// Seekers are out asking questions.
    SeekerPhase,
    /// A question deadline passed and the hider is accruing a penalty.
    HiderDelay,
}

impl GamePhase {
    /// Short label used for metrics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::HiderPhase => "hiding",
            Self::SeekerPhase => "seeking",
            Self::HiderDelay => "delay",
        }
    }

    const fn is_seeking(self) -> bool {
        matches!(self, Self::SeekerPhase | Self::HiderDelay)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inactive => "inactive phase",
            Self::HiderPhase => "hiding phase",
            Self::SeekerPhase => "seeking phase",
            Self::HiderDelay => "hider delay",
        })
    }
}

// ============================================================================
// Reports
// ============================================================================

/// What one scheduler tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tasks that ran successfully
    pub fired: usize,
    /// Tasks that returned an error
    pub failed: usize,
}

/// Result of answering a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerReport {
    /// Late penalty in seconds, when the answer came during a delay
    pub penalty: Option<i64>,
    /// Reward paid out
    pub reward: AnsweredSummary,
    /// The hand is over the limit and `HandLock` stays active
    pub hand_locked: bool,
}

/// Read-only view of the game for status displays.
#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    /// Current game-clock time
    pub now: i64,
    /// Current phase
    pub phase: GamePhase,
    /// One-based round number (0 before the first round)
    pub round: u32,
    /// Player hiding this round
    pub current_player: Option<String>,
    /// Player who hides next
    pub next_player: String,
    /// Cards in hand
    pub hand: Vec<Card>,
    /// Current hand limit
    pub max_hand_size: usize,
    /// Cards left to draw
    pub draw_pile: usize,
    /// Cards in the discard pile
    pub discard_pile: usize,
    /// Active conditions
    pub conditions: Vec<Condition>,
    /// Question awaiting an answer
    pub current_question: Option<String>,
    /// Net time bonus accrued this round, excluding cards in hand
    pub hider_time_bonus: i64,
    /// Pending scheduled tasks as `(due, kind)`
    pub pending_tasks: Vec<(i64, String)>,
    /// Best hiding time per player
    pub times: IndexMap<String, i64>,
}

// ============================================================================
// Game State
// ============================================================================

/// Orchestrator of a single game.
pub struct GameState {
    config: Arc<GameConfig>,
    catalog: Arc<QuestionCatalog>,
    phase: GamePhase,
    players: Vec<String>,
    current_player: Option<String>,
    next_player: String,
    times: IndexMap<String, i64>,
    hide_time_start: i64,
    delay_start: Option<i64>,
    hider_time_bonus: i64,
    round: u32,
    scheduler: Scheduler<GameTask>,
    conditions: ConditionManager,
    book: InvestigationBook,
    deck: HiderDeck,
    rng: StdRng,
    frontend: Arc<dyn Frontend>,
    clock: Arc<dyn Clock>,
    events: Arc<EventEmitter>,
}

impl fmt::Debug for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameState")
            .field("phase", &self.phase)
            .field("round", &self.round)
            .field("current_player", &self.current_player)
            .field("next_player", &self.next_player)
            .field("pending_tasks", &self.scheduler.len())
            .finish_non_exhaustive()
    }
}

impl GameState {
    /// Creates a game whose first round starts `config.start_delay` seconds
    /// from now.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NoPlayers`] if the player list is empty.
    pub fn new(
        config: Arc<GameConfig>,
        frontend: Arc<dyn Frontend>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GameError> {
        if config.players.is_empty() {
            return Err(GameError::NoPlayers);
        }

        let mut rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let deck = HiderDeck::standard(
            config.hand.max_hand_size,
            StdRng::seed_from_u64(rng.random()),
        );
        let now = clock.now();

        let mut game = Self {
            catalog: Arc::new(QuestionCatalog::standard(&config)),
            players: config.players.clone(),
            phase: GamePhase::Inactive,
            current_player: None,
            next_player: String::new(),
            times: IndexMap::new(),
            hide_time_start: 0,
            delay_start: None,
            hider_time_bonus: 0,
            round: 0,
            scheduler: Scheduler::new(),
            conditions: ConditionManager::new(),
            book: InvestigationBook::new(),
            deck,
            rng,
            frontend,
            clock,
            events: Arc::new(EventEmitter::noop()),
            config,
        };
        game.scheduler
            .schedule(now.saturating_add(game.config.start_delay), GameTask::StartRound);
        game.next_player = game.pick_next_player(None);
        metrics::set_current_phase(GamePhase::Inactive.label(), None);
        Ok(game)
    }

    /// Routes structured events to `events`.
    #[must_use]
    pub fn with_events(mut self, events: Arc<EventEmitter>) -> Self {
        self.events = events;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current game-clock time.
    #[must_use]
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    /// The configuration this game runs with.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Shared question catalog.
    #[must_use]
    pub fn catalog(&self) -> Arc<QuestionCatalog> {
        Arc::clone(&self.catalog)
    }

    /// Player hiding this round.
    #[must_use]
    pub fn current_player(&self) -> Option<&str> {
        self.current_player.as_deref()
    }

    /// Player who hides next.
    #[must_use]
    pub fn next_player(&self) -> &str {
        &self.next_player
    }

    /// Best recorded hiding time per player.
    #[must_use]
    pub const fn times(&self) -> &IndexMap<String, i64> {
        &self.times
    }

    /// Players sorted by best time, longest first.
    #[must_use]
    pub fn standings(&self) -> Vec<(String, i64)> {
        let mut standings: Vec<(String, i64)> =
            self.times.iter().map(|(p, t)| (p.clone(), *t)).collect();
        standings.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        standings
    }

    /// Net time bonus for the current round.
    #[must_use]
    pub const fn hider_time_bonus(&self) -> i64 {
        self.hider_time_bonus
    }

    /// The hider's deck.
    #[must_use]
    pub const fn deck(&self) -> &HiderDeck {
        &self.deck
    }

    /// Question bookkeeping for the round.
    #[must_use]
    pub const fn book(&self) -> &InvestigationBook {
        &self.book
    }

    /// Returns `true` if `condition` is active.
    #[must_use]
    pub fn has_condition(&self, condition: Condition) -> bool {
        self.conditions.has(condition)
    }

    /// Pending scheduled work.
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler<GameTask> {
        &self.scheduler
    }

    /// One-based round number.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Builds a status snapshot.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            now: self.clock.now(),
            phase: self.phase,
            round: self.round,
            current_player: self.current_player.clone(),
            next_player: self.next_player.clone(),
            hand: self.deck.hand().to_vec(),
            max_hand_size: self.deck.max_hand_size(),
            draw_pile: self.deck.draw_pile_len(),
            discard_pile: self.deck.discard_pile_len(),
            conditions: self.conditions.active(),
            current_question: self.book.current().map(|q| q.id().to_string()),
            hider_time_bonus: self.hider_time_bonus,
            pending_tasks: self
                .scheduler
                .iter()
                .map(|t| (t.due, t.task.kind().to_string()))
                .collect(),
            times: self.times.clone(),
        }
    }

    // ========================================================================
    // Scheduler Heartbeat
    // ========================================================================

    /// Runs every scheduled task that is due.
    ///
    /// A failing task is logged and reported; the remaining due tasks still
    /// run.
    pub async fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        let due = self.scheduler.take_due(self.clock.now());
        for item in due {
            let kind = item.task.kind();
            match self.run_task(item.task).await {
                Ok(()) => {
                    report.fired += 1;
                    metrics::record_task(kind, true);
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(task = kind, error = %e, "scheduled task failed");
                    metrics::record_task(kind, false);
                    metrics::record_error("task");
                    self.emit(|timestamp| Event::TaskFailed {
                        timestamp,
                        task: kind.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }

    async fn run_task(&mut self, task: GameTask) -> Result<(), GameError> {
        match task {
            GameTask::StartRound => self.start_round().await,
            GameTask::ReleaseSeekers => self.release_seekers().await,
            GameTask::MaxHidingTimeReached => self.max_hiding_time_reached().await,
            GameTask::CheckQuestionAnswered { question, expected } => {
                self.check_question_answered(question, expected).await
            }
            GameTask::ExpireCondition(condition) => {
                self.expire_condition(condition);
                Ok(())
            }
        }
    }

    /// Tells the frontend who hides in the opening round.
    ///
    /// Hosts call this once when the game starts; later hiders are announced
    /// when the previous one is caught.
    pub async fn announce_first_hider(&self) {
        info!(next_hider = %self.next_player, "first hider chosen");
        self.frontend
            .announce_next_player(&self.next_player, None)
            .await;
    }

    // ========================================================================
    // Scheduled Transitions
    // ========================================================================

    async fn start_round(&mut self) -> Result<(), GameError> {
        self.require(|p| p == GamePhase::Inactive, "start a round")?;
        let now = self.clock.now();

        self.scheduler.cancel(&GameTask::StartRound);
        self.scheduler.cancel_where(GameTask::is_question_check);
        self.conditions.clear(&mut self.scheduler);
        self.book = InvestigationBook::new();
        self.deck = HiderDeck::standard(
            self.config.hand.max_hand_size,
            StdRng::seed_from_u64(self.rng.random()),
        );
        self.delay_start = None;

        let hider = self.next_player.clone();
        self.current_player = Some(hider.clone());
        self.round += 1;
        self.set_phase(GamePhase::HiderPhase);

        let hiding_ends_at = now.saturating_add(self.config.timing.hiding_time);
        self.scheduler
            .schedule(hiding_ends_at, GameTask::ReleaseSeekers);

        info!(round = self.round, hider = %hider, hiding_ends_at, "round started");
        metrics::record_round_started();
        metrics::set_hand_size(0);
        let round = self.round;
        self.emit(|timestamp| Event::RoundStarted {
            timestamp,
            round,
            hider: hider.clone(),
            seekers_released_at: hiding_ends_at,
        });
        self.frontend
            .announce_round_start(&hider, hiding_ends_at)
            .await;
        Ok(())
    }

    async fn release_seekers(&mut self) -> Result<(), GameError> {
        self.require(|p| p == GamePhase::HiderPhase, "release the seekers")?;
        let now = self.clock.now();

        self.set_phase(GamePhase::SeekerPhase);
        self.hide_time_start = now;
        self.hider_time_bonus = 0;
        self.scheduler.schedule(
            now.saturating_add(self.config.timing.max_seeking_time),
            GameTask::MaxHidingTimeReached,
        );

        let hider = self.current_player.clone().unwrap_or_default();
        info!(round = self.round, hider = %hider, "seekers released");
        let round = self.round;
        self.emit(|timestamp| Event::SeekersReleased {
            timestamp,
            round,
            hider: hider.clone(),
        });
        self.frontend.announce_seekers_released().await;
        Ok(())
    }

    async fn max_hiding_time_reached(&mut self) -> Result<(), GameError> {
        self.require(GamePhase::is_seeking, "end the seeking time")?;
        let hider = self.current_player.clone().unwrap_or_default();
        info!(hider = %hider, "maximum seeking time reached");
        self.emit(|timestamp| Event::SeekingTimeExpired {
            timestamp,
            hider: hider.clone(),
        });
        self.frontend.announce_seeking_time_expired().await;
        Ok(())
    }

    async fn check_question_answered(
        &mut self,
        question: QuestionInstance,
        expected: u32,
    ) -> Result<(), GameError> {
        self.require(GamePhase::is_seeking, "check a question deadline")?;
        if self.book.times_answered(question.id()) >= expected {
            debug!(question = %question.id(), "question answered in time");
            return Ok(());
        }

        let now = self.clock.now();
        if self.phase != GamePhase::HiderDelay {
            self.delay_start = Some(now);
        }
        self.set_phase(GamePhase::HiderDelay);
        self.book.reward_mult(0, 1);
        self.book.set_current_question(question.clone());

        info!(question = %question.id(), "question time expired, hider delayed");
        metrics::record_question(question.template.family.as_str(), "expired");
        self.emit(|timestamp| Event::QuestionExpired {
            timestamp,
            question_id: question.id().to_string(),
        });
        self.frontend.question_time_expired(&question).await;
        Ok(())
    }

    fn expire_condition(&mut self, condition: Condition) {
        if !self.conditions.has(condition) {
            debug!(%condition, "condition already lifted");
            return;
        }
        let release = self.conditions.remove(condition, &mut self.scheduler);
        self.run_release(condition, release);
    }

    // ========================================================================
    // Player Commands
    // ========================================================================

    /// Resolves `id` in the catalog, binds `input` and asks it.
    ///
    /// # Errors
    ///
    /// Same as [`GameState::ask_question`], plus catalog lookup and input
    /// validation errors.
    pub async fn ask(&mut self, id: &str, input: &str) -> Result<i64, GameError> {
        let question = self.catalog.bind(id, input)?;
        self.ask_question(question).await
    }

    /// The seekers ask `question`. Returns the answer deadline.
    ///
    /// # Errors
    ///
    /// - [`GameError::InvalidPhase`] outside the seeking phase
    /// - [`GameError::QuestionActive`] while another question is pending
    pub async fn ask_question(&mut self, question: QuestionInstance) -> Result<i64, GameError> {
        self.require(|p| p == GamePhase::SeekerPhase, "ask a question")?;
        if self.conditions.has(Condition::ActiveQuestion) {
            return Err(GameError::QuestionActive);
        }
        let now = self.clock.now();

        self.conditions.add(
            Condition::ActiveQuestion,
            None,
            ReleaseAction::Noop,
            now,
            &mut self.scheduler,
        );
        self.book.set_current_question(question.clone());
        let expected = self.book.times_answered(question.id()) + 1;
        let deadline = now.saturating_add(question.allocated_time());
        self.scheduler.schedule(
            deadline,
            GameTask::CheckQuestionAnswered {
                question: question.clone(),
                expected,
            },
        );

        let family = question.template.family.as_str();
        info!(question = %question.id(), deadline, "question asked");
        metrics::record_question(family, "asked");
        self.emit(|timestamp| Event::QuestionAsked {
            timestamp,
            question_id: question.id().to_string(),
            family: family.to_string(),
            deadline,
        });
        self.frontend.pose_question(&question).await;
        Ok(deadline)
    }

    /// The hider answers the pending question.
    ///
    /// Lifts `ActiveQuestion`, settles any delay penalty and pays the
    /// reward. `HandLock` is held while the reward is negotiated and stays
    /// active if the hand ends over the limit.
    ///
    /// # Errors
    ///
    /// - [`GameError::InvalidPhase`] outside the seeking phases
    /// - [`GameError::HandSizeExceeded`] while `HandLock` is active
    /// - [`GameError::NoActiveQuestion`] when nothing is pending
    pub async fn answered_question(&mut self, answer: &str) -> Result<AnswerReport, GameError> {
        self.require(GamePhase::is_seeking, "answer a question")?;
        if self.conditions.has(Condition::HandLock) {
            return Err(self.hand_size_exceeded());
        }
        if !self.conditions.has(Condition::ActiveQuestion) {
            return Err(GameError::NoActiveQuestion);
        }
        let question = self
            .book
            .current()
            .cloned()
            .ok_or(GameError::NoActiveQuestion)?;
        let now = self.clock.now();

        let release = self
            .conditions
            .remove(Condition::ActiveQuestion, &mut self.scheduler);
        self.run_release(Condition::ActiveQuestion, release);
        self.scheduler.cancel_where(GameTask::is_question_check);

        let penalty = if self.phase == GamePhase::HiderDelay {
            let penalty = self.settle_delay(now);
            self.set_phase(GamePhase::SeekerPhase);
            Some(penalty)
        } else {
            None
        };

        info!(question = %question.id(), answer, ?penalty, "question answered");
        metrics::record_question(question.template.family.as_str(), "answered");
        self.emit(|timestamp| Event::QuestionAnswered {
            timestamp,
            question_id: question.id().to_string(),
            answer: answer.to_string(),
            penalty_secs: penalty,
        });
        self.frontend.reveal_answer(&question, answer, penalty).await;

        // Held while the reward is negotiated.
        self.conditions.add(
            Condition::HandLock,
            None,
            ReleaseAction::Noop,
            now,
            &mut self.scheduler,
        );
        let timeout = self.selection_timeout();
        let reward = self
            .book
            .question_answered(&mut self.deck, self.frontend.as_ref(), timeout)
            .await;
        self.conditions
            .remove(Condition::HandLock, &mut self.scheduler);
        let reward = reward?;

        let hand_locked = !self.deck.is_legal_hand();
        if hand_locked {
            warn!(
                hand = self.deck.hand().len(),
                max = self.deck.max_hand_size(),
                "hand over the limit; hider must play or discard"
            );
            self.conditions.add(
                Condition::HandLock,
                None,
                ReleaseAction::AnnounceCleared,
                now,
                &mut self.scheduler,
            );
        }

        metrics::record_cards("kept", reward.kept.len() as u64);
        metrics::record_cards("returned", reward.returned.len() as u64);
        metrics::set_hand_size(self.deck.hand().len());
        self.emit(|timestamp| Event::RewardResolved {
            timestamp,
            question_id: reward.question.id().to_string(),
            draws: reward.draws,
            kept: reward.kept.iter().map(|c| c.name.clone()).collect(),
            timed_out: reward.timed_out,
        });

        Ok(AnswerReport {
            penalty,
            reward,
            hand_locked,
        })
    }

    /// The seekers caught the hider.
    ///
    /// Records the round time, picks the next hider and schedules the next
    /// round after the planning time.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidPhase`] outside the seeking phases.
    pub async fn hider_caught(&mut self) -> Result<RoundResult, GameError> {
        self.require(GamePhase::is_seeking, "catch the hider")?;
        let now = self.clock.now();

        if self.phase == GamePhase::HiderDelay {
            self.settle_delay(now);
        }
        self.hider_time_bonus += self.deck.count_time_bonuses();

        let player = self.current_player.clone().unwrap_or_default();
        let secs = now - self.hide_time_start + self.hider_time_bonus;
        let best = self.times.get(&player).copied();
        if best.is_none_or(|previous| secs > previous) {
            self.times.insert(player.clone(), secs);
        }
        let best = best.map_or(secs, |previous| previous.max(secs));

        self.next_player = self.pick_next_player(Some(&player));
        self.scheduler.cancel(&GameTask::MaxHidingTimeReached);
        self.scheduler.cancel_where(GameTask::is_question_check);
        self.conditions.clear(&mut self.scheduler);
        self.set_phase(GamePhase::Inactive);
        self.scheduler.schedule(
            now.saturating_add(self.config.timing.planning_time),
            GameTask::StartRound,
        );

        let result = RoundResult {
            player: player.clone(),
            secs,
        };
        info!(hider = %player, secs, best, next = %self.next_player, "hider caught");
        let next_hider = self.next_player.clone();
        self.emit(|timestamp| Event::HiderCaught {
            timestamp,
            hider: player.clone(),
            round_secs: secs,
            best_secs: best,
            next_hider: next_hider.clone(),
        });
        self.frontend
            .announce_next_player(&next_hider, Some(&result))
            .await;
        Ok(result)
    }

    /// The hider plays a card from hand.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidPhase`] outside the seeking phases and
    /// [`GameError::CardNotPlayable`] when the deck refuses the card.
    pub async fn play_card(&mut self, name: &str) -> Result<PlayOutcome, GameError> {
        self.require(GamePhase::is_seeking, "play a card")?;
        let timeout = self.selection_timeout();
        let outcome = self
            .deck
            .play(name, self.frontend.as_ref(), timeout)
            .await?;

        info!(
            card = %outcome.card,
            discarded = outcome.discarded.len(),
            drawn = outcome.drawn.len(),
            "card played"
        );
        metrics::record_cards("played", 1);
        metrics::record_cards("discarded", outcome.discarded.len() as u64);
        metrics::record_cards("drawn", outcome.drawn.len() as u64);
        let (card, family) = (outcome.card.name.clone(), outcome.card.family());
        self.emit(|timestamp| Event::CardPlayed {
            timestamp,
            card: card.clone(),
            family: family.to_string(),
        });
        self.enforce_hand_limit();
        Ok(outcome)
    }

    /// The hider discards a card from hand.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidPhase`] outside the seeking phases and
    /// [`GameError::CardNotPlayable`] if the card is not in hand.
    pub fn discard_card(&mut self, name: &str) -> Result<Card, GameError> {
        self.require(GamePhase::is_seeking, "discard a card")?;
        let card = self.deck.discard(name)?;

        info!(card = %card, "card discarded");
        metrics::record_cards("discarded", 1);
        let name = card.name.clone();
        self.emit(|timestamp| Event::CardDiscarded {
            timestamp,
            card: name.clone(),
        });
        self.enforce_hand_limit();
        Ok(card)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn require<F>(&self, allowed: F, action: &'static str) -> Result<(), GameError>
    where
        F: Fn(GamePhase) -> bool,
    {
        if allowed(self.phase) {
            Ok(())
        } else {
            debug!(action, phase = %self.phase, "rejected in current phase");
            Err(GameError::InvalidPhase {
                action,
                phase: self.phase,
            })
        }
    }

    fn set_phase(&mut self, phase: GamePhase) {
        if self.phase != phase {
            metrics::set_current_phase(phase.label(), Some(self.phase.label()));
            debug!(from = %self.phase, to = %phase, "phase change");
            self.phase = phase;
        }
    }

    /// Deducts the time spent in delay from the bonus and returns it.
    fn settle_delay(&mut self, now: i64) -> i64 {
        let penalty = self.delay_start.take().map_or(0, |start| now - start);
        self.hider_time_bonus -= penalty;
        penalty
    }

    fn hand_size_exceeded(&self) -> GameError {
        GameError::HandSizeExceeded {
            hand_size: self.deck.hand().len(),
            max_hand_size: self.deck.max_hand_size(),
        }
    }

    /// Brings `HandLock` in line with the hand after a play or discard.
    fn enforce_hand_limit(&mut self) {
        let legal = self.deck.is_legal_hand();
        let locked = self.conditions.has(Condition::HandLock);
        let now = self.clock.now();
        match (legal, locked) {
            (false, false) => self.conditions.add(
                Condition::HandLock,
                None,
                ReleaseAction::AnnounceCleared,
                now,
                &mut self.scheduler,
            ),
            (true, true) => {
                let release = self
                    .conditions
                    .remove(Condition::HandLock, &mut self.scheduler);
                self.run_release(Condition::HandLock, release);
            }
            _ => {}
        }
        metrics::set_hand_size(self.deck.hand().len());
    }

    fn run_release(&self, condition: Condition, release: ReleaseAction) {
        match release {
            ReleaseAction::Noop => {}
            ReleaseAction::AnnounceCleared => {
                info!(%condition, "condition cleared");
                self.emit(|timestamp| Event::ConditionCleared {
                    timestamp,
                    condition: condition.to_string(),
                });
            }
        }
    }

    fn selection_timeout(&self) -> Duration {
        self.config.timing.selection_timeout()
    }

    /// Picks who hides next.
    ///
    /// Players who have not hidden yet go first. After that, anyone whose
    /// best time is not the lowest and who did not just hide; failing that,
    /// anyone but the player who just hid.
    fn pick_next_player(&mut self, just_hid: Option<&str>) -> String {
        let unattempted: Vec<&String> = self
            .players
            .iter()
            .filter(|p| !self.times.contains_key(*p))
            .collect();
        if let Some(player) = unattempted.choose(&mut self.rng) {
            return (*player).clone();
        }

        let min = self.times.values().copied().min();
        let contenders: Vec<&String> = self
            .players
            .iter()
            .filter(|p| Some(p.as_str()) != just_hid)
            .filter(|p| self.times.get(*p).copied() != min)
            .collect();
        if let Some(player) = contenders.choose(&mut self.rng) {
            return (*player).clone();
        }

        let others: Vec<&String> = self
            .players
            .iter()
            .filter(|p| Some(p.as_str()) != just_hid)
            .collect();
        others.choose(&mut self.rng).map_or_else(
            || just_hid.map_or_else(|| self.players[0].clone(), ToString::to_string),
            |player| (*player).clone(),
        )
    }

    fn emit<F>(&self, make: F)
    where
        F: FnOnce(chrono::DateTime<chrono::Utc>) -> Event,
    {
        self.events.emit(make(timestamp_at(self.clock.now())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::frontend::{Notification, RecordingFrontend};

    const T0: i64 = 1_000_000;

    struct Harness {
        game: GameState,
        clock: ManualClock,
        frontend: Arc<RecordingFrontend>,
    }

    fn harness(players: &[&str]) -> Harness {
        let config = GameConfig {
            players: players.iter().map(ToString::to_string).collect(),
            start_delay: 0,
            seed: Some(11),
            ..GameConfig::default()
        };
        let clock = ManualClock::new(T0);
        let frontend = Arc::new(RecordingFrontend::new());
        let game = GameState::new(
            Arc::new(config),
            Arc::clone(&frontend) as Arc<dyn Frontend>,
            Arc::new(clock.clone()),
        )
        .unwrap();
        Harness {
            game,
            clock,
            frontend,
        }
    }

    impl Harness {
        async fn advance(&mut self, secs: i64) -> TickReport {
            self.clock.advance(secs);
            self.game.tick().await
        }

        async fn to_seeking(&mut self) {
            self.game.tick().await;
            assert_eq!(self.game.phase(), GamePhase::HiderPhase);
            self.advance(2700).await;
            assert_eq!(self.game.phase(), GamePhase::SeekerPhase);
        }
    }

    #[test]
    fn no_players_is_rejected() {
        let err = GameState::new(
            Arc::new(GameConfig::default()),
            Arc::new(RecordingFrontend::new()),
            Arc::new(ManualClock::new(0)),
        )
        .unwrap_err();
        assert_eq!(err, GameError::NoPlayers);
    }

    #[tokio::test]
    async fn round_starts_on_schedule() {
        let mut h = harness(&["Ben", "Adam"]);
        assert_eq!(h.game.phase(), GamePhase::Inactive);
        let report = h.game.tick().await;
        assert_eq!(report.fired, 1);
        assert_eq!(h.game.phase(), GamePhase::HiderPhase);
        assert_eq!(h.game.round(), 1);
        assert_eq!(
            h.game.scheduler().due_of(&GameTask::ReleaseSeekers),
            Some(T0 + 2700)
        );

        h.advance(2699).await;
        assert_eq!(h.game.phase(), GamePhase::HiderPhase);
        h.advance(1).await;
        assert_eq!(h.game.phase(), GamePhase::SeekerPhase);
        assert_eq!(
            h.game.scheduler().due_of(&GameTask::MaxHidingTimeReached),
            Some(T0 + 2700 + 14_400)
        );
    }

    #[tokio::test]
    async fn first_hider_is_announced_without_a_result() {
        let h = harness(&["Ben", "Adam"]);
        h.game.announce_first_hider().await;
        assert_eq!(
            h.frontend.notifications(),
            vec![Notification::NextPlayer {
                player: h.game.next_player().to_string(),
                last_result: None,
            }]
        );
    }

    #[tokio::test]
    async fn huge_hiding_time_saturates_the_deadline() {
        let mut config = GameConfig {
            players: vec!["Ben".into(), "Adam".into()],
            start_delay: 0,
            seed: Some(11),
            ..GameConfig::default()
        };
        config.timing.hiding_time = i64::MAX;
        let mut game = GameState::new(
            Arc::new(config),
            Arc::new(RecordingFrontend::new()),
            Arc::new(ManualClock::new(T0)),
        )
        .unwrap();

        let report = game.tick().await;
        assert_eq!(report.fired, 1);
        assert_eq!(game.phase(), GamePhase::HiderPhase);
        assert_eq!(
            game.scheduler().due_of(&GameTask::ReleaseSeekers),
            Some(i64::MAX)
        );
    }

    #[tokio::test]
    async fn ask_during_hiding_is_invalid_phase() {
        let mut h = harness(&["Ben", "Adam"]);
        h.game.tick().await;
        let err = h.game.ask("radar:5km", "").await.unwrap_err();
        assert_eq!(
            err,
            GameError::InvalidPhase {
                action: "ask a question",
                phase: GamePhase::HiderPhase
            }
        );
    }

    #[tokio::test]
    async fn second_question_is_rejected_while_active() {
        let mut h = harness(&["Ben", "Adam"]);
        h.to_seeking().await;
        h.game.ask("radar:5km", "").await.unwrap();
        let err = h.game.ask("radar:10km", "").await.unwrap_err();
        assert_eq!(err, GameError::QuestionActive);
    }

    #[tokio::test]
    async fn answer_without_question() {
        let mut h = harness(&["Ben", "Adam"]);
        h.to_seeking().await;
        let err = h.game.answered_question("HIT").await.unwrap_err();
        assert_eq!(err, GameError::NoActiveQuestion);
    }

    #[tokio::test]
    async fn timely_answer_cancels_check() {
        let mut h = harness(&["Ben", "Adam"]);
        h.to_seeking().await;
        h.game.ask("radar:5km", "").await.unwrap();
        h.clock.advance(100);
        let report = h.game.answered_question("MISS").await.unwrap();
        assert_eq!(report.penalty, None);
        assert_eq!(report.reward.kept.len(), 1);
        assert!(!h.game.scheduler().iter().any(|t| t.task.is_question_check()));
        assert!(!h.game.has_condition(Condition::ActiveQuestion));
        assert!(!h.game.has_condition(Condition::HandLock));
    }

    #[tokio::test]
    async fn late_answer_enters_delay_and_pays_penalty() {
        let mut h = harness(&["Ben", "Adam"]);
        h.to_seeking().await;
        h.game.ask("matching:zoo", "").await.unwrap();
        h.advance(300).await;
        assert_eq!(h.game.phase(), GamePhase::HiderDelay);
        assert_eq!(
            h.frontend
                .count(|n| matches!(n, Notification::QuestionExpired { .. })),
            1
        );

        h.clock.advance(45);
        let report = h.game.answered_question("NO").await.unwrap();
        assert_eq!(report.penalty, Some(45));
        assert_eq!(report.reward.draws, 0);
        assert_eq!(h.game.phase(), GamePhase::SeekerPhase);
        assert_eq!(h.game.hider_time_bonus(), -45);
    }

    #[tokio::test]
    async fn caught_at_300_records_300() {
        let mut h = harness(&["Ben", "Adam"]);
        h.to_seeking().await;
        let hider = h.game.current_player().unwrap().to_string();
        h.clock.advance(300);
        let result = h.game.hider_caught().await.unwrap();
        assert_eq!(result.secs, 300);
        assert_eq!(h.game.times().get(&hider), Some(&300));
        assert_eq!(h.game.phase(), GamePhase::Inactive);
        assert_ne!(h.game.next_player(), hider);
        assert!(!h.game.scheduler().contains(&GameTask::MaxHidingTimeReached));
        assert_eq!(
            h.game.scheduler().due_of(&GameTask::StartRound),
            Some(h.clock.now() + 600)
        );
    }

    #[tokio::test]
    async fn times_only_grow() {
        let mut h = harness(&["Solo"]);
        h.to_seeking().await;
        h.clock.advance(500);
        h.game.hider_caught().await.unwrap();
        assert_eq!(h.game.next_player(), "Solo");

        h.advance(600).await;
        h.advance(2700).await;
        h.clock.advance(100);
        let result = h.game.hider_caught().await.unwrap();
        assert_eq!(result.secs, 100);
        assert_eq!(h.game.times().get("Solo"), Some(&500));
    }

    #[tokio::test]
    async fn caught_in_delay_settles_penalty() {
        let mut h = harness(&["Ben", "Adam"]);
        h.to_seeking().await;
        h.game.ask("radar:1km", "").await.unwrap();
        h.advance(300).await;
        h.clock.advance(60);
        let result = h.game.hider_caught().await.unwrap();
        assert_eq!(result.secs, 360 - 60);
        assert!(!h.game.has_condition(Condition::ActiveQuestion));
    }

    #[tokio::test]
    async fn max_seeking_time_only_notifies() {
        let mut h = harness(&["Ben", "Adam"]);
        h.to_seeking().await;
        h.advance(14_400).await;
        assert_eq!(h.game.phase(), GamePhase::SeekerPhase);
        assert_eq!(
            h.frontend
                .count(|n| matches!(n, Notification::SeekingTimeExpired)),
            1
        );
    }

    #[tokio::test]
    async fn commands_outside_seeking_fail() {
        let mut h = harness(&["Ben", "Adam"]);
        assert!(matches!(
            h.game.hider_caught().await,
            Err(GameError::InvalidPhase { .. })
        ));
        assert!(matches!(
            h.game.discard_card("anything"),
            Err(GameError::InvalidPhase { .. })
        ));
        assert!(matches!(
            h.game.play_card("anything").await,
            Err(GameError::InvalidPhase { .. })
        ));
    }

    #[tokio::test]
    async fn snapshot_reflects_state() {
        let mut h = harness(&["Ben", "Adam"]);
        h.to_seeking().await;
        h.game.ask("photo:a-tree", "").await.unwrap();
        let snap = h.game.snapshot();
        assert_eq!(snap.phase, GamePhase::SeekerPhase);
        assert_eq!(snap.current_question.as_deref(), Some("photo:a-tree"));
        assert_eq!(snap.conditions, vec![Condition::ActiveQuestion]);
        assert!(snap
            .pending_tasks
            .iter()
            .any(|(due, kind)| kind == "check_question" && *due == h.clock.now() + 600));
    }

    #[test]
    fn phase_display() {
        assert_eq!(GamePhase::HiderPhase.to_string(), "hiding phase");
        assert_eq!(GamePhase::HiderDelay.label(), "delay");
    }
}
