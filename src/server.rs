//! Runtime host for a game.
//!
//! [`GameServer`] is the only owner of the [`GameState`]. It serializes
//! player commands and scheduler ticks through a single `select!` loop, so
//! the game never sees concurrent mutation. Clients talk to it through a
//! cloneable [`GameHandle`].

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::catalog::Card;
use crate::error::GameError;
use crate::frontend::RoundResult;
use crate::game::{AnswerReport, GameSnapshot, GameState, PlayOutcome};
use crate::observability::events::{Event, EventEmitter, timestamp_at};

/// Interval between scheduler polls.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Depth of the command queue.
const COMMAND_BUFFER: usize = 32;

type Reply<T> = oneshot::Sender<Result<T, GameError>>;

/// A request sent to the game actor.
#[derive(Debug)]
pub enum GameCommand {
    /// Ask a catalog question with optional input.
    Ask {
        /// Template id
        id: String,
        /// Raw input text
        input: String,
        /// Answer deadline
        reply: Reply<i64>,
    },
    /// Answer the pending question.
    Answer {
        /// Answer text
        text: String,
        /// Penalty and reward
        reply: Reply<AnswerReport>,
    },
    /// The hider was caught.
    Caught {
        /// Round result
        reply: Reply<RoundResult>,
    },
    /// Play a card from hand.
    Play {
        /// Card name or 1-based position
        card: String,
        /// What the play did
        reply: Reply<PlayOutcome>,
    },
    /// Discard a card from hand.
    Discard {
        /// Card name or 1-based position
        card: String,
        /// The discarded card
        reply: Reply<Card>,
    },
    /// Read the current state.
    Snapshot {
        /// Status view
        reply: oneshot::Sender<GameSnapshot>,
    },
    /// Read the standings.
    Standings {
        /// Players by best time, longest first
        reply: oneshot::Sender<Vec<(String, i64)>>,
    },
}

// ============================================================================
// Server
// ============================================================================

/// The game actor.
pub struct GameServer {
    game: GameState,
    commands: mpsc::Receiver<GameCommand>,
    events: std::sync::Arc<EventEmitter>,
    cancel: CancellationToken,
}

impl GameServer {
    /// Wraps `game` and returns the actor plus a handle for clients.
    #[must_use]
    pub fn new(
        game: GameState,
        events: std::sync::Arc<EventEmitter>,
        cancel: CancellationToken,
    ) -> (Self, GameHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let server = Self {
            game,
            commands: rx,
            events,
            cancel,
        };
        (server, GameHandle { tx })
    }

    /// Runs until cancelled or every handle is dropped. Returns the final
    /// standings.
    pub async fn run(mut self) -> Vec<(String, i64)> {
        let first_round_at = self
            .game
            .scheduler()
            .next_due()
            .unwrap_or_default();
        self.events.emit(Event::GameStarted {
            timestamp: timestamp_at(self.game.now()),
            players: self.game.config().players.clone(),
            first_round_at,
        });
        info!(
            players = ?self.game.config().players,
            first_round_at,
            "game started"
        );
        self.game.announce_first_hider().await;

        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let reason = loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    info!("game cancelled");
                    break "cancelled";
                }
                _ = interval.tick() => {
                    let report = self.game.tick().await;
                    if report.fired + report.failed > 0 {
                        debug!(fired = report.fired, failed = report.failed, "tick");
                    }
                }
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        debug!("all handles dropped");
                        break "closed";
                    };
                    self.handle(command).await;
                }
            }
        };

        self.events.emit(Event::GameStopped {
            timestamp: timestamp_at(self.game.now()),
            reason: reason.to_string(),
        });
        self.game.standings()
    }

    async fn handle(&mut self, command: GameCommand) {
        // A dropped reply receiver only means the client stopped waiting.
        match command {
            GameCommand::Ask { id, input, reply } => {
                let _ = reply.send(self.game.ask(&id, &input).await);
            }
            GameCommand::Answer { text, reply } => {
                let _ = reply.send(self.game.answered_question(&text).await);
            }
            GameCommand::Caught { reply } => {
                let _ = reply.send(self.game.hider_caught().await);
            }
            GameCommand::Play { card, reply } => {
                let _ = reply.send(self.game.play_card(&card).await);
            }
            GameCommand::Discard { card, reply } => {
                let _ = reply.send(self.game.discard_card(&card));
            }
            GameCommand::Snapshot { reply } => {
                let _ = reply.send(self.game.snapshot());
            }
            GameCommand::Standings { reply } => {
                let _ = reply.send(self.game.standings());
            }
        }
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Cloneable client of a [`GameServer`].
#[derive(Debug, Clone)]
pub struct GameHandle {
    tx: mpsc::Sender<GameCommand>,
}

impl GameHandle {
    /// Sends a command built around a fresh reply channel and returns the
    /// receiving end without waiting for the answer.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::GameStopped`] if the actor has exited.
    pub async fn submit<T, F>(&self, make: F) -> Result<oneshot::Receiver<T>, GameError>
    where
        F: FnOnce(oneshot::Sender<T>) -> GameCommand,
    {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| GameError::GameStopped)?;
        Ok(rx)
    }

    async fn request<T, F>(&self, make: F) -> Result<T, GameError>
    where
        F: FnOnce(Reply<T>) -> GameCommand,
    {
        self.submit(make)
            .await?
            .await
            .map_err(|_| GameError::GameStopped)?
    }

    /// Asks question `id` with `input`. Returns the answer deadline.
    ///
    /// # Errors
    ///
    /// Propagates the game's rejection, or [`GameError::GameStopped`].
    pub async fn ask_question(&self, id: &str, input: &str) -> Result<i64, GameError> {
        let (id, input) = (id.to_string(), input.to_string());
        self.request(|reply| GameCommand::Ask { id, input, reply })
            .await
    }

    /// Answers the pending question.
    ///
    /// # Errors
    ///
    /// Propagates the game's rejection, or [`GameError::GameStopped`].
    pub async fn answer(&self, text: &str) -> Result<AnswerReport, GameError> {
        let text = text.to_string();
        self.request(|reply| GameCommand::Answer { text, reply }).await
    }

    /// Reports the hider caught.
    ///
    /// # Errors
    ///
    /// Propagates the game's rejection, or [`GameError::GameStopped`].
    pub async fn hider_caught(&self) -> Result<RoundResult, GameError> {
        self.request(|reply| GameCommand::Caught { reply }).await
    }

    /// Plays a card.
    ///
    /// # Errors
    ///
    /// Propagates the game's rejection, or [`GameError::GameStopped`].
    pub async fn play_card(&self, card: &str) -> Result<PlayOutcome, GameError> {
        let card = card.to_string();
        self.request(|reply| GameCommand::Play { card, reply }).await
    }

    /// Discards a card.
    ///
    /// # Errors
    ///
    /// Propagates the game's rejection, or [`GameError::GameStopped`].
    pub async fn discard_card(&self, card: &str) -> Result<Card, GameError> {
        let card = card.to_string();
        self.request(|reply| GameCommand::Discard { card, reply })
            .await
    }

    /// Current game state.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::GameStopped`] if the actor has exited.
    pub async fn snapshot(&self) -> Result<GameSnapshot, GameError> {
        self.submit(|reply| GameCommand::Snapshot { reply })
            .await?
            .await
            .map_err(|_| GameError::GameStopped)
    }

    /// Players by best time, longest first.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::GameStopped`] if the actor has exited.
    pub async fn standings(&self) -> Result<Vec<(String, i64)>, GameError> {
        self.submit(|reply| GameCommand::Standings { reply })
            .await?
            .await
            .map_err(|_| GameError::GameStopped)
    }
}
