//! Structured game event stream.
//!
//! Discrete, typed events emitted as the game advances. Events are
//! serialized as newline-delimited JSON (JSONL) and carry a monotonically
//! increasing sequence number so a consumer can replay a game in order.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted during a game.
///
/// Timestamps come from the game clock, not the host clock, so a replay
/// under a manual clock produces the same stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The game actor started.
    GameStarted {
        /// When the actor started.
        timestamp: DateTime<Utc>,
        /// Configured players.
        players: Vec<String>,
        /// Epoch second of the first round.
        first_round_at: i64,
    },

    /// The game actor stopped.
    GameStopped {
        /// When the actor stopped.
        timestamp: DateTime<Utc>,
        /// Human-readable stop reason.
        reason: String,
    },

    /// A hiding phase began.
    RoundStarted {
        /// When the round started.
        timestamp: DateTime<Utc>,
        /// One-based round number.
        round: u32,
        /// Player hiding this round.
        hider: String,
        /// Epoch second at which seekers are released.
        seekers_released_at: i64,
    },

    /// Hiding time ran out and the seekers set off.
    SeekersReleased {
        /// When the seekers were released.
        timestamp: DateTime<Utc>,
        /// Round number.
        round: u32,
        /// Player hiding this round.
        hider: String,
    },

    /// The seekers asked a question.
    QuestionAsked {
        /// When the question was asked.
        timestamp: DateTime<Utc>,
        /// Template id.
        question_id: String,
        /// Question family.
        family: String,
        /// Epoch second by which the hider must answer.
        deadline: i64,
    },

    /// The hider missed the answer deadline.
    QuestionExpired {
        /// When the deadline passed.
        timestamp: DateTime<Utc>,
        /// Template id.
        question_id: String,
    },

    /// The hider answered.
    QuestionAnswered {
        /// When the answer arrived.
        timestamp: DateTime<Utc>,
        /// Template id.
        question_id: String,
        /// The answer given.
        answer: String,
        /// Seconds deducted for a late answer.
        #[serde(skip_serializing_if = "Option::is_none")]
        penalty_secs: Option<i64>,
    },

    /// Cards were drawn and kept for an answered question.
    RewardResolved {
        /// When the reward finished.
        timestamp: DateTime<Utc>,
        /// Template id.
        question_id: String,
        /// Number of reward draws performed (count times multiplier).
        draws: u32,
        /// Names of the cards kept.
        kept: Vec<String>,
        /// Whether any selection fell back to the default pick.
        timed_out: bool,
    },

    /// The hider played a card.
    CardPlayed {
        /// When the card was played.
        timestamp: DateTime<Utc>,
        /// Card name.
        card: String,
        /// Card family (`time_bonus`, `powerup`, `curse`).
        family: String,
    },

    /// The hider discarded a card.
    CardDiscarded {
        /// When the card was discarded.
        timestamp: DateTime<Utc>,
        /// Card name.
        card: String,
    },

    /// A condition was lifted and its release action ran.
    ConditionCleared {
        /// When the condition was lifted.
        timestamp: DateTime<Utc>,
        /// Condition name.
        condition: String,
    },

    /// The hider was caught.
    HiderCaught {
        /// When the catch happened.
        timestamp: DateTime<Utc>,
        /// Player who was hiding.
        hider: String,
        /// Seconds credited for this round, bonuses and penalties included.
        round_secs: i64,
        /// Player's best time after this round.
        best_secs: i64,
        /// Player who hides next.
        next_hider: String,
    },

    /// The maximum seeking time elapsed.
    SeekingTimeExpired {
        /// When the limit was hit.
        timestamp: DateTime<Utc>,
        /// Player who is hiding.
        hider: String,
    },

    /// A scheduled task failed; the remaining tasks of the tick still ran.
    TaskFailed {
        /// When the failure occurred.
        timestamp: DateTime<Utc>,
        /// Task kind.
        task: String,
        /// Error message.
        error: String,
    },
}

/// Converts a game-clock epoch second into an event timestamp.
#[must_use]
pub fn timestamp_at(epoch_secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(epoch_secs, 0).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Envelope (adds sequence number via serde flatten)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Each call to [`emit`](Self::emit) increments the sequence counter,
/// serializes the event as one line and flushes. Serialization and I/O
/// failures are dropped: a broken event sink must not stop the game.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that writes to stderr.
    ///
    /// stdout is reserved for the console frontend.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(&envelope) {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        }
    }

    /// Returns the number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;

    #[derive(Clone)]
    struct TestWriter(Arc<StdMutex<Vec<u8>>>);

    impl TestWriter {
        fn new() -> Self {
            Self(Arc::new(StdMutex::new(Vec::new())))
        }

        fn contents(&self) -> String {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn round_started() -> Event {
        Event::RoundStarted {
            timestamp: timestamp_at(1_700_000_000),
            round: 1,
            hider: "Ben".to_owned(),
            seekers_released_at: 1_700_002_700,
        }
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let parsed = serde_json::to_value(round_started()).unwrap();
        assert_eq!(parsed["type"], "RoundStarted");
        assert_eq!(parsed["hider"], "Ben");
        assert_eq!(parsed["timestamp"], "2023-11-14T22:13:20Z");
    }

    #[test]
    fn emitter_increments_sequence() {
        let tw = TestWriter::new();
        let emitter = EventEmitter::new(Box::new(tw.clone()));
        emitter.emit(round_started());
        emitter.emit(Event::GameStopped {
            timestamp: timestamp_at(0),
            reason: "done".to_owned(),
        });

        assert_eq!(emitter.event_count(), 2);

        let lines: Vec<serde_json::Value> = tw
            .contents()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["sequence"], 0);
        assert_eq!(lines[0]["type"], "RoundStarted");
        assert_eq!(lines[1]["sequence"], 1);
        assert!(lines[1].get("event").is_none());
    }

    #[test]
    fn penalty_is_omitted_when_absent() {
        let parsed = serde_json::to_value(Event::QuestionAnswered {
            timestamp: timestamp_at(0),
            question_id: "radar:5km".to_owned(),
            answer: "HIT".to_owned(),
            penalty_secs: None,
        })
        .unwrap();
        assert!(parsed.get("penalty_secs").is_none());
    }

    #[test]
    fn noop_still_counts() {
        let emitter = EventEmitter::noop();
        emitter.emit(round_started());
        assert_eq!(emitter.event_count(), 1);
    }
}
