//! Terminal frontend.
//!
//! Announcements go to stdout. Card selections arrive on a channel fed by
//! the stdin reader in [`run_console`], which also turns typed commands
//! into [`GameHandle`] requests.

use std::io::Write;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{Frontend, RoundResult};
use crate::catalog::{Card, CardKind, QuestionCatalog, QuestionFamily, QuestionInstance};
use crate::clock::Clock;
use crate::error::{FrontendError, GameError};
use crate::game::GameSnapshot;
use crate::observability::events::timestamp_at;
use crate::server::GameHandle;

/// Pending card selections buffered from the reader.
const SELECTION_BUFFER: usize = 8;

/// Formats a number of seconds as `1h 5m 3s`.
#[must_use]
pub fn format_secs(secs: i64) -> String {
    let formatted = humantime::format_duration(Duration::from_secs(secs.unsigned_abs())).to_string();
    if secs < 0 {
        format!("-{formatted}")
    } else {
        formatted
    }
}

fn format_clock(epoch_secs: i64) -> String {
    timestamp_at(epoch_secs)
        .with_timezone(&chrono::Local)
        .format("%H:%M:%S")
        .to_string()
}

// ============================================================================
// Frontend
// ============================================================================

/// Frontend that talks to a terminal.
pub struct ConsoleFrontend {
    out: Mutex<Box<dyn Write + Send>>,
    selections: tokio::sync::Mutex<mpsc::Receiver<Vec<usize>>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ConsoleFrontend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleFrontend").finish_non_exhaustive()
    }
}

impl ConsoleFrontend {
    /// Creates a frontend writing to `out`. The returned sender feeds
    /// one-based card selections typed by the hider.
    #[must_use]
    pub fn new(out: Box<dyn Write + Send>, clock: Arc<dyn Clock>) -> (Self, mpsc::Sender<Vec<usize>>) {
        let (tx, rx) = mpsc::channel(SELECTION_BUFFER);
        let frontend = Self {
            out: Mutex::new(out),
            selections: tokio::sync::Mutex::new(rx),
            clock,
        };
        (frontend, tx)
    }

    /// Creates a frontend writing to stdout.
    #[must_use]
    pub fn stdout(clock: Arc<dyn Clock>) -> (Self, mpsc::Sender<Vec<usize>>) {
        Self::new(Box::new(std::io::stdout()), clock)
    }

    /// Prints a line. Write failures are logged and dropped.
    pub fn say(&self, text: &str) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        if let Err(e) = writeln!(out, "{text}").and_then(|()| out.flush()) {
            debug!(error = %e, "console write failed");
        }
    }

    fn until(&self, epoch_secs: i64) -> String {
        format!(
            "{} (in {})",
            format_clock(epoch_secs),
            format_secs((epoch_secs - self.clock.now()).max(0))
        )
    }
}

#[async_trait]
impl Frontend for ConsoleFrontend {
    async fn select_cards(
        &self,
        candidates: &[Card],
        num: usize,
        reason: &str,
    ) -> Result<Vec<usize>, FrontendError> {
        let mut rx = self.selections.lock().await;
        while let Ok(stale) = rx.try_recv() {
            debug!(?stale, "dropping selection typed before the prompt");
        }

        let mut prompt = format!("{reason}: choose {num} of\n");
        for (i, card) in candidates.iter().enumerate() {
            prompt.push_str(&format!("  {}. {card}\n", i + 1));
        }
        prompt.push_str(&format!("reply with: select <n>{}", " <n>".repeat(num.saturating_sub(1))));
        self.say(&prompt);

        let picked = rx
            .recv()
            .await
            .ok_or_else(|| FrontendError::Closed("console input closed".to_string()))?;
        picked
            .into_iter()
            .map(|n| {
                n.checked_sub(1)
                    .ok_or_else(|| FrontendError::InvalidSelection("cards are numbered from 1".to_string()))
            })
            .collect()
    }

    async fn announce_round_start(&self, hider: &str, hiding_ends_at: i64) {
        self.say(&format!(
            "New round: {hider} is hiding. Seekers are released at {}.",
            self.until(hiding_ends_at)
        ));
    }

    async fn announce_seekers_released(&self) {
        self.say("Hiding time is over. Seekers, go!");
    }

    async fn pose_question(&self, question: &QuestionInstance) {
        let deadline = self.clock.now() + question.allocated_time();
        let mut text = format!(
            "Question [{}]: {}\nAnswer by {}.",
            question.id(),
            question.text(),
            self.until(deadline)
        );
        let options = question.options();
        if !options.is_empty() {
            text.push_str(&format!("\nOptions: {}", options.join(" / ")));
        }
        self.say(&text);
    }

    async fn question_time_expired(&self, question: &QuestionInstance) {
        self.say(&format!(
            "Time is up for [{}]. The hider's clock is paused until they answer.",
            question.id()
        ));
    }

    async fn reveal_answer(&self, question: &QuestionInstance, answer: &str, penalty: Option<i64>) {
        let mut text = format!("Answer to [{}]: {answer}", question.id());
        if let Some(secs) = penalty {
            text.push_str(&format!(" (late by {}, deducted from the hider)", format_secs(secs)));
        }
        self.say(&text);
    }

    async fn announce_next_player(&self, player: &str, last_result: Option<&RoundResult>) {
        if let Some(result) = last_result {
            self.say(&format!(
                "{} was found after {}.",
                result.player,
                format_secs(result.secs)
            ));
        }
        self.say(&format!("{player} hides next."));
    }

    async fn announce_seeking_time_expired(&self) {
        self.say("Maximum seeking time reached. The hider may reveal themselves.");
    }

    async fn announce_curse(&self, card: &Card) {
        let mut text = format!("The hider casts {card}!");
        if let CardKind::Curse { effect, cost } = &card.kind {
            text.push_str(&format!("\n  {effect}\n  Casting cost: {cost}"));
        }
        self.say(&text);
    }

    async fn announce_card_played(&self, card: &Card) {
        self.say(&format!("The hider played {card}."));
    }
}

// ============================================================================
// Commands
// ============================================================================

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// `ask <id> [input…]`
    Ask {
        /// Template id
        id: String,
        /// Seeker input, space-joined
        input: String,
    },
    /// `answer <text…>`
    Answer(String),
    /// `caught`
    Caught,
    /// `play <card>`
    Play(String),
    /// `discard <card>`
    Discard(String),
    /// `hand`
    Hand,
    /// `status`
    Status,
    /// `times`
    Times,
    /// `questions [family]`
    Questions(Option<QuestionFamily>),
    /// `select <n…>`
    Select(Vec<usize>),
    /// `roll [sides] [count]`
    Roll {
        /// Faces per die
        sides: u32,
        /// Number of dice
        count: u32,
    },
    /// `help`
    Help,
    /// `quit`
    Quit,
}

const COMMANDS: &[&str] = &[
    "ask", "answer", "caught", "play", "discard", "hand", "status", "times", "questions", "select",
    "roll", "help", "quit",
];

/// Largest die `roll` accepts.
const MAX_DICE_SIDES: u32 = 1_000;

/// Most dice one `roll` throws.
const MAX_DICE_COUNT: u32 = 100;

const HELP: &str = "\
commands:
  ask <question-id> [input…]   ask a question (see `questions`)
  answer <text…>               answer the pending question
  caught                       the hider was found
  play <card|n>                play a card from hand
  discard <card|n>             discard a card from hand
  select <n…>                  pick cards when prompted
  hand | status | times        show the hand, game state or standings
  questions [family]           list askable questions
  roll [sides] [count]         roll dice (default one d6)
  help | quit";

/// Parses one console line. Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns a message for unbalanced quotes, unknown commands (with a
/// suggestion) and malformed arguments.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let words = shlex::split(line).ok_or_else(|| "unbalanced quotes".to_string())?;
    let Some((name, args)) = words.split_first() else {
        return Ok(None);
    };
    let rest = args.join(" ");
    let need = |what: &str| {
        if rest.is_empty() {
            Err(format!("usage: {name} <{what}>"))
        } else {
            Ok(rest.clone())
        }
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "ask" => {
            let (id, input) = args
                .split_first()
                .ok_or_else(|| "usage: ask <question-id> [input…]".to_string())?;
            ConsoleCommand::Ask {
                id: id.clone(),
                input: input.join(" "),
            }
        }
        "answer" => ConsoleCommand::Answer(need("text")?),
        "caught" => ConsoleCommand::Caught,
        "play" => ConsoleCommand::Play(need("card")?),
        "discard" => ConsoleCommand::Discard(need("card")?),
        "hand" => ConsoleCommand::Hand,
        "status" => ConsoleCommand::Status,
        "times" => ConsoleCommand::Times,
        "questions" => ConsoleCommand::Questions(
            args.first()
                .map(|f| QuestionFamily::from_str(f))
                .transpose()?,
        ),
        "select" => {
            if args.is_empty() {
                return Err("usage: select <n…>".to_string());
            }
            let picks = args
                .iter()
                .map(|a| a.parse::<usize>().map_err(|_| format!("not a card number: '{a}'")))
                .collect::<Result<Vec<_>, _>>()?;
            ConsoleCommand::Select(picks)
        }
        "roll" => {
            let number = |i: usize, default: u32, max: u32| -> Result<u32, String> {
                args.get(i).map_or(Ok(default), |a| match a.parse::<u32>() {
                    Ok(n) if (1..=max).contains(&n) => Ok(n),
                    _ => Err(format!("expected a number from 1 to {max}, got '{a}'")),
                })
            };
            ConsoleCommand::Roll {
                sides: number(0, 6, MAX_DICE_SIDES)?,
                count: number(1, 1, MAX_DICE_COUNT)?,
            }
        }
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => {
            let suggestion = COMMANDS
                .iter()
                .map(|c| (*c, strsim::damerau_levenshtein(other, c)))
                .filter(|(_, d)| *d <= 3)
                .min_by_key(|(_, d)| *d)
                .map(|(c, _)| c);
            return Err(format!(
                "unknown command '{other}'{}; type `help`",
                crate::error::suggestion_suffix(suggestion)
            ));
        }
    };
    Ok(Some(command))
}

/// Rolls `count` dice with `sides` faces.
#[must_use]
pub fn roll_dice<R: Rng>(rng: &mut R, sides: u32, count: u32) -> Vec<u32> {
    (0..count).map(|_| rng.random_range(1..=sides)).collect()
}

// ============================================================================
// Reader Loop
// ============================================================================

/// Reads commands from `input` until EOF, `quit` or cancellation.
///
/// Game requests are answered on spawned tasks so the reader keeps
/// accepting `select` lines while the game waits for a card choice.
/// Cancels `cancel` when the player quits or input ends.
pub async fn run_console<R>(
    input: R,
    frontend: Arc<ConsoleFrontend>,
    selections: mpsc::Sender<Vec<usize>>,
    game: GameHandle,
    catalog: Arc<QuestionCatalog>,
    cancel: CancellationToken,
) where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    frontend.say("Type `help` for commands.");

    loop {
        let line = tokio::select! {
            () = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("console input closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "console read failed");
                break;
            }
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                frontend.say(&message);
                continue;
            }
        };

        match command {
            ConsoleCommand::Quit => break,
            ConsoleCommand::Help => frontend.say(HELP),
            ConsoleCommand::Select(picks) => {
                if selections.try_send(picks).is_err() {
                    frontend.say("selection ignored");
                }
            }
            ConsoleCommand::Roll { sides, count } => {
                let faces = roll_dice(&mut rand::rng(), sides, count);
                frontend.say(&format_roll(&faces));
            }
            ConsoleCommand::Questions(family) => {
                frontend.say(&format_questions(&catalog, family));
            }
            command => {
                let frontend = Arc::clone(&frontend);
                let game = game.clone();
                tokio::spawn(async move {
                    let text = execute(&game, command).await;
                    frontend.say(&text);
                });
            }
        }
    }
    cancel.cancel();
}

async fn execute(game: &GameHandle, command: ConsoleCommand) -> String {
    let result: Result<String, GameError> = match command {
        ConsoleCommand::Ask { id, input } => game
            .ask_question(&id, &input)
            .await
            .map(|_| "question sent".to_string()),
        ConsoleCommand::Answer(text) => game.answer(&text).await.map(|report| {
            let mut text = format!(
                "hider kept {} card(s) from {} draw(s)",
                report.reward.kept.len(),
                report.reward.draws
            );
            if report.hand_locked {
                text.push_str("; hand is over the limit, play or discard before answering again");
            }
            text
        }),
        ConsoleCommand::Caught => game
            .hider_caught()
            .await
            .map(|r| format!("{} scored {}", r.player, format_secs(r.secs))),
        ConsoleCommand::Play(card) => game
            .play_card(&card)
            .await
            .map(|outcome| format!("played {}", outcome.card)),
        ConsoleCommand::Discard(card) => game
            .discard_card(&card)
            .await
            .map(|card| format!("discarded {card}")),
        ConsoleCommand::Hand => game.snapshot().await.map(|s| format_hand(&s)),
        ConsoleCommand::Status => game.snapshot().await.map(|s| format_status(&s)),
        ConsoleCommand::Times => game.standings().await.map(|s| format_standings(&s)),
        _ => return String::new(),
    };
    result.unwrap_or_else(|e| format!("error: {e}"))
}

// ============================================================================
// Formatting
// ============================================================================

fn format_roll(faces: &[u32]) -> String {
    match faces {
        [single] => format!("Result is: {single}"),
        _ => {
            let total: u64 = faces.iter().copied().map(u64::from).sum();
            let list: Vec<String> = faces.iter().map(ToString::to_string).collect();
            format!("Result is: {total} [{}]", list.join(", "))
        }
    }
}

fn format_hand(snapshot: &GameSnapshot) -> String {
    if snapshot.hand.is_empty() {
        return format!("hand is empty (limit {})", snapshot.max_hand_size);
    }
    let mut text = format!(
        "hand ({}/{}):",
        snapshot.hand.len(),
        snapshot.max_hand_size
    );
    for (i, card) in snapshot.hand.iter().enumerate() {
        text.push_str(&format!("\n  {}. {card}", i + 1));
    }
    text
}

fn format_status(snapshot: &GameSnapshot) -> String {
    let mut text = format!(
        "round {} | {} | hider: {} | next: {}",
        snapshot.round,
        snapshot.phase,
        snapshot.current_player.as_deref().unwrap_or("-"),
        snapshot.next_player
    );
    if let Some(question) = &snapshot.current_question {
        text.push_str(&format!("\nquestion: {question}"));
    }
    if !snapshot.conditions.is_empty() {
        let names: Vec<String> = snapshot.conditions.iter().map(ToString::to_string).collect();
        text.push_str(&format!("\nconditions: {}", names.join(", ")));
    }
    text.push_str(&format!(
        "\ncards: {} in hand, {} to draw, {} discarded | bonus {}",
        snapshot.hand.len(),
        snapshot.draw_pile,
        snapshot.discard_pile,
        format_secs(snapshot.hider_time_bonus)
    ));
    for (due, kind) in &snapshot.pending_tasks {
        text.push_str(&format!(
            "\n  {kind} in {}",
            format_secs((due - snapshot.now).max(0))
        ));
    }
    text
}

fn format_standings(standings: &[(String, i64)]) -> String {
    if standings.is_empty() {
        return "no rounds finished yet".to_string();
    }
    standings
        .iter()
        .enumerate()
        .map(|(i, (player, secs))| format!("{}. {player}: {}", i + 1, format_secs(*secs)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_questions(catalog: &QuestionCatalog, family: Option<QuestionFamily>) -> String {
    catalog
        .all()
        .iter()
        .filter(|t| family.is_none_or(|f| t.family == f))
        .map(|t| format!("{:<40} {}", t.id.to_string(), t.prompt))
        .collect::<Vec<_>>()
        .join("\n")
}
