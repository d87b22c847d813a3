//! Shared integration-test harness: an in-process game driven by a manual
//! clock, and helpers for spawning the `hideseek` binary.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::Output;
use std::sync::Arc;
use std::time::Duration;

use hideseek::clock::{Clock, ManualClock};
use hideseek::config::GameConfig;
use hideseek::frontend::{Frontend, RecordingFrontend};
use hideseek::game::{GamePhase, GameState, TickReport};
use hideseek::observability::EventEmitter;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};

/// Epoch second every harness clock starts at.
pub const T0: i64 = 1_700_000_000;

/// Default timeout for reading console output.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// In-process harness
// ============================================================================

/// A game wired to a [`ManualClock`] and a [`RecordingFrontend`].
pub struct GameHarness {
    pub game: GameState,
    pub clock: ManualClock,
    pub frontend: Arc<RecordingFrontend>,
}

impl GameHarness {
    /// Two players, no start delay, fixed seed.
    pub fn new() -> Self {
        Self::with_config(config(&["Ben", "Adam"]))
    }

    pub fn with_config(config: GameConfig) -> Self {
        Self::build(config, None)
    }

    /// Like [`GameHarness::with_config`] but routes events to `events`.
    pub fn with_events(config: GameConfig, events: Arc<EventEmitter>) -> Self {
        Self::build(config, Some(events))
    }

    fn build(config: GameConfig, events: Option<Arc<EventEmitter>>) -> Self {
        let clock = ManualClock::new(T0);
        let frontend = Arc::new(RecordingFrontend::new());
        let mut game = GameState::new(
            Arc::new(config),
            Arc::clone(&frontend) as Arc<dyn Frontend>,
            Arc::new(clock.clone()),
        )
        .expect("harness config has players");
        if let Some(events) = events {
            game = game.with_events(events);
        }
        Self {
            game,
            clock,
            frontend,
        }
    }

    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Moves the clock forward and polls the scheduler once.
    pub async fn advance(&mut self, secs: i64) -> TickReport {
        self.clock.advance(secs);
        self.game.tick().await
    }

    /// Starts the first round and releases the seekers.
    pub async fn to_seeking(&mut self) {
        self.game.tick().await;
        assert_eq!(self.game.phase(), GamePhase::HiderPhase);
        let hiding = self.game.config().timing.hiding_time;
        self.advance(hiding).await;
        assert_eq!(self.game.phase(), GamePhase::SeekerPhase);
    }
}

/// Default config for `players` with no start delay and a fixed seed.
pub fn config(players: &[&str]) -> GameConfig {
    GameConfig {
        players: players.iter().map(ToString::to_string).collect(),
        start_delay: 0,
        seed: Some(42),
        ..GameConfig::default()
    }
}

// ============================================================================
// Binary harness
// ============================================================================

/// A running `hideseek run` process with line-oriented console I/O.
///
/// The child process is killed on drop via `kill_on_drop(true)`.
pub struct HideSeekProcess {
    child: Child,
    stdin: tokio::process::ChildStdin,
    reader: BufReader<tokio::process::ChildStdout>,
}

impl HideSeekProcess {
    /// Runs `hideseek` with `args` to completion.
    pub fn spawn_command(args: &[&str]) -> Output {
        std::process::Command::new(env!("CARGO_BIN_EXE_hideseek"))
            .args(args)
            .env_remove("HIDESEEK_LOG_LEVEL")
            .output()
            .expect("failed to run hideseek")
    }

    /// Starts an interactive game with extra `run` arguments.
    pub fn spawn_game(args: &[&str]) -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_hideseek"))
            .arg("run")
            .args(args)
            .arg("--quiet")
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .expect("failed to spawn hideseek");

        let stdin = child.stdin.take().expect("stdin not captured");
        let stdout = child.stdout.take().expect("stdout not captured");
        Self {
            child,
            stdin,
            reader: BufReader::new(stdout),
        }
    }

    /// Writes one console line.
    pub async fn send_line(&mut self, line: &str) {
        self.stdin
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("failed to write to hideseek");
        self.stdin.flush().await.expect("failed to flush stdin");
    }

    /// Reads stdout until a line contains `needle`; returns everything read.
    ///
    /// Panics on EOF or timeout.
    pub async fn read_until(&mut self, needle: &str, timeout: Duration) -> String {
        let mut seen = String::new();
        let result = tokio::time::timeout(timeout, async {
            loop {
                let mut line = String::new();
                let n = self.reader.read_line(&mut line).await.expect("read failed");
                assert!(n > 0, "hideseek exited before printing '{needle}':\n{seen}");
                seen.push_str(&line);
                if line.contains(needle) {
                    return;
                }
            }
        })
        .await;
        assert!(result.is_ok(), "timed out waiting for '{needle}':\n{seen}");
        seen
    }

    /// Closes stdin and waits for the process to exit.
    pub async fn shutdown(self) -> std::process::ExitStatus {
        let Self {
            mut child, stdin, ..
        } = self;
        drop(stdin);
        match tokio::time::timeout(DEFAULT_TIMEOUT, child.wait()).await {
            Ok(status) => status.expect("wait failed"),
            Err(_) => {
                child.kill().await.expect("failed to kill child");
                panic!("hideseek did not exit after stdin closed");
            }
        }
    }

    /// Returns the path to a test fixture.
    #[must_use]
    pub fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }
}
