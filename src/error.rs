//! Error types for `hideseek`
//!
//! Caller-facing game errors are recoverable: they are raised at the point of
//! violation and propagate unchanged to whoever issued the command. Config and
//! frontend errors are aggregated under [`HideSeekError`] for exit-code mapping.

use std::path::PathBuf;
use thiserror::Error;

use crate::game::GamePhase;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `hideseek` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Game rule error surfaced to the top level
    pub const GAME_ERROR: i32 = 5;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `hideseek` operations.
#[derive(Debug, Error)]
pub enum HideSeekError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Game rule violation
    #[error(transparent)]
    Game(#[from] GameError),

    /// Interaction surface failure
    #[error(transparent)]
    Frontend(#[from] FrontendError),

    /// Invalid command-line usage
    #[error("usage error: {0}")]
    Usage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl HideSeekError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Game(_) => ExitCode::GAME_ERROR,
            Self::Usage(_) => ExitCode::USAGE_ERROR,
            Self::Frontend(_) => ExitCode::ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("validation failed for {path}: {}", summarize(errors))]
    ValidationError {
        /// Path to the configuration file
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Configuration file has no content
    #[error("configuration file is empty: {path}")]
    Empty {
        /// Path to the empty file
        path: PathBuf,
    },

    /// Configuration file exceeds the size limit
    #[error("configuration file {path} is {size} bytes (limit: {limit})")]
    TooLarge {
        /// Path to the oversized file
        path: PathBuf,
        /// Actual size in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },
}

fn summarize(errors: &[ValidationIssue]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during configuration validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "timing.hiding_time")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - validation failure that prevents configuration from being used
    Error,
    /// Warning - potential issue that does not prevent configuration loading
    Warning,
}

// ============================================================================
// Game Errors
// ============================================================================

/// Rule violations raised synchronously by the game engine.
///
/// None of these are retried internally; the command handler reports them
/// to the player who issued the command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// A question is already awaiting an answer
    #[error("a question is already active; wait for it to be answered")]
    QuestionActive,

    /// The hider holds more cards than allowed and must discard first
    #[error("hand holds {hand_size} cards but the limit is {max_hand_size}; discard first")]
    HandSizeExceeded {
        /// Cards currently in hand
        hand_size: usize,
        /// Current hand size limit
        max_hand_size: usize,
    },

    /// The referenced card cannot be played or discarded right now
    #[error("card '{card}' cannot be played: {reason}")]
    CardNotPlayable {
        /// Card name as given by the caller
        card: String,
        /// Why the card was rejected
        reason: String,
    },

    /// The command is not valid in the current game phase
    #[error("cannot {action} during {phase}")]
    InvalidPhase {
        /// What the caller tried to do
        action: &'static str,
        /// Phase the game was in
        phase: GamePhase,
    },

    /// An answer arrived while no question was pending
    #[error("no question is awaiting an answer")]
    NoActiveQuestion,

    /// The question id does not exist in the catalog
    #[error("unknown question '{id}'{}", suggestion_suffix(suggestion.as_deref()))]
    UnknownQuestion {
        /// Id as given by the caller
        id: String,
        /// Closest catalog id, if any
        suggestion: Option<String>,
    },

    /// The seeker input does not fit the question family
    #[error("invalid input for '{question}': {message}")]
    InvalidQuestionInput {
        /// Question id
        question: String,
        /// What was wrong with the input
        message: String,
    },

    /// A game needs at least one player
    #[error("a game needs at least one player")]
    NoPlayers,

    /// The game actor has shut down
    #[error("the game is no longer running")]
    GameStopped,
}

/// Formats an optional "did you mean" hint.
#[must_use]
pub fn suggestion_suffix(suggestion: Option<&str>) -> String {
    suggestion.map_or_else(String::new, |s| format!(" (did you mean '{s}'?)"))
}

// ============================================================================
// Frontend Errors
// ============================================================================

/// Errors reported by an interaction surface.
#[derive(Debug, Error)]
pub enum FrontendError {
    /// The player picked cards that were not offered or the wrong number
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// The surface is gone (channel closed, stdin at EOF)
    #[error("frontend closed: {0}")]
    Closed(String),

    /// I/O failure while talking to the player
    #[error("frontend I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `hideseek` operations.
pub type Result<T> = std::result::Result<T, HideSeekError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::ERROR, 1);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::GAME_ERROR, 5);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
        assert_eq!(ExitCode::INTERRUPTED, 130);
        assert_eq!(ExitCode::TERMINATED, 143);
    }

    #[test]
    fn test_game_error_exit_code() {
        let err: HideSeekError = GameError::QuestionActive.into();
        assert_eq!(err.exit_code(), ExitCode::GAME_ERROR);
    }

    #[test]
    fn test_config_error_exit_code() {
        let err: HideSeekError = ConfigError::MissingFile {
            path: PathBuf::from("/test"),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_io_error_exit_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: HideSeekError = io_err.into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_usage_error_exit_code() {
        let err = HideSeekError::Usage("no players".to_string());
        assert_eq!(err.exit_code(), ExitCode::USAGE_ERROR);
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue {
            path: "timing.hiding_time".to_string(),
            message: "must be greater than zero".to_string(),
            severity: Severity::Error,
        };
        assert_eq!(
            issue.to_string(),
            "error: must be greater than zero at timing.hiding_time"
        );
    }

    #[test]
    fn test_validation_error_lists_issues() {
        let err = ConfigError::ValidationError {
            path: "game.yaml".to_string(),
            errors: vec![ValidationIssue {
                path: "players".to_string(),
                message: "at least one player is required".to_string(),
                severity: Severity::Error,
            }],
        };
        let text = err.to_string();
        assert!(text.contains("game.yaml"));
        assert!(text.contains("at least one player is required"));
    }

    #[test]
    fn test_hand_size_message() {
        let err = GameError::HandSizeExceeded {
            hand_size: 8,
            max_hand_size: 6,
        };
        assert_eq!(
            err.to_string(),
            "hand holds 8 cards but the limit is 6; discard first"
        );
    }

    #[test]
    fn test_unknown_question_suggestion() {
        let err = GameError::UnknownQuestion {
            id: "radar:5mk".to_string(),
            suggestion: Some("radar:5km".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "unknown question 'radar:5mk' (did you mean 'radar:5km'?)"
        );

        let bare = GameError::UnknownQuestion {
            id: "nope".to_string(),
            suggestion: None,
        };
        assert_eq!(bare.to_string(), "unknown question 'nope'");
    }

    #[test]
    fn test_invalid_phase_message() {
        let err = GameError::InvalidPhase {
            action: "ask a question",
            phase: GamePhase::HiderPhase,
        };
        assert_eq!(err.to_string(), "cannot ask a question during hiding phase");
    }
}
