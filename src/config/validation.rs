//! Configuration validation.
//!
//! Validation runs on the fully deserialized [`GameConfig`] after environment
//! overrides have been applied. It collects every issue rather than stopping
//! at the first one.

use std::collections::HashSet;

use crate::config::schema::GameConfig;
use crate::error::{Severity, ValidationIssue};

const ONE_DAY_SECS: i64 = 86_400;

/// Upper bound for any configured duration or delay.
pub const MAX_DURATION_SECS: i64 = 7 * ONE_DAY_SECS;

// ============================================================================
// Public API
// ============================================================================

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration and returns every issue found.
    pub fn validate(&mut self, config: &GameConfig) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_players(config);
        self.validate_timing(config);
        self.validate_hand(config);
        self.validate_questions(config);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Sections
    // ========================================================================

    fn validate_players(&mut self, config: &GameConfig) {
        if config.players.is_empty() {
            self.add_error("players", "at least one player is required");
            return;
        }

        let mut seen = HashSet::new();
        for (i, name) in config.players.iter().enumerate() {
            let path = format!("players[{i}]");
            let trimmed = name.trim();
            if trimmed.is_empty() {
                self.add_error(&path, "player name cannot be blank");
            } else if !seen.insert(trimmed.to_lowercase()) {
                self.add_error(&path, &format!("duplicate player name '{trimmed}'"));
            }
        }

        if config.players.len() == 1 {
            self.add_warning(
                "players",
                "only one player configured; that player will hide every round",
            );
        }

        if config.start_delay < 0 {
            self.add_error("start_delay", "start delay cannot be negative");
        } else if config.start_delay > MAX_DURATION_SECS {
            self.add_error("start_delay", "start delay cannot exceed one week");
        } else if config.start_delay > ONE_DAY_SECS {
            self.add_warning("start_delay", "first round starts more than a day from now");
        }
    }

    fn validate_timing(&mut self, config: &GameConfig) {
        let timing = &config.timing;
        let durations = [
            ("timing.hiding_time", timing.hiding_time),
            ("timing.planning_time", timing.planning_time),
            ("timing.max_seeking_time", timing.max_seeking_time),
            (
                "timing.allocated_question_time",
                timing.allocated_question_time,
            ),
            ("timing.allocated_photo_time", timing.allocated_photo_time),
            (
                "timing.card_selection_timeout",
                timing.card_selection_timeout,
            ),
        ];
        for (path, secs) in durations {
            if secs <= 0 {
                self.add_error(path, "duration must be greater than zero");
            } else if secs > MAX_DURATION_SECS {
                self.add_error(path, "duration cannot exceed one week");
            }
        }

        if timing.allocated_photo_time > 0
            && timing.allocated_photo_time < timing.allocated_question_time
        {
            self.add_warning(
                "timing.allocated_photo_time",
                "photo questions get less time than standard questions",
            );
        }

        if timing.max_seeking_time > 0 && timing.allocated_question_time > timing.max_seeking_time
        {
            self.add_warning(
                "timing.allocated_question_time",
                "question time exceeds the maximum seeking time",
            );
        }
    }

    fn validate_hand(&mut self, config: &GameConfig) {
        if config.hand.max_hand_size == 0 {
            self.add_error("hand.max_hand_size", "hand size must be at least 1");
        }
    }

    fn validate_questions(&mut self, config: &GameConfig) {
        if config.questions.tentacles_distance_km == 0 {
            self.add_error(
                "questions.tentacles_distance_km",
                "tentacles distance must be greater than zero",
            );
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> GameConfig {
        GameConfig {
            players: vec!["Ben".to_string(), "Adam".to_string()],
            ..GameConfig::default()
        }
    }

    fn validate(config: &GameConfig) -> ValidationResult {
        Validator::new().validate(config)
    }

    #[test]
    fn default_with_players_is_clean() {
        let result = validate(&valid());
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn no_players_is_an_error() {
        let result = validate(&GameConfig::default());
        assert!(result.has_errors());
        assert_eq!(result.errors[0].path, "players");
    }

    #[test]
    fn duplicate_and_blank_names() {
        let config = GameConfig {
            players: vec!["Ben".into(), " ".into(), "ben".into()],
            ..GameConfig::default()
        };
        let result = validate(&config);
        let paths: Vec<_> = result.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["players[1]", "players[2]"]);
    }

    #[test]
    fn all_zero_durations_are_reported() {
        let mut config = valid();
        config.timing.hiding_time = 0;
        config.timing.planning_time = 0;
        config.timing.card_selection_timeout = -1;
        let result = validate(&config);
        assert_eq!(result.errors.len(), 3);
    }

    #[test]
    fn zero_hand_and_tentacles() {
        let mut config = valid();
        config.hand.max_hand_size = 0;
        config.questions.tentacles_distance_km = 0;
        let result = validate(&config);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn warnings_do_not_fail() {
        let mut config = valid();
        config.players.truncate(1);
        config.timing.allocated_photo_time = 100;
        config.timing.allocated_question_time = 200;
        config.timing.max_seeking_time = 150;
        config.start_delay = ONE_DAY_SECS + 1;
        let result = validate(&config);
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 4);
    }

    #[test]
    fn durations_over_a_week_are_rejected() {
        let mut config = valid();
        config.timing.hiding_time = i64::MAX;
        config.timing.allocated_photo_time = MAX_DURATION_SECS + 1;
        config.start_delay = i64::MAX;
        let result = validate(&config);
        let paths: Vec<_> = result.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["start_delay", "timing.hiding_time", "timing.allocated_photo_time"]
        );

        config.timing.hiding_time = MAX_DURATION_SECS;
        config.timing.allocated_photo_time = MAX_DURATION_SECS;
        config.start_delay = MAX_DURATION_SECS;
        assert!(validate(&config).is_valid());
    }
}
