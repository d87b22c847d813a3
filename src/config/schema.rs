//! Configuration schema types.
//!
//! Every section is optional in YAML and falls back to the standard game
//! rules. Durations are whole seconds.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ============================================================================
// Top-Level Configuration
// ============================================================================

/// Root configuration for a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Player names, in seating order
    pub players: Vec<String>,

    /// Seconds between startup and the first round
    pub start_delay: i64,

    /// Seed for deck shuffles and player selection (random when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Phase and answer timings
    pub timing: TimingConfig,

    /// Hider hand settings
    pub hand: HandConfig,

    /// Question catalog settings
    pub questions: QuestionsConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            players: Vec::new(),
            start_delay: 5,
            seed: None,
            timing: TimingConfig::default(),
            hand: HandConfig::default(),
            questions: QuestionsConfig::default(),
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Phase and answer timings, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Head start before seekers are released
    pub hiding_time: i64,

    /// Break between a catch and the next round
    pub planning_time: i64,

    /// Seeking time after which everyone is notified
    pub max_seeking_time: i64,

    /// Time the hider has to answer a standard question
    pub allocated_question_time: i64,

    /// Time the hider has to answer a photo question
    pub allocated_photo_time: i64,

    /// How long the hider may deliberate over a card selection
    pub card_selection_timeout: i64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            hiding_time: 2700,
            planning_time: 600,
            max_seeking_time: 14_400,
            allocated_question_time: 300,
            allocated_photo_time: 600,
            card_selection_timeout: 300,
        }
    }
}

impl TimingConfig {
    /// Card selection timeout as a [`Duration`]. Negative values clamp to zero.
    #[must_use]
    pub fn selection_timeout(&self) -> Duration {
        Duration::from_secs(u64::try_from(self.card_selection_timeout).unwrap_or(0))
    }
}

/// Hider hand settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HandConfig {
    /// Cards the hider may hold before `HandLock` applies
    pub max_hand_size: usize,
}

impl Default for HandConfig {
    fn default() -> Self {
        Self { max_hand_size: 6 }
    }
}

/// Question catalog settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuestionsConfig {
    /// Reach of tentacles questions in kilometres
    pub tentacles_distance_km: u32,
}

impl Default for QuestionsConfig {
    fn default() -> Self {
        Self {
            tentacles_distance_km: 2,
        }
    }
}
