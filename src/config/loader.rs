//! Configuration loader.
//!
//! Pipeline:
//! 1. Size check
//! 2. Read (UTF-8 BOM stripped)
//! 3. Empty check
//! 4. YAML parsing into [`GameConfig`]
//! 5. `HIDESEEK_*` environment overrides
//! 6. Validation
//! 7. Freeze with `Arc`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::schema::GameConfig;
use crate::config::validation::Validator;
use crate::error::ConfigError;

// ============================================================================
// Public API
// ============================================================================

/// Options for the configuration loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Limits for configuration size.
    pub config_limits: ConfigLimits,

    /// Skip `HIDESEEK_*` environment overrides.
    pub ignore_env: bool,
}

/// Limits guarding against oversized configuration files.
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    /// Maximum configuration file size in bytes.
    pub max_config_size: u64,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_config_size: env_or("HIDESEEK_MAX_CONFIG_SIZE", 1024 * 1024),
        }
    }
}

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated configuration.
    pub config: Arc<GameConfig>,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during configuration loading.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} (at {location})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Configuration loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    /// Creates a new configuration loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a new configuration loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Loads a configuration file and returns the frozen configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file is missing, unreadable, empty or over the size limit
    /// - YAML parsing fails
    /// - An environment override does not parse
    /// - Validation finds errors
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let config = self.read(path)?;
        self.finalize(config, &path.display().to_string())
    }

    /// Reads and parses a configuration file without overrides or
    /// validation, for callers that layer more settings on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, empty, over the
    /// size limit or not valid YAML for the schema.
    pub fn read(&self, path: &Path) -> Result<GameConfig, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let limit = self.options.config_limits.max_config_size;
        if metadata.len() > limit {
            return Err(ConfigError::TooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                limit,
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        Self::parse_str(&raw, path)
    }

    /// Loads configuration from YAML text. `origin` is used in error messages.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigLoader::load`], minus file access errors.
    pub fn load_str(&self, raw: &str, origin: &Path) -> Result<LoadResult, ConfigError> {
        let config = Self::parse_str(raw, origin)?;
        self.finalize(config, &origin.display().to_string())
    }

    fn parse_str(raw: &str, origin: &Path) -> Result<GameConfig, ConfigError> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        if raw.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: origin.to_path_buf(),
            });
        }

        let value: serde_yaml::Value =
            serde_yaml::from_str(raw).map_err(|e| parse_error(origin, &e))?;
        if value.is_null() {
            return Err(ConfigError::Empty {
                path: origin.to_path_buf(),
            });
        }

        serde_yaml::from_value(value).map_err(|e| parse_error(origin, &e))
    }

    /// Applies environment overrides and validation to an in-memory config.
    ///
    /// Used when the configuration comes from command-line flags instead of
    /// a file.
    ///
    /// # Errors
    ///
    /// Returns an error if an override does not parse or validation fails.
    pub fn finalize(
        &self,
        mut config: GameConfig,
        origin: &str,
    ) -> Result<LoadResult, ConfigError> {
        if !self.options.ignore_env {
            apply_overrides(&mut config, |name| std::env::var(name).ok())?;
        }

        let result = Validator::new().validate(&config);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: origin.to_string(),
                errors: result.errors,
            });
        }

        let warnings = result
            .warnings
            .into_iter()
            .map(|issue| LoadWarning {
                message: issue.message,
                location: Some(issue.path),
            })
            .collect();

        Ok(LoadResult {
            config: Arc::new(config),
            warnings,
        })
    }
}

fn parse_error(origin: &Path, err: &serde_yaml::Error) -> ConfigError {
    ConfigError::ParseError {
        path: PathBuf::from(origin),
        line: err.location().map(|l| l.line()),
        message: err.to_string(),
    }
}

// ============================================================================
// Environment Overrides
// ============================================================================

/// Applies `HIDESEEK_*` overrides read through `lookup`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] when a variable is set but does not
/// parse as a number.
pub fn apply_overrides<F>(config: &mut GameConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let timing = &mut config.timing;
    override_from(&lookup, "HIDESEEK_HIDING_TIME", &mut timing.hiding_time)?;
    override_from(&lookup, "HIDESEEK_PLANNING_TIME", &mut timing.planning_time)?;
    override_from(
        &lookup,
        "HIDESEEK_MAX_SEEKING_TIME",
        &mut timing.max_seeking_time,
    )?;
    override_from(
        &lookup,
        "HIDESEEK_ALLOCATED_QUESTION_TIME",
        &mut timing.allocated_question_time,
    )?;
    override_from(
        &lookup,
        "HIDESEEK_ALLOCATED_PHOTO_TIME",
        &mut timing.allocated_photo_time,
    )?;
    override_from(
        &lookup,
        "HIDESEEK_CARD_SELECTION_TIMEOUT",
        &mut timing.card_selection_timeout,
    )?;
    override_from(
        &lookup,
        "HIDESEEK_MAX_HAND_SIZE",
        &mut config.hand.max_hand_size,
    )?;
    override_from(
        &lookup,
        "HIDESEEK_TENTACLES_DISTANCE",
        &mut config.questions.tentacles_distance_km,
    )?;
    Ok(())
}

fn override_from<F, T>(lookup: &F, name: &str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let Some(raw) = lookup(name) else {
        return Ok(());
    };
    *slot = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: name.to_string(),
        value: raw.clone(),
        expected: "a whole number".to_string(),
    })?;
    tracing::debug!(variable = name, value = %raw, "applied environment override");
    Ok(())
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
