//! `validate` command.
//!
//! Loads each file through the full pipeline and reports every result
//! before failing, so one bad file does not hide problems in the others.

use std::path::Path;

use serde_json::json;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::{ConfigLoader, LoadWarning};
use crate::error::{ConfigError, HideSeekError, Severity, ValidationIssue};

/// Validate configuration files without starting a game.
///
/// # Errors
///
/// Returns the first file's configuration error, or a validation error
/// built from warnings when `--strict` is set.
pub fn run(args: &ValidateArgs) -> Result<(), HideSeekError> {
    let loader = ConfigLoader::with_defaults();
    let mut first_error = None;

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating configuration");
        let outcome = check(&loader, path, args.strict);
        report(args.format, path, &outcome);
        if let Err(e) = outcome {
            first_error.get_or_insert(e);
        }
    }

    first_error.map_or(Ok(()), |e| Err(e.into()))
}

fn check(loader: &ConfigLoader, path: &Path, strict: bool) -> Result<Vec<LoadWarning>, ConfigError> {
    let result = loader.load(path)?;
    if strict && !result.warnings.is_empty() {
        return Err(ConfigError::ValidationError {
            path: path.display().to_string(),
            errors: result
                .warnings
                .into_iter()
                .map(|w| ValidationIssue {
                    path: w.location.unwrap_or_default(),
                    message: w.message,
                    severity: Severity::Error,
                })
                .collect(),
        });
    }
    Ok(result.warnings)
}

fn report(format: OutputFormat, path: &Path, outcome: &Result<Vec<LoadWarning>, ConfigError>) {
    match format {
        OutputFormat::Human => match outcome {
            Ok(warnings) => {
                println!("ok: {}", path.display());
                for warning in warnings {
                    println!("  warning: {warning}");
                }
            }
            Err(e) => println!("invalid: {}\n  {e}", path.display()),
        },
        OutputFormat::Json => {
            let value = match outcome {
                Ok(warnings) => json!({
                    "file": path.display().to_string(),
                    "valid": true,
                    "warnings": warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
                }),
                Err(e) => json!({
                    "file": path.display().to_string(),
                    "valid": false,
                    "error": e.to_string(),
                }),
            };
            println!("{value}");
        }
    }
}
