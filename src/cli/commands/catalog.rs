//! `questions` and `cards` listings.

use std::str::FromStr;

use serde_json::json;

use crate::catalog::{QuestionCatalog, QuestionFamily, deck_composition};
use crate::cli::args::{CardsArgs, OutputFormat, QuestionsArgs};
use crate::config::GameConfig;
use crate::error::HideSeekError;

/// Print the question catalog.
///
/// # Errors
///
/// Returns a usage error for an unknown family.
pub fn questions(args: &QuestionsArgs) -> Result<(), HideSeekError> {
    let family = args
        .family
        .as_deref()
        .map(QuestionFamily::from_str)
        .transpose()
        .map_err(HideSeekError::Usage)?;
    let catalog = QuestionCatalog::standard(&GameConfig::default());
    let templates: Vec<_> = catalog
        .all()
        .iter()
        .filter(|t| family.is_none_or(|f| t.family == f))
        .collect();

    match args.format {
        OutputFormat::Human => {
            for t in &templates {
                println!(
                    "{:<44} draw {} keep {}  {}",
                    t.id.to_string(),
                    t.reward.draw,
                    t.reward.keep,
                    t.prompt
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&templates)?),
    }
    Ok(())
}

/// Print the standard deck composition.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn cards(args: &CardsArgs) -> Result<(), HideSeekError> {
    let composition = deck_composition();

    match args.format {
        OutputFormat::Human => {
            let total: usize = composition.iter().map(|(_, n)| n).sum();
            for (card, copies) in &composition {
                println!("{copies:>3} x {card}");
            }
            println!("{total} cards");
        }
        OutputFormat::Json => {
            let entries: Vec<_> = composition
                .iter()
                .map(|(card, copies)| json!({ "card": card, "copies": copies }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_family_is_usage_error() {
        let err = questions(&QuestionsArgs {
            family: Some("sonar".into()),
            format: OutputFormat::Human,
        })
        .unwrap_err();
        assert!(matches!(err, HideSeekError::Usage(_)));
    }

    #[test]
    fn listings_succeed() {
        questions(&QuestionsArgs {
            family: Some("radar".into()),
            format: OutputFormat::Json,
        })
        .unwrap();
        cards(&CardsArgs {
            format: OutputFormat::Json,
        })
        .unwrap();
    }
}
