//! Static game content: hider cards and seeker questions.

pub mod cards;
pub mod questions;

pub use cards::{Card, CardKind, Powerup, deck_composition, standard_deck};
pub use questions::{
    QuestionCatalog, QuestionFamily, QuestionId, QuestionInstance, QuestionTemplate, Reward,
};
