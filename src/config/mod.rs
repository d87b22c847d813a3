//! Game configuration: schema, loading and validation.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLoader, LoadResult, LoadWarning, LoaderOptions};
pub use schema::{GameConfig, HandConfig, QuestionsConfig, TimingConfig};
pub use validation::{ValidationResult, Validator};
