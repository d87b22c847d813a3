//! Game engine: phases, conditions, deck and question bookkeeping.

pub mod conditions;
pub mod deck;
pub mod investigation;
pub mod state;
pub mod task;

pub use conditions::{Condition, ConditionManager, ReleaseAction};
pub use deck::{HiderDeck, PlayOutcome, RewardOutcome};
pub use investigation::{AnsweredSummary, InvestigationBook};
pub use state::{AnswerReport, GamePhase, GameSnapshot, GameState, TickReport};
pub use task::GameTask;
