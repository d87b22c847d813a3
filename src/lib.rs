//! `hideseek` - wall-clock driven hide-and-seek game engine
//!
//! The engine runs a round-based hiding game: a hider hides, seekers ask
//! timed questions, answers pay the hider in cards, and the hider's score is
//! the time survived plus bonuses. Every transition is driven by a
//! [`scheduler::Scheduler`] polled against a [`clock::Clock`].

pub mod catalog;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod frontend;
pub mod game;
pub mod observability;
pub mod scheduler;
pub mod server;
