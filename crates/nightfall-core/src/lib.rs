//! Game engine for Nightfall, a werewolf-style social deduction game.
//!
//! This crate owns the rules: configuration and its validation, seating,
//! the authoritative [`GameState`], night resolution, the day vote,
//! win conditions, and the phase controller that drives them.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `nightfall-config.yaml` into
//!   strongly-typed structs, plus validation.
//! - [`setup`] -- Seeded role assignment and participant list checks.
//! - [`state`] -- [`GameState`], the event log, and [`GameError`].
//! - [`decision`] -- [`DecisionSource`] trait, bounded dispatch, and the
//!   stub and scripted sources.
//! - [`night`] -- Night intent collection and the [`NightActionResolver`].
//! - [`voting`] -- Ballot collection, tally, and the [`VotingSystem`].
//! - [`victory`] -- The [`VictoryChecker`].
//! - [`engine`] -- The [`Engine`] phase controller and [`start`].
//!
//! [`GameState`]: state::GameState
//! [`GameError`]: state::GameError
//! [`DecisionSource`]: decision::DecisionSource
//! [`NightActionResolver`]: night::NightActionResolver
//! [`VotingSystem`]: voting::VotingSystem
//! [`VictoryChecker`]: victory::VictoryChecker
//! [`Engine`]: engine::Engine
//! [`start`]: engine::start

pub mod config;
pub mod decision;
pub mod engine;
pub mod night;
pub mod setup;
pub mod state;
pub mod victory;
pub mod voting;

pub use config::{ConfigError, GameConfig};
pub use decision::{DecisionError, DecisionSource, ScriptedDecisionSource, StubDecisionSource};
pub use engine::{Engine, GameOutcome, GameSummary, start};
pub use state::{GameError, GameState, Participant};
