//! Nightfall game runner.
//!
//! Loads configuration, seats a table of seeded random bots, plays one
//! game to the end, and writes the outcome (event log and summary) to
//! stdout as JSON. Logs go to stderr so the report can be piped.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (first CLI argument, `NIGHTFALL_CONFIG`, or
//!    `nightfall-config.yaml`; defaults if the file is missing)
//! 2. Initialize structured logging (tracing)
//! 3. Create the bot decision source from the configured seed
//! 4. Validate, seat the table, and play the game
//! 5. Log the summary and write the report

mod bots;
mod error;

use std::io::Write;
use std::path::PathBuf;

use nightfall_core::config::LoggingConfig;
use nightfall_core::{GameConfig, GameOutcome, GameSummary};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::bots::RandomBots;
use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "nightfall-config.yaml";

/// What the binary writes to stdout.
#[derive(Debug, Serialize)]
struct Report<'a> {
    summary: GameSummary,
    outcome: &'a GameOutcome,
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the game aborts, or
/// the report cannot be written.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so this step is silent.
    let config_path = config_path();
    let (config, from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("nightfall-engine starting");
    if from_file {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        table = config.game.name,
        seed = config.game.seed,
        total_players = config.game.total_players,
        max_rounds = ?config.game.max_rounds,
        "Table configured"
    );

    // 3. Create the decision source.
    let bots = RandomBots::new(config.game.seed);

    // 4. Play.
    let outcome = nightfall_core::start(config, &bots)
        .await
        .map_err(EngineError::from)?;

    // 5. Report.
    let summary = outcome.summary();
    info!(
        game_id = %outcome.game_id,
        verdict = ?summary.verdict,
        rounds_played = summary.rounds_played,
        deaths = summary.deaths.len(),
        events = outcome.events.len(),
        "Game finished"
    );
    write_report(&Report {
        summary,
        outcome: &outcome,
    })?;

    Ok(())
}

/// Resolve the configuration path: first CLI argument, then
/// `NIGHTFALL_CONFIG`, then the default file name.
fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("NIGHTFALL_CONFIG").ok())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load configuration from `path`, falling back to defaults if the file
/// does not exist. The flag reports whether the file was read.
fn load_config(path: &std::path::Path) -> Result<(GameConfig, bool), EngineError> {
    if path.exists() {
        let config = GameConfig::from_file(path)?;
        Ok((config, true))
    } else {
        Ok((GameConfig::default(), false))
    }
}

/// Install the tracing subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if logging.format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn write_report(report: &Report<'_>) -> Result<(), EngineError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, report)?;
    writeln!(stdout)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nightfall_types::{GameEvent, Verdict};

    use super::*;

    #[test]
    fn missing_config_file_uses_defaults() {
        let (config, from_file) =
            load_config(std::path::Path::new("does-not-exist/nightfall-config.yaml")).unwrap();
        assert!(!from_file);
        assert_eq!(config, GameConfig::default());
    }

    #[tokio::test]
    async fn bots_play_a_default_game_to_the_end() {
        let config = GameConfig::default();
        let bots = RandomBots::new(config.game.seed);
        let outcome = nightfall_core::start(config, &bots).await.unwrap();

        assert!(outcome.verdict.is_terminal());
        assert!(matches!(
            outcome.events.last(),
            Some(GameEvent::GameEnded { .. })
        ));

        let json = serde_json::to_value(Report {
            summary: outcome.summary(),
            outcome: &outcome,
        })
        .unwrap();
        assert!(json["outcome"]["events"].is_array());
        assert_ne!(json["summary"]["verdict"], serde_json::json!(Verdict::Ongoing));
    }

    #[tokio::test]
    async fn bot_games_are_reproducible() {
        let play = |seed: u64| async move {
            let mut config = GameConfig::default();
            config.game.seed = seed;
            let bots = RandomBots::new(seed);
            nightfall_core::start(config, &bots).await.unwrap().events
        };
        assert_eq!(play(7).await, play(7).await);
    }
}
