//! Error types for the Nightfall engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup, play, and report output.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: nightfall_core::ConfigError,
    },

    /// The game aborted.
    #[error("game error: {source}")]
    Game {
        /// The underlying game error.
        #[from]
        source: nightfall_core::GameError,
    },

    /// The game report could not be written.
    #[error("io error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The game report could not be serialized.
    #[error("report error: {source}")]
    Report {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
