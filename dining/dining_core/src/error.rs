//! Error types for running a dining table.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while seating, running or dismissing a table
#[derive(Debug, Error)]
pub enum TableError {
    /// The configuration was rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A philosopher thread could not be started
    #[error("Failed to seat philosopher {id}: {source}")]
    Spawn {
        /// Philosopher that could not be seated
        id: usize,
        /// Underlying spawn failure
        #[source]
        source: std::io::Error,
    },

    /// A philosopher thread panicked, its statistics are lost
    #[error("Philosopher {0} panicked")]
    PhilosopherPanicked(usize),
}

/// Result alias for table operations
pub type Result<T> = std::result::Result<T, TableError>;
