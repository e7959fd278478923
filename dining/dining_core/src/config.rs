//! Configuration for a dining table run.
//!
//! Handles loading, defaulting and validating table parameters.

use std::fs;
use std::path::Path;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur in configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    /// The configuration text is not valid TOML for a table
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// The values parsed but describe an impossible table
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// What a philosopher does when it finds someone queued on its left utensil
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentionPolicy {
    /// Terminate the whole process with [`crate::CONTENTION_EXIT_CODE`]
    #[default]
    Exit,

    /// Raise every philosopher's stop flag and let the table wind down
    Halt,
}

/// Inclusive range of milliseconds a phase may last
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRange {
    /// Shortest duration (milliseconds)
    pub min_ms: u64,

    /// Longest duration (milliseconds)
    pub max_ms: u64,
}

impl PhaseRange {
    /// Create a range of `min_ms..=max_ms`
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }
}

impl Default for PhaseRange {
    fn default() -> Self {
        Self {
            min_ms: 10,
            max_ms: 989,
        }
    }
}

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Number of philosophers (and utensils) around the table
    #[serde(default = "default_philosophers")]
    pub philosophers: usize,

    /// Base seed; philosopher `i` seeds its generator with `seed + i`
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// How long to wait for the left utensil (milliseconds)
    #[serde(default = "default_left_timeout_ms")]
    pub left_timeout_ms: u64,

    /// How long to wait for the right utensil (milliseconds)
    #[serde(default = "default_right_timeout_ms")]
    pub right_timeout_ms: u64,

    /// Emit a trace event for every transition and utensil movement
    #[serde(default)]
    pub trace: bool,

    /// Reaction to a non-zero waiting count on the left utensil
    #[serde(default)]
    pub on_contention: ContentionPolicy,

    /// Range of thinking durations
    #[serde(default)]
    pub think_ms: PhaseRange,

    /// Range of eating durations
    #[serde(default)]
    pub eat_ms: PhaseRange,
}

fn default_philosophers() -> usize {
    5
}

fn default_seed() -> u64 {
    100
}

fn default_left_timeout_ms() -> u64 {
    1
}

fn default_right_timeout_ms() -> u64 {
    2
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            philosophers: default_philosophers(),
            seed: default_seed(),
            left_timeout_ms: default_left_timeout_ms(),
            right_timeout_ms: default_right_timeout_ms(),
            think_ms: PhaseRange::default(),
            eat_ms: PhaseRange::default(),
            trace: false,
            on_contention: ContentionPolicy::default(),
        }
    }
}

impl TableConfig {
    /// Load configuration from a TOML file, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                let content = fs::read_to_string(path).map_err(|e| {
                    ConfigError::LoadFailed(format!("{}: {}", path.display(), e))
                })?;
                Self::from_toml_str(&content)?
            }
            None => {
                info!("No configuration file specified, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from TOML text; missing fields take defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        // A ring needs two utensils to share
        if self.philosophers < 2 {
            return Err(ConfigError::Invalid(format!(
                "At least 2 philosophers are required, got {}",
                self.philosophers
            )));
        }

        if self.left_timeout_ms == 0 || self.right_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "Utensil timeouts cannot be zero".to_string(),
            ));
        }

        for (name, range) in [("think", &self.think_ms), ("eat", &self.eat_ms)] {
            if range.min_ms == 0 || range.min_ms > range.max_ms {
                return Err(ConfigError::Invalid(format!(
                    "Invalid {} range: {}..={} ms",
                    name, range.min_ms, range.max_ms
                )));
            }
        }

        Ok(())
    }

    /// Timeout for the left utensil
    pub fn left_timeout(&self) -> Duration {
        Duration::from_millis(self.left_timeout_ms)
    }

    /// Timeout for the right utensil
    pub fn right_timeout(&self) -> Duration {
        Duration::from_millis(self.right_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_classic_table() {
        let config = TableConfig::default();
        assert_eq!(config.philosophers, 5);
        assert_eq!(config.seed, 100);
        assert_eq!(config.left_timeout(), Duration::from_millis(1));
        assert_eq!(config.right_timeout(), Duration::from_millis(2));
        assert_eq!(config.think_ms, PhaseRange::new(10, 989));
        assert_eq!(config.on_contention, ContentionPolicy::Exit);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_takes_defaults() {
        let config = TableConfig::from_toml_str(
            r#"
            philosophers = 7
            on_contention = "halt"

            [eat_ms]
            min_ms = 1
            max_ms = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.philosophers, 7);
        assert_eq!(config.seed, 100);
        assert_eq!(config.on_contention, ContentionPolicy::Halt);
        assert_eq!(config.eat_ms, PhaseRange::new(1, 5));
        assert_eq!(config.think_ms, PhaseRange::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = TableConfig {
            philosophers: 3,
            trace: true,
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(TableConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let lonely = TableConfig {
            philosophers: 1,
            ..Default::default()
        };
        assert!(matches!(lonely.validate(), Err(ConfigError::Invalid(_))));

        let impatient = TableConfig {
            right_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(impatient.validate(), Err(ConfigError::Invalid(_))));

        let inverted = TableConfig {
            think_ms: PhaseRange::new(50, 10),
            ..Default::default()
        };
        assert!(matches!(inverted.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "seed = 42\nleft_timeout_ms = 4").unwrap();

        let config = TableConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.left_timeout_ms, 4);

        let missing = TableConfig::load(Some(Path::new("/nonexistent/dining.toml")));
        assert!(matches!(missing, Err(ConfigError::LoadFailed(_))));

        let garbage = TableConfig::from_toml_str("philosophers = \"many\"");
        assert!(matches!(garbage, Err(ConfigError::ParseFailed(_))));
    }
}
