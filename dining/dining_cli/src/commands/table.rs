//! Table parameters shared by every subcommand
//!
//! Values come from an optional TOML file; flags given on the command line
//! override them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use dining_core::{ContentionPolicy, TableConfig};

/// Reaction to a queued left utensil
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ContentionArg {
    /// End the process immediately
    Exit,
    /// Stop every philosopher and report
    Halt,
}

impl From<ContentionArg> for ContentionPolicy {
    fn from(arg: ContentionArg) -> Self {
        match arg {
            ContentionArg::Exit => ContentionPolicy::Exit,
            ContentionArg::Halt => ContentionPolicy::Halt,
        }
    }
}

/// Arguments describing the table
#[derive(Args, Debug, Default)]
pub struct TableArgs {
    /// Path to a TOML configuration file
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Number of philosophers around the table
    #[clap(long)]
    pub philosophers: Option<usize>,

    /// Base random seed; philosopher i uses seed + i
    #[clap(long)]
    pub seed: Option<u64>,

    /// Wait for the left utensil, in milliseconds
    #[clap(long)]
    pub left_timeout_ms: Option<u64>,

    /// Wait for the right utensil, in milliseconds
    #[clap(long)]
    pub right_timeout_ms: Option<u64>,

    /// Shortest thinking time, in milliseconds
    #[clap(long)]
    pub think_min_ms: Option<u64>,

    /// Longest thinking time, in milliseconds
    #[clap(long)]
    pub think_max_ms: Option<u64>,

    /// Shortest eating time, in milliseconds
    #[clap(long)]
    pub eat_min_ms: Option<u64>,

    /// Longest eating time, in milliseconds
    #[clap(long)]
    pub eat_max_ms: Option<u64>,

    /// Log every state change and utensil movement
    #[clap(long)]
    pub trace: bool,

    /// What to do when a philosopher finds someone queued on its left utensil
    #[clap(long, value_enum)]
    pub on_contention: Option<ContentionArg>,
}

impl TableArgs {
    /// Merge file and flags into a validated configuration
    pub fn resolve(&self) -> Result<TableConfig> {
        let mut config = TableConfig::load(self.config.as_deref())
            .context("Failed to load table configuration")?;

        if let Some(philosophers) = self.philosophers {
            config.philosophers = philosophers;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(timeout) = self.left_timeout_ms {
            config.left_timeout_ms = timeout;
        }
        if let Some(timeout) = self.right_timeout_ms {
            config.right_timeout_ms = timeout;
        }
        if let Some(min) = self.think_min_ms {
            config.think_ms.min_ms = min;
        }
        if let Some(max) = self.think_max_ms {
            config.think_ms.max_ms = max;
        }
        if let Some(min) = self.eat_min_ms {
            config.eat_ms.min_ms = min;
        }
        if let Some(max) = self.eat_max_ms {
            config.eat_ms.max_ms = max;
        }
        if self.trace {
            config.trace = true;
        }
        if let Some(policy) = self.on_contention {
            config.on_contention = policy.into();
        }

        config
            .validate()
            .context("Invalid table configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dining_core::PhaseRange;

    #[test]
    fn test_flags_override_defaults() {
        let args = TableArgs {
            philosophers: Some(3),
            think_min_ms: Some(2),
            think_max_ms: Some(4),
            trace: true,
            on_contention: Some(ContentionArg::Halt),
            ..Default::default()
        };

        let config = args.resolve().unwrap();
        assert_eq!(config.philosophers, 3);
        assert_eq!(config.seed, 100);
        assert_eq!(config.think_ms, PhaseRange::new(2, 4));
        assert!(config.trace);
        assert_eq!(config.on_contention, ContentionPolicy::Halt);
    }

    #[test]
    fn test_overrides_are_validated() {
        let args = TableArgs {
            eat_min_ms: Some(50),
            eat_max_ms: Some(5),
            ..Default::default()
        };

        let err = args.resolve().unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid eat range"));
    }
}
