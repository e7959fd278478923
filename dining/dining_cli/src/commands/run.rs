//! `run`: seat the table and report once the run limit is reached

use std::process;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use dining_core::{RunLimit, Table, CONTENTION_EXIT_CODE};
use tracing::warn;

use super::table::TableArgs;
use crate::{logging, report};

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    #[clap(flatten)]
    pub table: TableArgs,

    /// Stop after this many seconds
    #[clap(long, conflicts_with = "meals", allow_negative_numbers = true)]
    pub duration_secs: Option<f64>,

    /// Stop once every philosopher has eaten this many meals
    #[clap(long)]
    pub meals: Option<u64>,

    /// Report format
    #[clap(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl RunArgs {
    /// Run limit; ten seconds when none is given
    pub fn limit(&self) -> Result<RunLimit> {
        match (self.meals, self.duration_secs) {
            (Some(meals), _) => Ok(RunLimit::Meals(meals)),
            (None, Some(secs)) => {
                if !secs.is_finite() || secs < 0.0 {
                    bail!(
                        "Invalid --duration-secs {}: expected a finite, non-negative number",
                        secs
                    );
                }
                let duration = Duration::try_from_secs_f64(secs)
                    .with_context(|| format!("Invalid --duration-secs {}", secs))?;
                Ok(RunLimit::Duration(duration))
            }
            (None, None) => Ok(RunLimit::Duration(Duration::from_secs(10))),
        }
    }
}

/// Run the table and print its report
pub fn execute(args: &RunArgs) -> Result<()> {
    let config = args.table.resolve()?;
    let limit = args.limit()?;
    logging::init(config.trace)?;

    let table = Table::start(config).context("Failed to seat the table")?;
    let report = table.run(limit).context("Failed to run the table")?;

    match args.format {
        OutputFormat::Text => print!("{}", report::render(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if let Some(contention) = report.contention {
        warn!(
            "Table halted: philosopher {} found {} waiting on utensil {}",
            contention.philosopher, contention.waiting, contention.utensil
        );
        process::exit(CONTENTION_EXIT_CODE);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(meals: Option<u64>, duration_secs: Option<f64>) -> RunArgs {
        RunArgs {
            table: TableArgs::default(),
            duration_secs,
            meals,
            format: OutputFormat::Text,
        }
    }

    #[test]
    fn test_limit_defaults_to_ten_seconds() {
        assert_eq!(
            args(None, None).limit().unwrap(),
            RunLimit::Duration(Duration::from_secs(10))
        );
        assert_eq!(args(Some(4), None).limit().unwrap(), RunLimit::Meals(4));
        assert_eq!(
            args(None, Some(0.5)).limit().unwrap(),
            RunLimit::Duration(Duration::from_millis(500))
        );
    }

    #[test]
    fn test_limit_rejects_unusable_durations() {
        for secs in [f64::INFINITY, f64::NAN, -1.0, 1e300] {
            let err = args(None, Some(secs)).limit().unwrap_err();
            assert!(err.to_string().contains("Invalid --duration-secs"), "{}", err);
        }
    }
}
