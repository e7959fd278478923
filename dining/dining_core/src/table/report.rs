//! Final statistics handed back by a table.

use serde::Serialize;

use crate::philosopher::{ContentionReport, PhaseStats, PhilosopherStats};
use crate::sync::UtensilStats;

/// Turns, total and average time of one phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseReport {
    /// Number of turns
    pub turns: u64,

    /// Cumulative time (milliseconds)
    pub total_ms: f64,

    /// Time per turn, zero without turns (milliseconds)
    pub average_ms: f64,
}

impl From<PhaseStats> for PhaseReport {
    fn from(stats: PhaseStats) -> Self {
        Self {
            turns: stats.turns,
            total_ms: stats.total_ms,
            average_ms: stats.average_ms(),
        }
    }
}

/// Per-philosopher section of the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhilosopherReport {
    /// Philosopher id
    pub id: usize,

    /// Thinking phase
    pub thinking: PhaseReport,

    /// Hungry phase
    pub hungry: PhaseReport,

    /// Eating phase
    pub eating: PhaseReport,
}

impl From<PhilosopherStats> for PhilosopherReport {
    fn from(stats: PhilosopherStats) -> Self {
        Self {
            id: stats.id,
            thinking: stats.thinking.into(),
            hungry: stats.hungry.into(),
            eating: stats.eating.into(),
        }
    }
}

/// Everything known about a finished table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableReport {
    /// Base seed of the run
    pub seed: u64,

    /// Wall-clock time between seating and the last philosopher leaving
    pub elapsed_ms: f64,

    /// One entry per philosopher, ordered by id
    pub philosophers: Vec<PhilosopherReport>,

    /// One entry per utensil, ordered by id
    pub utensils: Vec<UtensilStats>,

    /// Set when the table was halted by the contention check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contention: Option<ContentionReport>,
}

impl TableReport {
    /// Meals eaten around the whole table
    pub fn total_meals(&self) -> u64 {
        self.philosophers.iter().map(|p| p.eating.turns).sum()
    }

    /// Report of philosopher `id`
    pub fn philosopher(&self, id: usize) -> Option<&PhilosopherReport> {
        self.philosophers.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_report_derives_average() {
        let starving = PhaseReport::from(PhaseStats::default());
        assert_eq!(starving.average_ms, 0.0);

        let fed = PhaseReport::from(PhaseStats {
            turns: 4,
            total_ms: 90.0,
        });
        assert_eq!(fed.average_ms, 22.5);
    }

    #[test]
    fn test_total_meals_and_lookup() {
        let mut first = PhilosopherStats::new(0);
        first.eating.record(10.0);
        let mut second = PhilosopherStats::new(1);
        second.eating.record(20.0);
        second.eating.record(30.0);

        let report = TableReport {
            seed: 100,
            elapsed_ms: 1.0,
            philosophers: vec![first.into(), second.into()],
            utensils: vec![],
            contention: None,
        };

        assert_eq!(report.total_meals(), 3);
        assert_eq!(report.philosopher(1).unwrap().eating.average_ms, 25.0);
        assert!(report.philosopher(2).is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("contention").is_none());
        assert_eq!(json["philosophers"][1]["eating"]["turns"], 2);
    }
}
