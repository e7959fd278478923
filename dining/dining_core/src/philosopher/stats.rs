//! Per-philosopher turn and time accounting.

use serde::Serialize;

/// Average time per turn, or zero when no turn was taken.
pub fn average(turns: u64, total_ms: f64) -> f64 {
    if turns == 0 {
        0.0
    } else {
        total_ms / turns as f64
    }
}

/// Turns and accumulated time spent in one phase
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseStats {
    /// Number of times the phase was entered
    pub turns: u64,

    /// Cumulative time in the phase (milliseconds)
    pub total_ms: f64,
}

impl PhaseStats {
    /// Count one more turn in this phase
    pub fn count_turn(&mut self) {
        self.turns += 1;
    }

    /// Add time to the phase total; negative or NaN values are ignored
    pub fn add_time(&mut self, elapsed_ms: f64) {
        if elapsed_ms > 0.0 {
            self.total_ms += elapsed_ms;
        }
    }

    /// Count a turn together with its duration
    pub fn record(&mut self, elapsed_ms: f64) {
        self.count_turn();
        self.add_time(elapsed_ms);
    }

    /// Average time per turn (milliseconds)
    pub fn average_ms(&self) -> f64 {
        average(self.turns, self.total_ms)
    }
}

/// Everything a philosopher accumulated during its run
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct PhilosopherStats {
    /// Philosopher id
    pub id: usize,

    /// Thinking turns and time
    pub thinking: PhaseStats,

    /// Hungry turns and the time spent waiting for both utensils
    pub hungry: PhaseStats,

    /// Eating turns and time
    pub eating: PhaseStats,
}

impl PhilosopherStats {
    /// Empty statistics for philosopher `id`
    pub fn new(id: usize) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}
