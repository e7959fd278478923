//! Reactions to the waiting-count contention check.
//!
//! Before reaching for its left utensil a philosopher looks at how many
//! callers are already blocked on it. Any non-zero count is treated as a
//! possible deadlock and handed to a [`ContentionHandler`]. The check is
//! crude: a queued neighbour can simply be unlucky scheduling. The default
//! handler nevertheless ends the whole process.

use std::process;
use std::sync::Arc;

use log::{error, warn};
use parking_lot::Mutex;
use serde::Serialize;

use crate::sync::StopFlag;

/// Exit status of a process ended by [`ExitProcess`]
pub const CONTENTION_EXIT_CODE: i32 = 3;

/// What the philosopher saw when the check fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContentionReport {
    /// Philosopher that ran the check
    pub philosopher: usize,

    /// Its left utensil
    pub utensil: usize,

    /// Callers blocked on that utensil at the time
    pub waiting: usize,
}

/// Decides what happens once contention is detected.
///
/// After the handler returns, the philosopher abandons its cycle holding
/// nothing and goes back to its loop boundary.
pub trait ContentionHandler: Send + Sync {
    /// React to a contention report
    fn on_contention(&self, report: ContentionReport);
}

/// Ends the process with [`CONTENTION_EXIT_CODE`]
#[derive(Debug, Default, Clone, Copy)]
pub struct ExitProcess;

impl ContentionHandler for ExitProcess {
    fn on_contention(&self, report: ContentionReport) {
        error!(
            "Philosopher {} found {} waiting on utensil {}, aborting",
            report.philosopher, report.waiting, report.utensil
        );
        process::exit(CONTENTION_EXIT_CODE);
    }
}

/// Stops every philosopher at the table and remembers the first report
#[derive(Debug)]
pub struct HaltTable {
    flags: Vec<Arc<StopFlag>>,
    first: Mutex<Option<ContentionReport>>,
}

impl HaltTable {
    /// Halt handler over the given stop flags
    pub fn new(flags: Vec<Arc<StopFlag>>) -> Self {
        Self {
            flags,
            first: Mutex::new(None),
        }
    }

    /// The report that halted the table, if any
    pub fn report(&self) -> Option<ContentionReport> {
        *self.first.lock()
    }

    /// Whether the table has been halted
    pub fn is_tripped(&self) -> bool {
        self.first.lock().is_some()
    }
}

impl ContentionHandler for HaltTable {
    fn on_contention(&self, report: ContentionReport) {
        {
            let mut first = self.first.lock();
            if first.is_some() {
                return;
            }
            *first = Some(report);
        }

        warn!(
            "Philosopher {} found {} waiting on utensil {}, halting the table",
            report.philosopher, report.waiting, report.utensil
        );
        for flag in &self.flags {
            flag.raise();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halt_table_raises_every_flag_once() {
        let flags: Vec<_> = (0..3).map(|_| Arc::new(StopFlag::new())).collect();
        let halt = HaltTable::new(flags.clone());
        assert!(!halt.is_tripped());

        let first = ContentionReport {
            philosopher: 1,
            utensil: 1,
            waiting: 1,
        };
        halt.on_contention(first);
        halt.on_contention(ContentionReport {
            philosopher: 2,
            utensil: 2,
            waiting: 2,
        });

        assert!(halt.is_tripped());
        assert_eq!(halt.report(), Some(first));
        assert!(flags.iter().all(|f| f.is_raised()));
    }
}
