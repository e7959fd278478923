#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

//! # Dining Core
//!
//! A ring of philosophers competing for shared utensils.
//!
//! This crate provides:
//!
//! - Utensils: exclusive locks with bounded waits and a visible waiting count
//! - Philosophers: threads cycling think / hungry / eat with per-phase
//!   statistics
//! - The table: ring wiring, start, stop and statistics collection
//! - Configuration and run limits for a whole simulation
//!
//! No wait is unbounded: a philosopher that cannot get its right utensil in
//! time puts its left one back and starts over. Before reaching for its left
//! utensil, a philosopher checks whether anyone is already queued on it and,
//! by default, ends the process if so.

/// Table configuration
pub mod config;

/// Error types
pub mod error;

/// Philosophers and their cycle
pub mod philosopher;

/// Utensils and shared atomics
pub mod sync;

/// Ring coordinator and reports
pub mod table;

pub use config::{ConfigError, ContentionPolicy, PhaseRange, TableConfig};
pub use error::{Result, TableError};
pub use philosopher::{
    average, ContentionHandler, ContentionReport, CycleOutcome, Philosopher, PhilosopherState,
    PhilosopherStats, PhilosopherTiming, RecordingSink, TraceEvent, TraceKind, TraceSink,
    CONTENTION_EXIT_CODE,
};
pub use sync::{Utensil, UtensilGuard, UtensilStats};
pub use table::{RunLimit, Table, TableBuilder, TableReport};
