//! The table: a ring of utensils and the philosophers between them.
//!
//! Philosopher `i` sits between utensil `i` (left) and utensil
//! `(i + 1) % n` (right). The table seats everyone on named threads, raises
//! their stop flags when asked, and joins them to collect statistics.

pub mod report;

use std::fmt;
use std::mem;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{error, info};

use crate::config::{ContentionPolicy, TableConfig};
use crate::error::{Result, TableError};
use crate::philosopher::{
    ContentionHandler, ContentionReport, ExitProcess, HaltTable, LogSink, Pause, Philosopher,
    PhilosopherStats, PhilosopherTiming, ThreadPause, TraceSink,
};
use crate::sync::{MealCounter, StopFlag, Utensil};

pub use report::{PhaseReport, PhilosopherReport, TableReport};

/// How often [`Table::run`] looks at progress
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Left and right utensil of philosopher `id` at a table of `n`
pub fn ring_neighbours(id: usize, n: usize) -> (usize, usize) {
    (id, (id + 1) % n)
}

/// When [`Table::run`] stops the philosophers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLimit {
    /// After a fixed amount of wall-clock time
    Duration(Duration),

    /// Once every philosopher has eaten at least this many meals
    Meals(u64),
}

impl fmt::Display for RunLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duration(d) => write!(f, "{:.1}s have passed", d.as_secs_f64()),
            Self::Meals(n) => write!(f, "everyone has eaten {} meals", n),
        }
    }
}

/// A seated philosopher as seen from the table
struct Seat {
    id: usize,
    stop: Arc<StopFlag>,
    meals: Arc<MealCounter>,
    handle: JoinHandle<PhilosopherStats>,
}

/// Sets up a table with optional replacement collaborators
pub struct TableBuilder {
    config: TableConfig,
    pause: Arc<dyn Pause>,
    trace: Option<Arc<dyn TraceSink>>,
    contention: Option<Arc<dyn ContentionHandler>>,
}

impl TableBuilder {
    /// Builder for `config` with real sleeps, log tracing and the configured
    /// contention policy
    pub fn new(config: TableConfig) -> Self {
        Self {
            config,
            pause: Arc::new(ThreadPause),
            trace: None,
            contention: None,
        }
    }

    /// Suspend philosophers through `pause`
    pub fn pause(mut self, pause: Arc<dyn Pause>) -> Self {
        self.pause = pause;
        self
    }

    /// Send trace events to `sink` instead of the log; only used when
    /// tracing is enabled in the configuration
    pub fn trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace = Some(sink);
        self
    }

    /// Replace the configured contention policy with `handler`
    pub fn contention_handler(mut self, handler: Arc<dyn ContentionHandler>) -> Self {
        self.contention = Some(handler);
        self
    }

    /// Build the ring and start every philosopher
    pub fn start(self) -> Result<Table> {
        let config = self.config;
        config.validate()?;
        let n = config.philosophers;

        let utensils: Vec<Arc<Utensil>> = (0..n).map(|id| Arc::new(Utensil::new(id))).collect();
        let stops: Vec<Arc<StopFlag>> = (0..n).map(|_| Arc::new(StopFlag::new())).collect();

        let mut halt = None;
        let contention: Arc<dyn ContentionHandler> = match (self.contention, config.on_contention) {
            (Some(handler), _) => handler,
            (None, ContentionPolicy::Exit) => Arc::new(ExitProcess),
            (None, ContentionPolicy::Halt) => {
                let handler = Arc::new(HaltTable::new(stops.clone()));
                halt = Some(Arc::clone(&handler));
                handler
            }
        };

        let trace: Option<Arc<dyn TraceSink>> = if config.trace {
            Some(
                self.trace
                    .unwrap_or_else(|| Arc::new(LogSink) as Arc<dyn TraceSink>),
            )
        } else {
            None
        };

        let timing = PhilosopherTiming::from(&config);
        let mut seats: Vec<Seat> = Vec::with_capacity(n);

        for (id, stop) in stops.iter().enumerate() {
            let (left, right) = ring_neighbours(id, n);
            let meals = Arc::new(MealCounter::new());

            let mut philosopher = Philosopher::new(
                id,
                Arc::clone(&utensils[left]),
                Arc::clone(&utensils[right]),
                config.seed,
                timing,
            )
            .with_stop_flag(Arc::clone(stop))
            .with_meal_counter(Arc::clone(&meals))
            .with_pause(Arc::clone(&self.pause))
            .with_contention_handler(Arc::clone(&contention));
            if let Some(sink) = &trace {
                philosopher = philosopher.with_trace_sink(Arc::clone(sink));
            }

            let spawned = thread::Builder::new()
                .name(format!("philosopher-{}", id))
                .spawn(move || philosopher.run());

            match spawned {
                Ok(handle) => seats.push(Seat {
                    id,
                    stop: Arc::clone(stop),
                    meals,
                    handle,
                }),
                Err(source) => {
                    error!("Failed to seat philosopher {}: {}", id, source);
                    for seat in &seats {
                        seat.stop.raise();
                    }
                    for seat in seats {
                        let _ = seat.handle.join();
                    }
                    return Err(TableError::Spawn { id, source });
                }
            }
        }

        info!(
            "Seated {} philosophers (seed {}, timeouts {}ms/{}ms)",
            n, config.seed, config.left_timeout_ms, config.right_timeout_ms
        );

        Ok(Table {
            config,
            utensils,
            seats,
            halt,
            started_at: Instant::now(),
        })
    }
}

/// A running table
pub struct Table {
    config: TableConfig,
    utensils: Vec<Arc<Utensil>>,
    seats: Vec<Seat>,
    halt: Option<Arc<HaltTable>>,
    started_at: Instant,
}

impl Table {
    /// Seat philosophers according to `config`
    pub fn start(config: TableConfig) -> Result<Self> {
        TableBuilder::new(config).start()
    }

    /// Configuration the table was built from
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// The ring of utensils, indexed by id
    pub fn utensils(&self) -> &[Arc<Utensil>] {
        &self.utensils
    }

    /// Meals eaten so far by each philosopher
    pub fn meals_eaten(&self) -> Vec<u64> {
        self.seats.iter().map(|seat| seat.meals.get()).collect()
    }

    /// Whether the contention check halted the table
    pub fn is_halted(&self) -> bool {
        self.halt.as_ref().is_some_and(|h| h.is_tripped())
    }

    /// The report that halted the table, if any
    pub fn contention(&self) -> Option<ContentionReport> {
        self.halt.as_ref().and_then(|h| h.report())
    }

    /// Ask every philosopher to leave at the end of its current cycle
    pub fn stop(&self) {
        let raised = self.seats.iter().filter(|seat| seat.stop.raise()).count();
        if raised > 0 {
            info!("Asked {} philosophers to leave the table", raised);
        }
    }

    /// Stop everyone, wait for every philosopher thread to finish and
    /// gather their statistics.
    pub fn collect_statistics(mut self) -> Result<TableReport> {
        self.stop();

        let mut philosophers = Vec::with_capacity(self.seats.len());
        let mut panicked = None;

        for seat in mem::take(&mut self.seats) {
            match seat.handle.join() {
                Ok(stats) => philosophers.push(stats.into()),
                Err(_) => {
                    error!("Philosopher {} panicked", seat.id);
                    panicked.get_or_insert(seat.id);
                }
            }
        }

        if let Some(id) = panicked {
            return Err(TableError::PhilosopherPanicked(id));
        }

        let report = TableReport {
            seed: self.config.seed,
            elapsed_ms: self.started_at.elapsed().as_secs_f64() * 1000.0,
            philosophers,
            utensils: self.utensils.iter().map(|u| u.stats()).collect(),
            contention: self.contention(),
        };
        info!(
            "Table dismissed after {:.0}ms, {} meals served",
            report.elapsed_ms,
            report.total_meals()
        );
        Ok(report)
    }

    /// Let the table run until `limit` is reached (or the contention check
    /// halts it), then collect statistics.
    pub fn run(self, limit: RunLimit) -> Result<TableReport> {
        info!("Running until {}", limit);

        match limit {
            RunLimit::Duration(duration) => {
                let deadline = self.started_at + duration;
                loop {
                    let now = Instant::now();
                    if now >= deadline || self.is_halted() {
                        break;
                    }
                    thread::sleep(POLL_INTERVAL.min(deadline - now));
                }
            }
            RunLimit::Meals(meals) => {
                while !self.is_halted() && self.meals_eaten().iter().any(|&m| m < meals) {
                    thread::sleep(POLL_INTERVAL);
                }
            }
        }

        self.collect_statistics()
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        // Threads left unjoined still leave at their next cycle boundary
        for seat in &self.seats {
            seat.stop.raise();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhaseRange;
    use crate::philosopher::{RecordingSink, TraceKind};

    fn quick_config(philosophers: usize) -> TableConfig {
        TableConfig {
            philosophers,
            think_ms: PhaseRange::new(5, 10),
            eat_ms: PhaseRange::new(1, 5),
            on_contention: ContentionPolicy::Halt,
            ..Default::default()
        }
    }

    #[test]
    fn test_ring_wiring() {
        assert_eq!(ring_neighbours(0, 5), (0, 1));
        assert_eq!(ring_neighbours(3, 5), (3, 4));
        assert_eq!(ring_neighbours(4, 5), (4, 0));
        assert_eq!(ring_neighbours(1, 2), (1, 0));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = Table::start(TableConfig {
            philosophers: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(TableError::Config(_))));
    }

    #[test]
    fn test_neighbours_share_utensils() {
        let sink = Arc::new(RecordingSink::new());
        let config = TableConfig {
            trace: true,
            ..quick_config(3)
        };
        let table = TableBuilder::new(config)
            .trace_sink(sink.clone())
            .start()
            .unwrap();
        assert_eq!(table.utensils().len(), 3);

        let report = table.run(RunLimit::Meals(2)).unwrap();
        assert!(report.contention.is_none());

        for id in 0..3 {
            let (left, right) = ring_neighbours(id, 3);
            for event in sink.events_for(id) {
                match event.kind {
                    TraceKind::PickedUpLeft | TraceKind::PutDownLeft => {
                        assert_eq!(event.utensil, Some(left))
                    }
                    TraceKind::PickedUpRight | TraceKind::PutDownRight => {
                        assert_eq!(event.utensil, Some(right))
                    }
                    _ => assert_eq!(event.utensil, None),
                }
            }
        }
    }

    #[test]
    fn test_duration_limit_stops_table() {
        let table = Table::start(quick_config(4)).unwrap();
        assert_eq!(table.config(), &quick_config(4));
        let start = Instant::now();

        let report = table.run(RunLimit::Duration(Duration::from_millis(100))).unwrap();

        assert!(start.elapsed() >= Duration::from_millis(90));
        assert_eq!(report.philosophers.len(), 4);
        assert_eq!(report.utensils.len(), 4);
        assert_eq!(report.seed, 100);
        for (id, philosopher) in report.philosophers.iter().enumerate() {
            assert_eq!(philosopher.id, id);
            assert!(philosopher.thinking.turns >= 1);
        }
    }

    #[test]
    fn test_statistics_need_no_explicit_stop() {
        let table = Table::start(quick_config(2)).unwrap();
        thread::sleep(Duration::from_millis(30));

        let report = table.collect_statistics().unwrap();
        let served: u64 = report.utensils.iter().map(|u| u.acquisitions).sum();
        // Every meal takes two utensils; failed right attempts add lone lefts
        assert!(served >= 2 * report.total_meals());
    }
}
