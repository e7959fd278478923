//! Philosophers and their think / hungry / eat cycle.
//!
//! Each philosopher runs on its own thread and repeats:
//!
//! 1. think for a random duration
//! 2. become hungry and start the hunger clock
//! 3. check the left utensil for queued callers (see [`contention`])
//! 4. take the left utensil within a bounded wait
//! 5. take the right utensil within a bounded wait, giving the left one
//!    back on failure
//! 6. eat for a random duration
//! 7. put down right, then left
//!
//! Every wait is bounded, so the ring can never settle into the classic
//! everyone-holds-left deadlock. A philosopher may starve instead; the hunger
//! statistics make that visible.

pub mod contention;
pub mod pause;
pub mod stats;
pub mod trace;

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{PhaseRange, TableConfig};
use crate::sync::{MealCounter, StopFlag, Utensil};

pub use contention::{
    ContentionHandler, ContentionReport, ExitProcess, HaltTable, CONTENTION_EXIT_CODE,
};
pub use pause::{Pause, PauseError, ThreadPause};
pub use stats::{average, PhaseStats, PhilosopherStats};
pub use trace::{LogSink, RecordingSink, TraceEvent, TraceKind, TraceSink};

/// Where a philosopher is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhilosopherState {
    /// Thinking; also the state between cycles
    Thinking,
    /// Hungry, not yet reaching for utensils
    Hungry,
    /// Waiting for the left utensil
    AcquiringLeft,
    /// Holding left, waiting for the right utensil
    AcquiringRight,
    /// Holding both utensils
    Eating,
    /// Putting utensils back
    Releasing,
}

/// How a single cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Both utensils taken, meal eaten, utensils returned
    Ate,
    /// The left utensil stayed busy past its timeout
    LeftTimedOut,
    /// The right utensil stayed busy past its timeout; left was given back
    RightTimedOut,
    /// Someone was queued on the left utensil; the contention handler ran
    Contended(ContentionReport),
    /// A think or eat pause was cut short
    Interrupted(PhilosopherState),
}

/// Waits and phase lengths a philosopher works with.
///
/// Phase ranges are not validated here; a reversed range is drawn from
/// as if its bounds were swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhilosopherTiming {
    /// Bounded wait for the left utensil
    pub left_timeout: Duration,

    /// Bounded wait for the right utensil
    pub right_timeout: Duration,

    /// Thinking durations
    pub think: PhaseRange,

    /// Eating durations
    pub eat: PhaseRange,
}

impl From<&TableConfig> for PhilosopherTiming {
    fn from(config: &TableConfig) -> Self {
        Self {
            left_timeout: config.left_timeout(),
            right_timeout: config.right_timeout(),
            think: config.think_ms,
            eat: config.eat_ms,
        }
    }
}

impl Default for PhilosopherTiming {
    fn default() -> Self {
        Self::from(&TableConfig::default())
    }
}

/// One diner at the table
pub struct Philosopher {
    id: usize,
    left: Arc<Utensil>,
    right: Arc<Utensil>,
    rng: StdRng,
    timing: PhilosopherTiming,
    state: PhilosopherState,
    stats: PhilosopherStats,
    stop: Arc<StopFlag>,
    meals: Arc<MealCounter>,
    pause: Arc<dyn Pause>,
    trace: Option<Arc<dyn TraceSink>>,
    contention: Arc<dyn ContentionHandler>,
}

impl Philosopher {
    /// Create philosopher `id` between two utensils.
    ///
    /// The random generator is seeded with `base_seed + id`, so the same
    /// seed and id always draw the same think and eat durations.
    pub fn new(
        id: usize,
        left: Arc<Utensil>,
        right: Arc<Utensil>,
        base_seed: u64,
        timing: PhilosopherTiming,
    ) -> Self {
        Self {
            id,
            left,
            right,
            rng: StdRng::seed_from_u64(base_seed.wrapping_add(id as u64)),
            timing,
            state: PhilosopherState::Thinking,
            stats: PhilosopherStats::new(id),
            stop: Arc::new(StopFlag::new()),
            meals: Arc::new(MealCounter::new()),
            pause: Arc::new(ThreadPause),
            trace: None,
            contention: Arc::new(ExitProcess),
        }
    }

    /// Use `stop` as the termination flag
    pub fn with_stop_flag(mut self, stop: Arc<StopFlag>) -> Self {
        self.stop = stop;
        self
    }

    /// Publish meals eaten through `meals`
    pub fn with_meal_counter(mut self, meals: Arc<MealCounter>) -> Self {
        self.meals = meals;
        self
    }

    /// Suspend think and eat phases through `pause`
    pub fn with_pause(mut self, pause: Arc<dyn Pause>) -> Self {
        self.pause = pause;
        self
    }

    /// Emit trace events to `sink`
    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace = Some(sink);
        self
    }

    /// React to detected contention through `handler`
    pub fn with_contention_handler(mut self, handler: Arc<dyn ContentionHandler>) -> Self {
        self.contention = handler;
        self
    }

    /// Philosopher id
    pub fn id(&self) -> usize {
        self.id
    }

    /// Current state
    pub fn state(&self) -> PhilosopherState {
        self.state
    }

    /// Statistics accumulated so far
    pub fn stats(&self) -> &PhilosopherStats {
        &self.stats
    }

    /// Handle to the termination flag
    pub fn stop_flag(&self) -> Arc<StopFlag> {
        Arc::clone(&self.stop)
    }

    /// Handle to the published meal count
    pub fn meal_counter(&self) -> Arc<MealCounter> {
        Arc::clone(&self.meals)
    }

    /// Cycle until the termination flag is raised, then hand back the
    /// statistics.
    pub fn run(mut self) -> PhilosopherStats {
        info!(
            "Philosopher {} sits between utensils {} and {}",
            self.id,
            self.left.id(),
            self.right.id()
        );

        while !self.stop.is_raised() {
            match self.step() {
                CycleOutcome::Ate | CycleOutcome::LeftTimedOut | CycleOutcome::RightTimedOut => {}
                CycleOutcome::Contended(report) => {
                    debug!("Philosopher {}: cycle abandoned after {:?}", self.id, report);
                }
                CycleOutcome::Interrupted(state) => {
                    debug!("Philosopher {}: re-entering loop after interrupted {:?}", self.id, state);
                }
            }
        }

        info!(
            "Philosopher {} leaves after {} meals",
            self.id, self.stats.eating.turns
        );
        self.stats
    }

    /// Run one full cycle, from thinking back to thinking.
    ///
    /// Whatever the outcome, the philosopher holds no utensil when this
    /// returns.
    pub fn step(&mut self) -> CycleOutcome {
        let outcome = self.cycle();
        self.state = PhilosopherState::Thinking;
        outcome
    }

    fn cycle(&mut self) -> CycleOutcome {
        // Thinking
        self.enter(PhilosopherState::Thinking, TraceKind::Thinking);
        let think = self.draw(self.timing.think);
        self.stats.thinking.record(as_millis_f64(think));
        if let Err(e) = self.pause.pause(think) {
            warn!("Philosopher {}: {}", self.id, e);
            return CycleOutcome::Interrupted(PhilosopherState::Thinking);
        }

        // Hungry
        self.enter(PhilosopherState::Hungry, TraceKind::Hungry);
        self.stats.hungry.count_turn();
        let hungry_since = Instant::now();

        let waiting = self.left.waiting_count();
        if waiting > 0 {
            let report = ContentionReport {
                philosopher: self.id,
                utensil: self.left.id(),
                waiting,
            };
            self.contention.on_contention(report);
            return CycleOutcome::Contended(report);
        }

        // Guards borrow these clones, leaving `self` free for bookkeeping
        let left = Arc::clone(&self.left);
        let right = Arc::clone(&self.right);

        self.state = PhilosopherState::AcquiringLeft;
        let Some(left_guard) = left.try_acquire(self.timing.left_timeout) else {
            debug!("Philosopher {}: left utensil {} busy", self.id, left.id());
            return CycleOutcome::LeftTimedOut;
        };
        self.emit(TraceEvent::utensil(self.id, TraceKind::PickedUpLeft, left.id()));

        self.state = PhilosopherState::AcquiringRight;
        let Some(right_guard) = right.try_acquire(self.timing.right_timeout) else {
            debug!("Philosopher {}: right utensil {} busy", self.id, right.id());
            self.state = PhilosopherState::Releasing;
            self.emit(TraceEvent::utensil(self.id, TraceKind::PutDownLeft, left.id()));
            left_guard.release();
            return CycleOutcome::RightTimedOut;
        };
        self.emit(TraceEvent::utensil(self.id, TraceKind::PickedUpRight, right.id()));
        self.stats.hungry.add_time(as_millis_f64(hungry_since.elapsed()));

        // Eating
        self.enter(PhilosopherState::Eating, TraceKind::Eating);
        let eat = self.draw(self.timing.eat);
        self.stats.eating.record(as_millis_f64(eat));
        self.meals.increment();
        let paused = self.pause.pause(eat);

        // Releasing
        self.state = PhilosopherState::Releasing;
        self.emit(TraceEvent::utensil(self.id, TraceKind::PutDownRight, right.id()));
        right_guard.release();
        self.emit(TraceEvent::utensil(self.id, TraceKind::PutDownLeft, left.id()));
        left_guard.release();

        if let Err(e) = paused {
            warn!("Philosopher {}: {}", self.id, e);
            return CycleOutcome::Interrupted(PhilosopherState::Eating);
        }

        CycleOutcome::Ate
    }

    fn enter(&mut self, state: PhilosopherState, kind: TraceKind) {
        self.state = state;
        self.emit(TraceEvent::phase(self.id, kind));
    }

    fn emit(&self, event: TraceEvent) {
        if let Some(sink) = &self.trace {
            sink.record(event);
        }
    }

    fn draw(&mut self, range: PhaseRange) -> Duration {
        let low = range.min_ms.min(range.max_ms);
        let high = range.min_ms.max(range.max_ms);
        Duration::from_millis(self.rng.gen_range(low..=high))
    }
}

fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
