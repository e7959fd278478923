//! Trace events emitted by philosophers while they cycle.

use std::fmt;

use log::debug;
use parking_lot::Mutex;
use serde::Serialize;

/// Log target used by [`LogSink`]
pub const TRACE_TARGET: &str = "dining::trace";

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraceKind {
    /// Started thinking
    Thinking,
    /// Became hungry
    Hungry,
    /// Started eating
    Eating,
    /// Took the left utensil
    PickedUpLeft,
    /// Took the right utensil
    PickedUpRight,
    /// Put the right utensil back
    PutDownRight,
    /// Put the left utensil back
    PutDownLeft,
}

impl TraceKind {
    /// Kebab-case name of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thinking => "thinking",
            Self::Hungry => "hungry",
            Self::Eating => "eating",
            Self::PickedUpLeft => "picked-up-left",
            Self::PickedUpRight => "picked-up-right",
            Self::PutDownRight => "put-down-right",
            Self::PutDownLeft => "put-down-left",
        }
    }

    /// Whether the event moves a utensil
    pub fn is_pick_up(&self) -> bool {
        matches!(self, Self::PickedUpLeft | Self::PickedUpRight)
    }

    /// Whether the event puts a utensil back
    pub fn is_put_down(&self) -> bool {
        matches!(self, Self::PutDownLeft | Self::PutDownRight)
    }
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single trace record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TraceEvent {
    /// Philosopher the event belongs to
    pub philosopher: usize,

    /// Event kind
    pub kind: TraceKind,

    /// Utensil involved, for pick-up and put-down events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utensil: Option<usize>,
}

impl TraceEvent {
    /// A phase transition
    pub fn phase(philosopher: usize, kind: TraceKind) -> Self {
        Self {
            philosopher,
            kind,
            utensil: None,
        }
    }

    /// A utensil movement
    pub fn utensil(philosopher: usize, kind: TraceKind, utensil: usize) -> Self {
        Self {
            philosopher,
            kind,
            utensil: Some(utensil),
        }
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.utensil {
            Some(utensil) => write!(
                f,
                "Philosopher {} {} (utensil {})",
                self.philosopher, self.kind, utensil
            ),
            None => write!(f, "Philosopher {} is {}", self.philosopher, self.kind),
        }
    }
}

/// Destination for trace events.
///
/// Sinks are called from philosopher threads, sometimes while a utensil is
/// held, so `record` must not block for long.
pub trait TraceSink: Send + Sync {
    /// Accept one event
    fn record(&self, event: TraceEvent);
}

/// Forwards events to the `log` facade at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn record(&self, event: TraceEvent) {
        debug!(target: TRACE_TARGET, "{}", event);
    }
}

/// Keeps every event in arrival order
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TraceEvent>>,
}

impl RecordingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events recorded so far
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    /// Events of a single philosopher
    pub fn events_for(&self, philosopher: usize) -> Vec<TraceEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.philosopher == philosopher)
            .copied()
            .collect()
    }
}

impl TraceSink for RecordingSink {
    fn record(&self, event: TraceEvent) {
        self.events.lock().push(event);
    }
}
