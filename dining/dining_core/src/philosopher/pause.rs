//! Suspension of a philosopher thread for its think and eat phases.

use std::thread;
use std::time::Duration;

use thiserror::Error;

/// Error when a pause ends early
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseError {
    /// The pause was cut short before the full duration elapsed
    #[error("pause of {0:?} was interrupted")]
    Interrupted(Duration),
}

/// Blocks the calling thread for a phase duration.
///
/// [`ThreadPause`] always sleeps the full duration; other implementations
/// may end a pause early with [`PauseError::Interrupted`], which the
/// philosopher treats as an interrupted phase.
pub trait Pause: Send + Sync {
    /// Suspend for `duration`
    fn pause(&self, duration: Duration) -> Result<(), PauseError>;
}

/// Real wall-clock sleep
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&self, duration: Duration) -> Result<(), PauseError> {
        thread::sleep(duration);
        Ok(())
    }
}
