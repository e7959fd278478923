//! Atomic flags and counters shared between the table and its philosophers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// A termination flag that only ever goes from unset to set.
#[derive(Debug, Default)]
pub struct StopFlag {
    flag: AtomicBool,
}

impl StopFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag.
    ///
    /// Returns true if the flag was raised by this call, false if it was
    /// already raised.
    pub fn raise(&self) -> bool {
        !self.flag.swap(true, Ordering::SeqCst)
    }

    /// Whether the flag has been raised.
    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A monotonically increasing counter readable from other threads.
///
/// Philosophers publish their meal count through it so a run policy can
/// watch progress without touching the philosopher's own statistics.
#[derive(Debug, Default)]
pub struct MealCounter {
    value: AtomicU64,
}

impl MealCounter {
    /// Create a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one and return the new value.
    pub fn increment(&self) -> u64 {
        self.value.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_stop_flag_raises_once() {
        let flag = StopFlag::new();
        assert!(!flag.is_raised());

        assert!(flag.raise());
        assert!(flag.is_raised());

        // A second raise is a no-op
        assert!(!flag.raise());
        assert!(flag.is_raised());
    }

    #[test]
    fn test_stop_flag_single_winner() {
        let flag = Arc::new(StopFlag::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let flag = Arc::clone(&flag);
                thread::spawn(move || flag.raise())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_meal_counter_concurrent_increments() {
        let counter = Arc::new(MealCounter::new());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..250 {
                        counter.increment();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.get(), 1000);
    }
}
