//! Utensils: exclusive locks shared by two neighbouring philosophers.
//!
//! A utensil is a `parking_lot` mutex with an observable count of callers
//! currently blocked in a bounded acquisition attempt. That count is the
//! contention signal philosophers inspect before reaching for a utensil.

use log::trace;
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Snapshot of a utensil's usage counters
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct UtensilStats {
    /// Position of the utensil in the ring
    pub id: usize,

    /// Number of successful acquisitions
    pub acquisitions: u64,

    /// Number of bounded attempts that timed out
    pub timeouts: u64,
}

/// An exclusive lock resource with identity and a waiting count.
#[derive(Debug)]
pub struct Utensil {
    /// Position in the ring
    id: usize,

    /// The underlying lock; it protects no data, only ownership
    lock: Mutex<()>,

    /// Callers currently blocked inside `try_acquire`
    waiting: AtomicUsize,

    /// Successful acquisitions
    acquisitions: AtomicU64,

    /// Attempts that gave up after their timeout
    timeouts: AtomicU64,
}

/// Proof of holding a utensil.
///
/// The utensil is released exactly once: either through [`UtensilGuard::release`]
/// or when the guard is dropped.
#[derive(Debug)]
#[must_use = "dropping the guard releases the utensil immediately"]
pub struct UtensilGuard<'a> {
    utensil: &'a Utensil,
    _guard: MutexGuard<'a, ()>,
    acquired_at: Instant,
}

/// Keeps `waiting` raised for as long as a caller is blocked.
struct WaitTicket<'a>(&'a AtomicUsize);

impl<'a> WaitTicket<'a> {
    fn take(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for WaitTicket<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Utensil {
    /// Create a free utensil at ring position `id`
    pub fn new(id: usize) -> Self {
        Self {
            id,
            lock: Mutex::new(()),
            waiting: AtomicUsize::new(0),
            acquisitions: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
        }
    }

    /// Ring position of this utensil
    pub fn id(&self) -> usize {
        self.id
    }

    /// Try to take the utensil, blocking for at most `timeout`.
    ///
    /// Returns `None` when the timeout elapsed. An uncontended attempt takes
    /// the lock without ever being counted as waiting; only callers that
    /// actually block show up in [`Utensil::waiting_count`].
    pub fn try_acquire(&self, timeout: Duration) -> Option<UtensilGuard<'_>> {
        let start = Instant::now();

        let guard = match self.lock.try_lock() {
            Some(guard) => guard,
            None => {
                let _ticket = WaitTicket::take(&self.waiting);
                match self.lock.try_lock_for(timeout) {
                    Some(guard) => guard,
                    None => {
                        self.timeouts.fetch_add(1, Ordering::Relaxed);
                        trace!(
                            "Utensil {} timed out after {:.2}ms",
                            self.id,
                            start.elapsed().as_secs_f64() * 1000.0
                        );
                        return None;
                    }
                }
            }
        };

        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        trace!(
            "Utensil {} acquired (wait time: {:.2}ms)",
            self.id,
            start.elapsed().as_secs_f64() * 1000.0
        );

        Some(UtensilGuard {
            utensil: self,
            _guard: guard,
            acquired_at: Instant::now(),
        })
    }

    /// Number of callers currently blocked trying to take this utensil.
    ///
    /// This is a heuristic: a non-zero value does not prove a deadlock, it
    /// only shows someone is queued right now.
    pub fn waiting_count(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Whether some caller currently holds the utensil
    pub fn is_held(&self) -> bool {
        self.lock.is_locked()
    }

    /// Snapshot of the usage counters
    pub fn stats(&self) -> UtensilStats {
        UtensilStats {
            id: self.id,
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }
}

impl UtensilGuard<'_> {
    /// Id of the held utensil
    pub fn id(&self) -> usize {
        self.utensil.id
    }

    /// Put the utensil back
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for UtensilGuard<'_> {
    fn drop(&mut self) {
        trace!(
            "Utensil {} released (held for: {:.2}ms)",
            self.utensil.id,
            self.acquired_at.elapsed().as_secs_f64() * 1000.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_uncontended_acquire_and_release() {
        let utensil = Utensil::new(3);

        let guard = utensil.try_acquire(Duration::from_millis(1));
        assert!(guard.is_some());
        assert!(utensil.is_held());
        assert_eq!(utensil.waiting_count(), 0);

        guard.unwrap().release();
        assert!(!utensil.is_held());

        let stats = utensil.stats();
        assert_eq!(stats.id, 3);
        assert_eq!(stats.acquisitions, 1);
        assert_eq!(stats.timeouts, 0);
    }

    #[test]
    fn test_timeout_while_held() {
        let utensil = Arc::new(Utensil::new(0));
        let guard = utensil.try_acquire(Duration::from_millis(1)).unwrap();

        let contender = Arc::clone(&utensil);
        let handle = thread::spawn(move || contender.try_acquire(Duration::from_millis(10)).is_none());
        assert!(handle.join().unwrap());

        // The timed-out caller no longer counts as waiting
        assert_eq!(utensil.waiting_count(), 0);
        drop(guard);

        let stats = utensil.stats();
        assert_eq!(stats.acquisitions, 1);
        assert_eq!(stats.timeouts, 1);
    }

    #[test]
    fn test_waiting_count_tracks_blocked_callers() {
        let utensil = Arc::new(Utensil::new(1));
        let guard = utensil.try_acquire(Duration::from_millis(1)).unwrap();

        let contender = Arc::clone(&utensil);
        let handle = thread::spawn(move || {
            contender
                .try_acquire(Duration::from_secs(5))
                .map(|g| g.id())
        });

        let deadline = Instant::now() + Duration::from_secs(5);
        while utensil.waiting_count() == 0 {
            assert!(Instant::now() < deadline, "contender never blocked");
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(utensil.waiting_count(), 1);

        guard.release();
        assert_eq!(handle.join().unwrap(), Some(1));
        assert_eq!(utensil.waiting_count(), 0);
    }

    #[test]
    fn test_mutual_exclusion_under_contention() {
        let utensil = Arc::new(Utensil::new(0));
        let inside = Arc::new(AtomicBool::new(false));
        let threads = 8;
        let iterations = 200;

        let mut handles = vec![];
        for _ in 0..threads {
            let utensil = Arc::clone(&utensil);
            let inside = Arc::clone(&inside);
            handles.push(thread::spawn(move || {
                let mut taken = 0;
                for _ in 0..iterations {
                    if let Some(guard) = utensil.try_acquire(Duration::from_millis(50)) {
                        assert!(!inside.swap(true, Ordering::SeqCst), "utensil held twice");
                        thread::sleep(Duration::from_micros(10));
                        inside.store(false, Ordering::SeqCst);
                        guard.release();
                        taken += 1;
                    }
                }
                taken
            }));
        }

        let taken: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        let stats = utensil.stats();
        assert_eq!(stats.acquisitions, taken);
        assert_eq!(stats.acquisitions + stats.timeouts, (threads * iterations) as u64);
        assert_eq!(utensil.waiting_count(), 0);
    }
}
