use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts completed containers and trips once a threshold is reached.
///
/// The counter is read, checked and reset in one atomic step so exactly one
/// caller observes each trip.
#[derive(Debug)]
pub struct SafetyValve {
    completed: AtomicUsize,
    max: usize,
}

impl SafetyValve {
    pub fn new(max: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            max: max.max(1),
        }
    }

    /// Records one completion. Returns true when this completion reached the
    /// threshold, in which case the counter is already back at zero.
    pub fn record(&self) -> bool {
        let mut current = self.completed.load(Ordering::Acquire);
        loop {
            let next = current + 1;
            let (stored, tripped) = if next >= self.max {
                (0, true)
            } else {
                (next, false)
            };
            match self.completed.compare_exchange_weak(
                current,
                stored,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return tripped,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn count(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    pub fn max(&self) -> usize {
        self.max
    }
}
