//! Shared aggregate state of a write run.
//!
//! [`Counters`] is shared by reference between all workers of a run. Workers only ever add to it
//! through atomic increments, while the orchestrator resets it before a run, and marks it
//! finished and takes a [`TestResult`] snapshot once all workers have exited.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Concurrency-safe counters for objects and bytes written during a run.
#[derive(Debug, Default)]
pub struct Counters {
    objects_written: AtomicU64,
    bytes_written: AtomicU64,
    write_failures: AtomicU64,
    finished: AtomicBool,
}

impl Counters {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zeroes all counters and clears the finished flag for a new run.
    pub fn reset(&self) {
        self.objects_written.store(0, Ordering::SeqCst);
        self.bytes_written.store(0, Ordering::SeqCst);
        self.write_failures.store(0, Ordering::SeqCst);
        self.finished.store(false, Ordering::SeqCst);
    }

    /// Records one successfully written object of `bytes` length.
    pub fn record_write(&self, bytes: u64) {
        self.objects_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Records one failed write.
    pub fn record_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Marks the run as finished.
    ///
    /// Returns `false` if the run had already been marked finished.
    pub fn mark_finished(&self) -> bool {
        let was_finished = self.finished.swap(true, Ordering::SeqCst);
        if was_finished {
            tracing::error!("write run marked finished more than once");
        }
        !was_finished
    }

    /// Returns `true` once [`mark_finished`](Self::mark_finished) has been called for this run.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Reads the current values.
    ///
    /// The snapshot only describes a complete run once [`is_finished`](Self::is_finished)
    /// returns `true`.
    pub fn snapshot(&self) -> TestResult {
        TestResult {
            objects_written: self.objects_written.load(Ordering::SeqCst),
            bytes_written: self.bytes_written.load(Ordering::SeqCst),
            write_failures: self.write_failures.load(Ordering::SeqCst),
        }
    }
}

/// The aggregate outcome of a write run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TestResult {
    /// Number of objects the storage confirmed.
    pub objects_written: u64,
    /// Total payload bytes of all confirmed objects.
    pub bytes_written: u64,
    /// Number of writes that failed and were not counted.
    pub write_failures: u64,
}
