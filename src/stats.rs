use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-lifetime scan counters shared by every in-flight validation.
#[derive(Debug, Default)]
pub struct ScanStatistics {
    scanned: AtomicU64,
    valid: AtomicU64,
    invalid: AtomicU64,
    iterations: AtomicU64,
    batches_processed: AtomicU64,
    save_failures: AtomicU64,
}

impl ScanStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_scanned(&self) {
        self.scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_valid(&self) {
        self.valid.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid(&self) {
        self.invalid.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_iteration(&self) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch(&self) {
        self.batches_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save_failure(&self) {
        self.save_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            scanned: self.scanned.load(Ordering::Relaxed),
            valid: self.valid.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            iterations: self.iterations.load(Ordering::Relaxed),
            batches_processed: self.batches_processed.load(Ordering::Relaxed),
            save_failures: self.save_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatisticsSnapshot {
    pub scanned: u64,
    pub valid: u64,
    pub invalid: u64,
    pub iterations: u64,
    pub batches_processed: u64,
    pub save_failures: u64,
}

impl StatisticsSnapshot {
    /// Holds whenever no validation is in flight.
    pub fn is_balanced(&self) -> bool {
        self.scanned == self.valid + self.invalid
    }
}

impl fmt::Display for StatisticsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scanned: {} | Valid: {} | Invalid: {} | Unique Hosts: {}",
            self.scanned, self.valid, self.invalid, self.iterations
        )
    }
}
