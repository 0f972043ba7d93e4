use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared (completed, total) counters for live progress reporting.
///
/// The total becomes known only after precheck and classification; until
/// then it reads as zero.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    completed: Arc<AtomicU64>,
    total: Arc<AtomicU64>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }

    pub fn incr_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> (u64, u64) {
        (
            self.completed.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_counters() {
        let progress = Progress::new();
        assert_eq!(progress.snapshot(), (0, 0));

        progress.set_total(3);
        progress.incr_completed();
        progress.incr_completed();

        let view = progress.clone();
        assert_eq!(view.snapshot(), (2, 3));
    }
}
