//! Single-assignment resolution guard
//!
//! Several paths can race to end one candidate's slot: the probe verdict,
//! a phase timer, an exit notice, the benchmark result, or an interrupt.
//! Whichever claims the cell first wins; every later claim is a no-op.

use std::sync::atomic::{AtomicBool, Ordering};

/// Check-and-set guard making candidate resolution exactly-once
#[derive(Debug, Default)]
pub struct ResolutionCell {
    resolved: AtomicBool,
}

impl ResolutionCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the resolution. Returns true for exactly one caller across
    /// all racing paths.
    pub fn try_resolve(&self) -> bool {
        self.resolved
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_first_claim_wins() {
        let cell = ResolutionCell::new();
        assert!(!cell.is_resolved());
        assert!(cell.try_resolve());
        assert!(cell.is_resolved());
        assert!(!cell.try_resolve());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_claims_resolve_exactly_once() {
        let cell = Arc::new(ResolutionCell::new());
        let winners = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..64 {
            let cell = cell.clone();
            let winners = winners.clone();
            handles.push(tokio::spawn(async move {
                if cell.try_resolve() {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert!(cell.is_resolved());
    }
}
