//! Bounded condition waiting with exponential backoff
//!
//! A condensed poll-until-ready loop: checks a condition with
//! exponentially growing delays until it holds or the deadline passes.
//! Used for the post-SIGTERM grace wait, where the only signal is the
//! exit watcher flipping a flag.

use backon::{BackoffBuilder, ExponentialBuilder};
use std::time::{Duration, Instant};

/// Wait until `check` returns true, polling with exponential backoff.
///
/// Returns true if the condition held before `deadline` elapsed.
pub async fn wait_until<F>(deadline: Duration, check: F) -> bool
where
    F: Fn() -> bool,
{
    let start = Instant::now();

    let backoff = ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(10))
        .with_max_delay(Duration::from_millis(250))
        .with_factor(2.0)
        .build();
    let mut delays = backoff.into_iter();

    loop {
        if check() {
            return true;
        }

        let elapsed = start.elapsed();
        if elapsed >= deadline {
            return false;
        }

        // Never sleep past the deadline
        let delay = delays.next().unwrap_or(Duration::from_millis(250));
        let remaining = deadline - elapsed;
        tokio::time::sleep(delay.min(remaining)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_immediate_condition() {
        assert!(wait_until(Duration::from_millis(100), || true).await);
    }

    #[tokio::test]
    async fn test_deadline_elapses() {
        let start = Instant::now();
        assert!(!wait_until(Duration::from_millis(100), || false).await);
        assert!(start.elapsed() >= Duration::from_millis(100));
        // The deadline cap keeps the overshoot bounded
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_condition_becomes_true() {
        let flag = Arc::new(AtomicBool::new(false));
        let setter = flag.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            setter.store(true, Ordering::SeqCst);
        });

        let checker = flag.clone();
        assert!(
            wait_until(Duration::from_secs(5), move || {
                checker.load(Ordering::SeqCst)
            })
            .await
        );
    }
}
