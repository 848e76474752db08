//! Named phase deadline guards
//!
//! Every phase of a candidate's slot is bounded by a timer that must be
//! disarmed the instant the phase's real outcome is known, so a late
//! firing can never advance the run a second time.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How a phase timer ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// The deadline elapsed
    Fired,
    /// The phase resolved first and disarmed the timer
    Disarmed,
}

/// A named, independently cancellable deadline guard
#[derive(Debug)]
pub struct PhaseTimer {
    label: &'static str,
    duration: Duration,
    disarm: CancellationToken,
}

impl PhaseTimer {
    pub fn new(label: &'static str, duration: Duration) -> Self {
        Self {
            label,
            duration,
            disarm: CancellationToken::new(),
        }
    }

    /// Resolves when the deadline fires or the timer is disarmed,
    /// whichever comes first.
    pub async fn fire(&self) -> TimerOutcome {
        tokio::select! {
            _ = tokio::time::sleep(self.duration) => {
                debug!(timer = self.label, duration_ms = self.duration.as_millis() as u64, "phase timer fired");
                TimerOutcome::Fired
            }
            _ = self.disarm.cancelled() => TimerOutcome::Disarmed,
        }
    }

    /// Disarm the timer; any pending or future `fire` resolves as
    /// `Disarmed`.
    pub fn disarm(&self) {
        self.disarm.cancel();
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}
