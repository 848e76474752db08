//! Candidate lifecycle phases
//!
//! A candidate moves strictly through Starting → Probing → Benchmarking →
//! TornDown, with Failed absorbing from any of the first three.

/// Lifecycle phase of the candidate currently occupying the run slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum CandidatePhase {
    /// No process has been spawned yet
    #[default]
    Idle,
    /// Process spawned, holding for the start delay
    Starting,
    /// Readiness probe in flight
    Probing,
    /// Load test in flight
    Benchmarking,
    /// Process terminated, outcome recorded
    TornDown,
    /// Candidate failed before completing its load test
    Failed,
}

impl CandidatePhase {
    /// Check if the phase represents a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::TornDown | Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_phases() {
        assert!(CandidatePhase::TornDown.is_terminal());
        assert!(CandidatePhase::Failed.is_terminal());
        assert!(!CandidatePhase::Idle.is_terminal());
        assert!(!CandidatePhase::Starting.is_terminal());
        assert!(!CandidatePhase::Probing.is_terminal());
        assert!(!CandidatePhase::Benchmarking.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(CandidatePhase::Starting.to_string(), "starting");
        assert_eq!(CandidatePhase::TornDown.to_string(), "torn-down");
    }
}
