//! Candidate-local error taxonomy
//!
//! Every variant here is local to one candidate: the orchestrator converts
//! it into a recorded failure outcome, logs it, and moves on to the next
//! candidate. Nothing in this module aborts the run.

use thiserror::Error;

use crate::process::ExitNotice;

/// Errors that end one candidate's benchmark slot
#[derive(Debug, Error)]
pub enum CandidateError {
    /// The candidate process could not be created
    #[error("failed to launch '{name}': {reason}")]
    Launch { name: String, reason: String },

    /// Neither the HTTP nor the socket check succeeded within budget
    #[error("'{name}' never became reachable: {reason}")]
    ProbeUnreachable { name: String, reason: String },

    /// The probe phase deadline fired before a verdict was produced
    #[error("probe phase timed out for '{name}' after {limit_ms}ms")]
    ProbeTimeout { name: String, limit_ms: u64 },

    /// The load generator reported a failure
    #[error("load test failed for '{name}': {reason}")]
    Benchmark { name: String, reason: String },

    /// The benchmark ceiling elapsed before the generator returned
    #[error("load test timed out for '{name}' after {limit_secs}s")]
    BenchmarkTimeout { name: String, limit_secs: u64 },

    /// The candidate process died during Starting or Probing
    #[error("'{name}' exited unexpectedly ({exit})")]
    UnexpectedExit { name: String, exit: String },

    /// Operator-requested cancellation while this candidate was in flight
    #[error("run interrupted while '{name}' was active")]
    Interrupted { name: String },
}

impl CandidateError {
    pub fn launch(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Launch {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn unexpected_exit(name: impl Into<String>, notice: &ExitNotice) -> Self {
        Self::UnexpectedExit {
            name: name.into(),
            exit: notice.describe(),
        }
    }
}
