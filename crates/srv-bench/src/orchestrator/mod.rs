//! Sequential benchmark orchestration
//!
//! Drives each registered candidate through Starting → Probing →
//! Benchmarking → TornDown, records exactly one outcome per processed
//! candidate, and guarantees teardown of the spawned process on every
//! path out: probe failure, load-test error, unexpected process exit, or
//! a global interrupt. Candidates run strictly one at a time; they share
//! fixed ports and the load generator's resources, so overlap would make
//! the numbers incomparable.

pub mod report;

use std::time::Duration;

use srv_bench_common::defaults::{
    DEFAULT_GRACE_MS, DEFAULT_HTTP_PROBE_TIMEOUT_MS, DEFAULT_PROBE_PHASE_TIMEOUT_MS,
    DEFAULT_SOCKET_PROBE_TIMEOUT_MS, DEFAULT_START_DELAY_MS,
};
use srv_bench_common::{BenchmarkOutcome, CandidateDescriptor, CandidatePhase, OutcomeLedger};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CandidateError;
use crate::loadgen::LoadGenerator;
use crate::probe::{self, ProbeVerdict};
use crate::process::ProcessHandle;
use crate::resolve::ResolutionCell;
use crate::runner::{BenchSettings, BenchmarkRunner};
use crate::timer::PhaseTimer;

/// Timing knobs for a run
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Delay between spawn and the first readiness probe
    pub start_delay: Duration,
    /// Timeout for the HTTP readiness check
    pub http_probe_timeout: Duration,
    /// Timeout for the raw socket fallback check
    pub socket_probe_timeout: Duration,
    /// Ceiling for the whole probe phase
    pub probe_phase_timeout: Duration,
    /// Grace period between SIGTERM and SIGKILL during teardown
    pub grace: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_millis(DEFAULT_START_DELAY_MS),
            http_probe_timeout: Duration::from_millis(DEFAULT_HTTP_PROBE_TIMEOUT_MS),
            socket_probe_timeout: Duration::from_millis(DEFAULT_SOCKET_PROBE_TIMEOUT_MS),
            probe_phase_timeout: Duration::from_millis(DEFAULT_PROBE_PHASE_TIMEOUT_MS),
            grace: Duration::from_millis(DEFAULT_GRACE_MS),
        }
    }
}

/// The sequential run driver
///
/// Owns the single "current candidate" slot and the outcome ledger. Only
/// the orchestrator spawns or terminates candidate processes, and only
/// after the previous candidate's slot has been cleared.
pub struct Orchestrator<G> {
    settings: RunSettings,
    runner: BenchmarkRunner<G>,
    cancel: CancellationToken,
    ledger: OutcomeLedger,
}

impl<G: LoadGenerator> Orchestrator<G> {
    pub fn new(
        generator: G,
        settings: RunSettings,
        bench: BenchSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            settings,
            runner: BenchmarkRunner::new(generator, bench),
            cancel,
            ledger: OutcomeLedger::new(),
        }
    }

    pub fn ledger(&self) -> &OutcomeLedger {
        &self.ledger
    }

    pub fn into_ledger(self) -> OutcomeLedger {
        self.ledger
    }

    /// Benchmark every candidate in registration order.
    ///
    /// Each candidate is fully resolved (outcome recorded, process torn
    /// down) before the next one starts. A global interrupt stops the
    /// run after the current candidate's teardown; untried candidates
    /// get no outcome and render as N/A in the report.
    pub async fn run(&mut self, candidates: &[CandidateDescriptor]) {
        for candidate in candidates {
            if self.cancel.is_cancelled() {
                info!("interrupt requested, skipping remaining candidates");
                break;
            }

            info!(
                candidate = %candidate.name,
                endpoint = %candidate.endpoint.addr(),
                "benchmarking candidate"
            );
            let outcome = self.run_candidate(candidate).await;

            match &outcome {
                BenchmarkOutcome::Success(metrics) => info!(
                    candidate = %candidate.name,
                    requests_per_sec = metrics.requests_per_sec,
                    "candidate complete"
                ),
                BenchmarkOutcome::Failed { cause } => warn!(
                    candidate = %candidate.name,
                    cause = %cause,
                    "candidate failed"
                ),
            }

            if !self.ledger.record(&candidate.name, outcome) {
                warn!(candidate = %candidate.name, "duplicate outcome suppressed");
            }
        }
    }

    /// Run one candidate to full resolution.
    ///
    /// Returns the single outcome for this candidate; the spawned process
    /// is torn down before this returns, on every path.
    async fn run_candidate(&self, candidate: &CandidateDescriptor) -> BenchmarkOutcome {
        // Idle → Starting. A launch failure needs no teardown: nothing
        // was started.
        let process = match ProcessHandle::spawn(candidate) {
            Ok(process) => process,
            Err(e) => {
                warn!(candidate = %candidate.name, error = %e, "launch failed");
                return BenchmarkOutcome::failed(e.to_string());
            }
        };

        let resolution = ResolutionCell::new();
        let outcome = self.drive_phases(candidate, &process, &resolution).await;

        // Torn Down: every path where the spawn succeeded ends here.
        process.terminate(self.settings.grace).await;
        info!(candidate = %candidate.name, phase = %CandidatePhase::TornDown, "slot cleared");

        outcome
    }

    /// Walk the candidate through Starting → Probing → Benchmarking.
    ///
    /// Every terminal path claims the resolution cell before constructing
    /// its outcome, so an event arriving in the same tick as a phase
    /// timer (or a straggling exit notice) can never resolve the
    /// candidate twice.
    async fn drive_phases(
        &self,
        candidate: &CandidateDescriptor,
        process: &ProcessHandle,
        resolution: &ResolutionCell,
    ) -> BenchmarkOutcome {
        let name = &candidate.name;

        // ── Starting ────────────────────────────────────────────────────
        // Hold for the start delay unless the process dies first or the
        // run is interrupted.
        info!(candidate = %name, phase = %CandidatePhase::Starting, pid = process.pid(), "waiting out start delay");
        let start_timer = PhaseTimer::new("start-delay", self.settings.start_delay);
        tokio::select! {
            _ = start_timer.fire() => {}
            notice = process.wait_exit() => {
                start_timer.disarm();
                if notice.is_startup_failure() {
                    return self.fail(resolution, CandidateError::unexpected_exit(name, &notice));
                }
                // A clean exit leaves nothing listening; let the probe
                // record the unreachable verdict.
            }
            _ = self.cancel.cancelled() => {
                start_timer.disarm();
                return self.fail(resolution, CandidateError::Interrupted { name: name.clone() });
            }
        }

        // ── Probing ─────────────────────────────────────────────────────
        info!(candidate = %name, phase = %CandidatePhase::Probing, "probing readiness");
        let probe_timer = PhaseTimer::new("probe", self.settings.probe_phase_timeout);
        let verdict = tokio::select! {
            verdict = probe::probe(
                &candidate.endpoint,
                self.settings.http_probe_timeout,
                self.settings.socket_probe_timeout,
            ) => {
                probe_timer.disarm();
                verdict
            }
            _ = probe_timer.fire() => {
                return self.fail(resolution, CandidateError::ProbeTimeout {
                    name: name.clone(),
                    limit_ms: self.settings.probe_phase_timeout.as_millis() as u64,
                });
            }
            notice = process.wait_exit(), if !process.has_exited() => {
                probe_timer.disarm();
                return self.fail(resolution, CandidateError::unexpected_exit(name, &notice));
            }
            _ = self.cancel.cancelled() => {
                probe_timer.disarm();
                return self.fail(resolution, CandidateError::Interrupted { name: name.clone() });
            }
        };

        match verdict {
            ProbeVerdict::Ready { status } => {
                info!(candidate = %name, status, "candidate ready");
            }
            ProbeVerdict::ReachableNotHttp { ref error } => {
                info!(
                    candidate = %name,
                    http_error = %error,
                    "socket reachable without HTTP, proceeding to benchmark"
                );
            }
            ProbeVerdict::Unreachable { error } => {
                return self.fail(
                    resolution,
                    CandidateError::ProbeUnreachable {
                        name: name.clone(),
                        reason: error,
                    },
                );
            }
        }

        // ── Benchmarking ────────────────────────────────────────────────
        // The runner carries the load-test ceiling itself and folds every
        // ending into an outcome; only the interrupt races it here.
        info!(candidate = %name, phase = %CandidatePhase::Benchmarking, "starting load test");
        tokio::select! {
            outcome = self.runner.run(&candidate.endpoint, name) => {
                resolution.try_resolve();
                outcome
            }
            _ = self.cancel.cancelled() => {
                self.fail(resolution, CandidateError::Interrupted { name: name.clone() })
            }
        }
    }

    /// Claim the resolution and convert the error into a failure outcome.
    ///
    /// A late claim (another path already resolved this candidate) is
    /// logged; the ledger's duplicate check keeps the first recorded
    /// outcome authoritative either way.
    fn fail(&self, resolution: &ResolutionCell, error: CandidateError) -> BenchmarkOutcome {
        if !resolution.try_resolve() {
            warn!(error = %error, "late resolution path ignored");
        }
        BenchmarkOutcome::failed(error.to_string())
    }
}
