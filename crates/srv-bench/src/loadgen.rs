//! Load generator seam
//!
//! The orchestrator treats load generation as a black box: hand it a URL
//! and the test parameters, get back aggregate metrics or an error. The
//! default implementation shells out to an autocannon-compatible CLI and
//! parses the JSON report it prints on stdout; anything emitting the same
//! shape works.

use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use srv_bench_common::LoadMetrics;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Parameters for one load test
#[derive(Debug, Clone)]
pub struct LoadRequest {
    /// Target URL (the candidate's root endpoint)
    pub url: String,
    /// Concurrent connections held open for the duration of the test
    pub connections: u32,
    /// Pipelined requests per connection
    pub pipelining: u32,
    /// Test duration in seconds
    pub duration_secs: u64,
    /// Label attached to the run (the candidate name)
    pub title: String,
}

/// Load generator failures, reported back as candidate-local errors
#[derive(Debug, Error)]
pub enum LoadGenError {
    #[error("failed to start load generator '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("load generator exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("could not parse load generator report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("load generator produced no output")]
    Empty,
}

/// Black-box load generation seam
#[async_trait]
pub trait LoadGenerator: Send + Sync {
    /// Drive sustained load at `request.url` and return aggregate metrics.
    async fn run(&self, request: &LoadRequest) -> Result<LoadMetrics, LoadGenError>;
}

/// Aggregate section of the generator's JSON report
#[derive(Debug, Deserialize)]
struct ReportSummary {
    average: f64,
}

/// The subset of the generator's JSON report the orchestrator consumes
#[derive(Debug, Deserialize)]
struct Report {
    requests: ReportSummary,
    latency: ReportSummary,
    throughput: ReportSummary,
}

fn parse_report(stdout: &[u8]) -> Result<LoadMetrics, LoadGenError> {
    if stdout.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(LoadGenError::Empty);
    }
    let report: Report = serde_json::from_slice(stdout)?;
    Ok(LoadMetrics {
        requests_per_sec_avg: report.requests.average,
        latency_avg_ms: report.latency.average,
        throughput_avg_bytes: report.throughput.average,
    })
}

/// Runs an external load-testing command and parses its JSON report
#[derive(Debug, Clone)]
pub struct CommandLoadGenerator {
    program: String,
}

impl CommandLoadGenerator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl LoadGenerator for CommandLoadGenerator {
    async fn run(&self, request: &LoadRequest) -> Result<LoadMetrics, LoadGenError> {
        info!(
            program = %self.program,
            url = %request.url,
            connections = request.connections,
            pipelining = request.pipelining,
            duration_secs = request.duration_secs,
            "running load generator"
        );

        let mut command = Command::new(&self.program);
        command
            .arg("-c")
            .arg(request.connections.to_string())
            .arg("-p")
            .arg(request.pipelining.to_string())
            .arg("-d")
            .arg(request.duration_secs.to_string())
            .arg("--json")
            .arg("--title")
            .arg(&request.title)
            .arg(&request.url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // The caller bounds the whole call with a ceiling timeout; if
            // that drops this future the child must not linger.
            .kill_on_drop(true);

        let output = command.output().await.map_err(|e| LoadGenError::Spawn {
            program: self.program.clone(),
            source: e,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LoadGenError::Failed {
                status: output.status.to_string(),
                stderr: stderr.trim().chars().take(512).collect(),
            });
        }

        debug!(bytes = output.stdout.len(), "load generator report received");
        parse_report(&output.stdout)
    }
}
