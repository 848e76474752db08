//! Final report rendering
//!
//! Prints the comparison table to stdout and optionally writes a JSON
//! results file. Rows follow registration order, one per registered
//! candidate regardless of outcome, with "N/A" standing in for any field
//! a failure left unproduced.

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use srv_bench_common::{BenchmarkOutcome, CandidateDescriptor, OutcomeLedger};
use tracing::info;

const NOT_AVAILABLE: &str = "N/A";

/// Print the comparison table to stdout.
pub fn print_summary(candidates: &[CandidateDescriptor], ledger: &OutcomeLedger) {
    if candidates.is_empty() {
        return;
    }

    println!("\n=== Benchmark Results ===\n");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Candidate"),
            Cell::new("Status"),
            Cell::new("Req/s"),
            Cell::new("Latency (ms)"),
            Cell::new("Throughput (MB/s)"),
            Cell::new("Details"),
        ]);

    for candidate in candidates {
        let (status, requests, latency, throughput, details) = match ledger.get(&candidate.name) {
            Some(BenchmarkOutcome::Success(metrics)) => (
                "complete",
                metrics.requests_per_sec.to_string(),
                format!("{:.2}", metrics.latency_ms),
                format!("{:.2}", metrics.throughput_mbs),
                "-".to_string(),
            ),
            Some(BenchmarkOutcome::Failed { cause }) => (
                "failed",
                NOT_AVAILABLE.to_string(),
                NOT_AVAILABLE.to_string(),
                NOT_AVAILABLE.to_string(),
                cause.clone(),
            ),
            None => (
                "skipped",
                NOT_AVAILABLE.to_string(),
                NOT_AVAILABLE.to_string(),
                NOT_AVAILABLE.to_string(),
                "not attempted".to_string(),
            ),
        };

        table.add_row(vec![
            Cell::new(&candidate.name),
            Cell::new(status),
            Cell::new(&requests),
            Cell::new(&latency),
            Cell::new(&throughput),
            Cell::new(&details),
        ]);
    }

    println!("{table}");
}

/// Parameters echoed into the results file
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub run_id: String,
    pub duration_secs: u64,
    pub connections: u32,
    pub pipelining: u32,
}

/// Write results to the output file.
pub fn write_results(
    path: &Path,
    info: &RunInfo,
    candidates: &[CandidateDescriptor],
    ledger: &OutcomeLedger,
) -> Result<()> {
    // An array keeps registration order in the file as well
    let results: Vec<serde_json::Value> = candidates
        .iter()
        .map(|candidate| match ledger.get(&candidate.name) {
            Some(BenchmarkOutcome::Success(metrics)) => serde_json::json!({
                "name": candidate.name,
                "endpoint": candidate.endpoint.addr(),
                "status": "complete",
                "requests_per_sec": metrics.requests_per_sec,
                "latency_ms": metrics.latency_ms,
                "throughput_mbs": metrics.throughput_mbs,
            }),
            Some(BenchmarkOutcome::Failed { cause }) => serde_json::json!({
                "name": candidate.name,
                "endpoint": candidate.endpoint.addr(),
                "status": "failed",
                "cause": cause,
            }),
            None => serde_json::json!({
                "name": candidate.name,
                "endpoint": candidate.endpoint.addr(),
                "status": "skipped",
            }),
        })
        .collect();

    let output = serde_json::json!({
        "run_id": info.run_id,
        "written_at": chrono::Utc::now().to_rfc3339(),
        "duration_secs": info.duration_secs,
        "connections": info.connections,
        "pipelining": info.pipelining,
        "success": ledger.len() == candidates.len() && ledger.all_success(),
        "results": results,
    });

    std::fs::write(path, serde_json::to_string_pretty(&output)?)?;
    info!(path = %path.display(), "results written");

    Ok(())
}
