//! Load metrics and their normalized form
//!
//! The load generator reports raw floating-point averages; the report
//! stores a normalized version: requests/sec rounded to the nearest
//! integer, latency and throughput rounded to two decimal places, with
//! throughput converted from bytes/sec to MB/sec.

use serde::{Deserialize, Serialize};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Raw aggregate metrics as reported by the load generator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadMetrics {
    /// Average requests per second over the test window
    pub requests_per_sec_avg: f64,
    /// Average request latency in milliseconds
    pub latency_avg_ms: f64,
    /// Average throughput in bytes per second
    pub throughput_avg_bytes: f64,
}

/// Normalized per-candidate benchmark metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    /// Requests per second, rounded to the nearest integer
    pub requests_per_sec: u64,
    /// Average latency in milliseconds, two decimal places
    pub latency_ms: f64,
    /// Average throughput in MB per second, two decimal places
    pub throughput_mbs: f64,
}

impl BenchmarkMetrics {
    /// Normalize raw generator output for storage and reporting.
    ///
    /// Non-finite or negative inputs collapse to zero rather than
    /// poisoning the report.
    pub fn from_raw(raw: &LoadMetrics) -> Self {
        Self {
            requests_per_sec: round_count(raw.requests_per_sec_avg),
            latency_ms: round2(raw.latency_avg_ms),
            throughput_mbs: round2(raw.throughput_avg_bytes / BYTES_PER_MB),
        }
    }
}

fn round_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

fn round2(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        (value * 100.0).round() / 100.0
    } else {
        0.0
    }
}
