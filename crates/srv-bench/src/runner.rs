//! Benchmark execution for one verified candidate
//!
//! Wraps the load generator in a ceiling timeout strictly above the test
//! duration, and collapses every ending (metrics, generator error,
//! ceiling) into a single recorded outcome. The caller tears the process
//! down whatever the outcome says.

use std::time::Duration;

use srv_bench_common::{BenchmarkMetrics, BenchmarkOutcome, Endpoint};
use tracing::{info, warn};

use crate::error::CandidateError;
use crate::loadgen::{LoadGenerator, LoadRequest};
use crate::timer::{PhaseTimer, TimerOutcome};

/// Load test parameters shared by every candidate in a run
#[derive(Debug, Clone)]
pub struct BenchSettings {
    /// Test duration in seconds
    pub duration_secs: u64,
    /// Concurrent connections
    pub connections: u32,
    /// Pipelined requests per connection
    pub pipelining: u32,
    /// Ceiling for the whole benchmark phase, including generator
    /// startup overhead
    pub ceiling: Duration,
}

impl BenchSettings {
    /// Ceiling actually applied: always strictly above the test duration.
    fn effective_ceiling(&self) -> Duration {
        self.ceiling
            .max(Duration::from_secs(self.duration_secs + 1))
    }
}

/// Runs the load test against a verified candidate
#[derive(Debug)]
pub struct BenchmarkRunner<G> {
    generator: G,
    settings: BenchSettings,
}

impl<G: LoadGenerator> BenchmarkRunner<G> {
    pub fn new(generator: G, settings: BenchSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &BenchSettings {
        &self.settings
    }

    /// Run one load test and normalize the result or the failure into a
    /// single outcome.
    pub async fn run(&self, endpoint: &Endpoint, name: &str) -> BenchmarkOutcome {
        let request = LoadRequest {
            url: endpoint.url(),
            connections: self.settings.connections,
            pipelining: self.settings.pipelining,
            duration_secs: self.settings.duration_secs,
            title: name.to_string(),
        };

        let ceiling = self.settings.effective_ceiling();
        let timer = PhaseTimer::new("load-test", ceiling);

        tokio::select! {
            result = self.generator.run(&request) => {
                timer.disarm();
                match result {
                    Ok(raw) => {
                        let metrics = BenchmarkMetrics::from_raw(&raw);
                        info!(
                            candidate = %name,
                            requests_per_sec = metrics.requests_per_sec,
                            latency_ms = metrics.latency_ms,
                            throughput_mbs = metrics.throughput_mbs,
                            "load test complete"
                        );
                        BenchmarkOutcome::Success(metrics)
                    }
                    Err(e) => {
                        let error = CandidateError::Benchmark {
                            name: name.to_string(),
                            reason: e.to_string(),
                        };
                        warn!(error = %error, "load test failed");
                        BenchmarkOutcome::failed(error.to_string())
                    }
                }
            }
            outcome = timer.fire() => {
                debug_assert_eq!(outcome, TimerOutcome::Fired);
                let error = CandidateError::BenchmarkTimeout {
                    name: name.to_string(),
                    limit_secs: ceiling.as_secs(),
                };
                warn!(error = %error, "load test hit its ceiling");
                BenchmarkOutcome::failed(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loadgen::LoadGenError;
    use async_trait::async_trait;
    use srv_bench_common::LoadMetrics;

    struct FixedGenerator(LoadMetrics);

    #[async_trait]
    impl LoadGenerator for FixedGenerator {
        async fn run(&self, _request: &LoadRequest) -> Result<LoadMetrics, LoadGenError> {
            Ok(self.0)
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl LoadGenerator for FailingGenerator {
        async fn run(&self, _request: &LoadRequest) -> Result<LoadMetrics, LoadGenError> {
            Err(LoadGenError::Empty)
        }
    }

    struct StuckGenerator;

    #[async_trait]
    impl LoadGenerator for StuckGenerator {
        async fn run(&self, _request: &LoadRequest) -> Result<LoadMetrics, LoadGenError> {
            std::future::pending().await
        }
    }

    fn endpoint() -> Endpoint {
        Endpoint {
            host: "127.0.0.1".to_string(),
            port: 4000,
        }
    }

    fn settings(ceiling: Duration) -> BenchSettings {
        BenchSettings {
            duration_secs: 0,
            connections: 100,
            pipelining: 10,
            ceiling,
        }
    }

    #[tokio::test]
    async fn test_success_is_normalized() {
        let runner = BenchmarkRunner::new(
            FixedGenerator(LoadMetrics {
                requests_per_sec_avg: 12000.4,
                latency_avg_ms: 3.21,
                throughput_avg_bytes: 1_572_864.0,
            }),
            settings(Duration::from_secs(30)),
        );

        let outcome = runner.run(&endpoint(), "echo").await;
        let metrics = outcome.metrics().expect("expected success");
        assert_eq!(metrics.requests_per_sec, 12000);
        assert_eq!(metrics.latency_ms, 3.21);
        assert_eq!(metrics.throughput_mbs, 1.5);
    }

    #[tokio::test]
    async fn test_generator_error_becomes_failure_outcome() {
        let runner = BenchmarkRunner::new(FailingGenerator, settings(Duration::from_secs(30)));
        let outcome = runner.run(&endpoint(), "echo").await;
        let cause = outcome.cause().expect("expected failure");
        assert!(cause.contains("load test failed"));
    }

    #[tokio::test]
    async fn test_ceiling_becomes_failure_outcome() {
        let runner = BenchmarkRunner::new(StuckGenerator, settings(Duration::from_millis(50)));
        let outcome = runner.run(&endpoint(), "echo").await;
        let cause = outcome.cause().expect("expected failure");
        assert!(cause.contains("timed out"));
    }

    #[test]
    fn test_ceiling_always_exceeds_duration() {
        let settings = BenchSettings {
            duration_secs: 10,
            connections: 1,
            pipelining: 1,
            ceiling: Duration::from_secs(5),
        };
        assert_eq!(settings.effective_ceiling(), Duration::from_secs(11));
    }
}
