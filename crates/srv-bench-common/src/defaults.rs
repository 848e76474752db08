//! Default configuration values shared across srv-bench components
//!
//! These constants keep the CLI defaults and the registry deserialization
//! defaults consistent.

/// Default host a candidate is expected to bind
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default delay before the first readiness probe, in milliseconds
pub const DEFAULT_START_DELAY_MS: u64 = 1000;

/// Default timeout for the HTTP readiness check, in milliseconds
pub const DEFAULT_HTTP_PROBE_TIMEOUT_MS: u64 = 2000;

/// Default timeout for the raw socket fallback check, in milliseconds
pub const DEFAULT_SOCKET_PROBE_TIMEOUT_MS: u64 = 1000;

/// Default ceiling for the whole probe phase, in milliseconds
pub const DEFAULT_PROBE_PHASE_TIMEOUT_MS: u64 = 5000;

/// Default load test duration in seconds
pub const DEFAULT_BENCH_DURATION_SECS: u64 = 10;

/// Default ceiling for the benchmark phase in seconds.
///
/// Strictly greater than the test duration so the load generator has room
/// for its own startup and teardown overhead.
pub const DEFAULT_BENCH_TIMEOUT_SECS: u64 = 30;

/// Default number of concurrent connections held by the load generator
pub const DEFAULT_CONNECTIONS: u32 = 100;

/// Default number of pipelined requests per connection
pub const DEFAULT_PIPELINING: u32 = 10;

/// Default grace period between SIGTERM and SIGKILL, in milliseconds
pub const DEFAULT_GRACE_MS: u64 = 3000;

// Serde default functions for struct field defaults

/// Returns the default candidate host
pub fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
