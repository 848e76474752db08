//! srv-bench - benchmark orchestration for local HTTP server candidates
//!
//! Given a registry of candidate servers, the orchestrator starts each
//! one, verifies it is actually serving traffic, drives a fixed-duration
//! load test against it, records the metrics, and tears the process down
//! before moving to the next candidate.
//!
//! ## Modules
//!
//! - [`registry`]: candidate registry loading and validation
//! - [`process`]: candidate process lifecycle (spawn, exit watch, teardown)
//! - [`probe`]: layered readiness probing (HTTP, then raw socket)
//! - [`timer`]: named phase deadline guards
//! - [`resolve`]: single-assignment resolution guard
//! - [`loadgen`]: load generator seam and its command-line implementation
//! - [`runner`]: benchmark execution for one verified candidate
//! - [`orchestrator`]: the sequential run driver and final report
//! - [`wait`]: bounded condition waiting with backoff
//! - [`error`]: candidate-local error taxonomy

pub mod error;
pub mod loadgen;
pub mod orchestrator;
pub mod probe;
pub mod process;
pub mod registry;
pub mod resolve;
pub mod runner;
pub mod timer;
pub mod wait;

// Re-export core types
pub use error::CandidateError;
pub use loadgen::{CommandLoadGenerator, LoadGenError, LoadGenerator, LoadRequest};
pub use orchestrator::{Orchestrator, RunSettings};
pub use probe::ProbeVerdict;
pub use process::{ExitNotice, ProcessHandle};
pub use runner::{BenchSettings, BenchmarkRunner};
