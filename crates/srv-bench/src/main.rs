//! srv-bench: benchmark orchestrator for local HTTP server candidates
//!
//! Starts each registered candidate server, verifies it is serving,
//! drives a fixed-duration load test against it, tears it down, and
//! prints a comparison table once every candidate has had its turn.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use srv_bench::loadgen::CommandLoadGenerator;
use srv_bench::orchestrator::report::{self, RunInfo};
use srv_bench::orchestrator::{Orchestrator, RunSettings};
use srv_bench::registry;
use srv_bench::runner::BenchSettings;
use srv_bench_common::defaults::{
    DEFAULT_BENCH_DURATION_SECS, DEFAULT_BENCH_TIMEOUT_SECS, DEFAULT_CONNECTIONS,
    DEFAULT_GRACE_MS, DEFAULT_HTTP_PROBE_TIMEOUT_MS, DEFAULT_PIPELINING,
    DEFAULT_PROBE_PHASE_TIMEOUT_MS, DEFAULT_SOCKET_PROBE_TIMEOUT_MS, DEFAULT_START_DELAY_MS,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "srv-bench")]
#[command(about = "Benchmark orchestration for local HTTP server candidates")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Arguments for the run command
#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Path to the candidate registry (JSON array)
    #[arg(short, long)]
    registry: PathBuf,

    /// Load test duration in seconds
    #[arg(short, long, default_value_t = DEFAULT_BENCH_DURATION_SECS)]
    duration: u64,

    /// Concurrent connections held open by the load generator
    #[arg(short, long, default_value_t = DEFAULT_CONNECTIONS)]
    connections: u32,

    /// Pipelined requests per connection
    #[arg(short, long, default_value_t = DEFAULT_PIPELINING)]
    pipelining: u32,

    /// Load generator executable (autocannon-compatible CLI)
    #[arg(long, default_value = "autocannon", env = "SRV_BENCH_LOADGEN")]
    loadgen: String,

    /// Delay before the first readiness probe, in milliseconds
    #[arg(long, default_value_t = DEFAULT_START_DELAY_MS)]
    start_delay_ms: u64,

    /// HTTP readiness check timeout, in milliseconds
    #[arg(long, default_value_t = DEFAULT_HTTP_PROBE_TIMEOUT_MS)]
    http_probe_timeout_ms: u64,

    /// Raw socket fallback check timeout, in milliseconds
    #[arg(long, default_value_t = DEFAULT_SOCKET_PROBE_TIMEOUT_MS)]
    socket_probe_timeout_ms: u64,

    /// Ceiling for the whole probe phase, in milliseconds
    #[arg(long, default_value_t = DEFAULT_PROBE_PHASE_TIMEOUT_MS)]
    probe_timeout_ms: u64,

    /// Ceiling for the benchmark phase in seconds (must exceed --duration)
    #[arg(long, default_value_t = DEFAULT_BENCH_TIMEOUT_SECS)]
    bench_timeout: u64,

    /// Grace period between SIGTERM and SIGKILL, in milliseconds
    #[arg(long, default_value_t = DEFAULT_GRACE_MS)]
    grace_ms: u64,

    /// Output JSON file for results
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Validate the registry and print the plan without launching anything
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Benchmark every candidate in the registry
    Run(Box<RunArgs>),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Command::Run(run_args) => run_benchmarks(*run_args).await,
    }
}

async fn run_benchmarks(args: RunArgs) -> Result<()> {
    // A registry fault is the only per-run setup failure; it aborts with
    // a non-zero exit. Everything after this point resolves per candidate.
    let candidates =
        registry::load_registry(&args.registry).context("failed to load candidate registry")?;

    if args.dry_run {
        println!("\n=== DRY RUN ===\n");
        println!("This would benchmark the following candidates:\n");
        for candidate in &candidates {
            println!(
                "  - {} ({} via `{} {}`)",
                candidate.name,
                candidate.endpoint.addr(),
                candidate.command,
                candidate.args.join(" "),
            );
        }
        println!();
        println!("  Load generator: {}", args.loadgen);
        println!(
            "  Load: {} connections x {} pipelined, {}s per candidate",
            args.connections, args.pipelining, args.duration
        );
        if let Some(output) = &args.output {
            println!("  Output file: {}", output.display());
        }
        println!();
        println!("To run for real, remove the --dry-run flag.");
        return Ok(());
    }

    let run_id = Uuid::now_v7().to_string();
    info!(
        run_id = %run_id,
        candidates = candidates.len(),
        duration_secs = args.duration,
        connections = args.connections,
        "starting benchmark run"
    );

    // Operator interrupt: stop after the current candidate's teardown.
    // The run still exits 0; only setup failures are non-zero.
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, terminating current candidate");
            interrupt.cancel();
        }
    });

    let settings = RunSettings {
        start_delay: Duration::from_millis(args.start_delay_ms),
        http_probe_timeout: Duration::from_millis(args.http_probe_timeout_ms),
        socket_probe_timeout: Duration::from_millis(args.socket_probe_timeout_ms),
        probe_phase_timeout: Duration::from_millis(args.probe_timeout_ms),
        grace: Duration::from_millis(args.grace_ms),
    };
    let bench = BenchSettings {
        duration_secs: args.duration,
        connections: args.connections,
        pipelining: args.pipelining,
        ceiling: Duration::from_secs(args.bench_timeout),
    };

    let generator = CommandLoadGenerator::new(args.loadgen);
    let mut orchestrator = Orchestrator::new(generator, settings, bench, cancel.clone());
    orchestrator.run(&candidates).await;

    report::print_summary(&candidates, orchestrator.ledger());

    if let Some(path) = &args.output {
        let run_info = RunInfo {
            run_id,
            duration_secs: args.duration,
            connections: args.connections,
            pipelining: args.pipelining,
        };
        report::write_results(path, &run_info, &candidates, orchestrator.ledger())?;
    }

    info!("benchmark run complete");
    Ok(())
}
