//! Candidate process lifecycle
//!
//! Spawns one candidate as a child in its own process group, watches for
//! exit, and provides idempotent graceful-then-forced teardown. The
//! orchestrator owns at most one handle at a time: the previous
//! candidate's slot must be cleared before the next spawn.

use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use srv_bench_common::CandidateDescriptor;
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::CandidateError;
use crate::wait::wait_until;

/// Exit notification delivered asynchronously by the watcher task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitNotice {
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
    /// Terminating signal name, if the process was killed
    pub signal: Option<String>,
}

impl ExitNotice {
    fn from_status(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal().map(signal_name)
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }

    /// An exit that should abandon the startup window early: anything
    /// other than a clean exit code 0. A clean exit still leaves nothing
    /// listening, but the probe discovers that on its own.
    pub fn is_startup_failure(&self) -> bool {
        !matches!(self.code, Some(0))
    }

    pub fn describe(&self) -> String {
        match (self.code, &self.signal) {
            (Some(code), _) => format!("exit code {code}"),
            (None, Some(signal)) => format!("killed by {signal}"),
            (None, None) => "exit status unknown".to_string(),
        }
    }
}

#[cfg(unix)]
fn signal_name(signo: i32) -> String {
    nix::sys::signal::Signal::try_from(signo)
        .map(|signal| signal.as_str().to_string())
        .unwrap_or_else(|_| format!("signal {signo}"))
}

/// A running candidate process
///
/// The child is spawned into its own process group so that teardown can
/// reach the whole tree for candidates that fork their own workers. A
/// watcher task reaps the child and publishes the exit notice on a watch
/// channel.
#[derive(Debug)]
pub struct ProcessHandle {
    name: String,
    pid: u32,
    external: bool,
    exited: Arc<AtomicBool>,
    terminated: AtomicBool,
    exit_rx: watch::Receiver<Option<ExitNotice>>,
}

impl ProcessHandle {
    /// Spawn the candidate's launch command.
    pub fn spawn(descriptor: &CandidateDescriptor) -> Result<Self, CandidateError> {
        let mut command = Command::new(&descriptor.command);
        command
            .args(&descriptor.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|e| CandidateError::launch(&descriptor.name, e.to_string()))?;

        let pid = child.id().ok_or_else(|| {
            CandidateError::launch(&descriptor.name, "process exited before a pid was assigned")
        })?;

        let exited = Arc::new(AtomicBool::new(false));
        let (exit_tx, exit_rx) = watch::channel(None);

        let watcher_exited = exited.clone();
        let watcher_name = descriptor.name.clone();
        tokio::spawn(async move {
            let notice = match child.wait().await {
                Ok(status) => ExitNotice::from_status(status),
                Err(e) => {
                    warn!(candidate = %watcher_name, error = %e, "failed to reap candidate process");
                    ExitNotice {
                        code: None,
                        signal: None,
                    }
                }
            };
            watcher_exited.store(true, Ordering::SeqCst);
            debug!(candidate = %watcher_name, exit = %notice.describe(), "candidate process exited");
            let _ = exit_tx.send(Some(notice));
        });

        info!(candidate = %descriptor.name, pid, "candidate process started");

        Ok(Self {
            name: descriptor.name.clone(),
            pid,
            external: descriptor.external,
            exited,
            terminated: AtomicBool::new(false),
            exit_rx,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::SeqCst)
    }

    /// Wait until the process exits, returning the exit notice.
    ///
    /// Resolves immediately if the process is already gone.
    pub async fn wait_exit(&self) -> ExitNotice {
        let mut rx = self.exit_rx.clone();
        loop {
            let current = rx.borrow().clone();
            if let Some(notice) = current {
                return notice;
            }
            if rx.changed().await.is_err() {
                // Watcher dropped without sending a notice
                return ExitNotice {
                    code: None,
                    signal: None,
                };
            }
        }
    }

    /// Request termination and wait for the process to go away.
    ///
    /// Idempotent: repeated calls and calls after exit are no-ops. Sends a
    /// graceful SIGTERM first (to the whole process group for `external`
    /// candidates), waits up to `grace` for the exit notice, then falls
    /// back to SIGKILL on the group so nothing is left behind.
    pub async fn terminate(&self, grace: Duration) {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.has_exited() {
            debug!(candidate = %self.name, "terminate: process already exited");
            return;
        }

        info!(candidate = %self.name, pid = self.pid, external = self.external, "terminating candidate process");
        self.send_term();

        let exited = self.exited.clone();
        if wait_until(grace, move || exited.load(Ordering::SeqCst)).await {
            debug!(candidate = %self.name, "candidate exited within grace period");
            return;
        }

        warn!(
            candidate = %self.name,
            pid = self.pid,
            grace_ms = grace.as_millis() as u64,
            "grace period elapsed, force killing process group"
        );
        self.send_kill();
    }

    #[cfg(unix)]
    fn send_term(&self) {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        // External candidates may have forked workers of their own;
        // signal the whole group for those, just the child otherwise.
        let target = if self.external {
            Pid::from_raw(-(self.pid as i32))
        } else {
            Pid::from_raw(self.pid as i32)
        };
        match kill(target, Signal::SIGTERM) {
            Ok(()) => {}
            Err(nix::errno::Errno::ESRCH) => {
                debug!(candidate = %self.name, "process gone before SIGTERM was delivered");
            }
            Err(e) => {
                warn!(candidate = %self.name, pid = self.pid, error = %e, "failed to send SIGTERM");
            }
        }
    }

    #[cfg(unix)]
    fn send_kill(&self) {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        // The graceful path failed; take down the whole group regardless
        // of the external flag.
        let target = Pid::from_raw(-(self.pid as i32));
        match kill(target, Signal::SIGKILL) {
            Ok(()) => {}
            Err(nix::errno::Errno::ESRCH) => {
                debug!(candidate = %self.name, "process group gone before SIGKILL was delivered");
            }
            Err(e) => {
                warn!(candidate = %self.name, pid = self.pid, error = %e, "failed to send SIGKILL");
            }
        }
    }

    #[cfg(not(unix))]
    fn send_term(&self) {
        warn!(candidate = %self.name, "signal-based termination is unsupported on this platform");
    }

    #[cfg(not(unix))]
    fn send_kill(&self) {}
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use srv_bench_common::Endpoint;

    fn descriptor(name: &str, command: &str, args: &[&str]) -> CandidateDescriptor {
        CandidateDescriptor {
            name: name.to_string(),
            endpoint: Endpoint {
                host: "127.0.0.1".to_string(),
                port: 4000,
            },
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            external: false,
        }
    }

    #[tokio::test]
    async fn test_spawn_failure_is_a_launch_error() {
        let result = ProcessHandle::spawn(&descriptor(
            "ghost",
            "srv-bench-test-no-such-binary-12345",
            &[],
        ));
        match result {
            Err(CandidateError::Launch { name, .. }) => assert_eq!(name, "ghost"),
            other => panic!("expected launch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exit_notice_for_failing_child() {
        let handle = ProcessHandle::spawn(&descriptor("crash", "sh", &["-c", "exit 7"])).unwrap();
        let notice = handle.wait_exit().await;
        assert_eq!(notice.code, Some(7));
        assert!(notice.is_startup_failure());
        assert!(handle.has_exited());
    }

    #[tokio::test]
    async fn test_clean_exit_is_not_a_startup_failure() {
        let handle = ProcessHandle::spawn(&descriptor("clean", "true", &[])).unwrap();
        let notice = handle.wait_exit().await;
        assert_eq!(notice.code, Some(0));
        assert!(!notice.is_startup_failure());
    }

    #[tokio::test]
    async fn test_terminate_kills_long_running_child() {
        let handle = ProcessHandle::spawn(&descriptor("sleeper", "sleep", &["30"])).unwrap();
        assert!(!handle.has_exited());

        handle.terminate(Duration::from_secs(2)).await;
        let notice = handle.wait_exit().await;
        assert!(handle.has_exited());
        assert_eq!(notice.signal.as_deref(), Some("SIGTERM"));
    }

    #[tokio::test]
    async fn test_terminate_external_signals_whole_group() {
        let mut desc = descriptor("tree", "sh", &["-c", "sleep 30 & wait"]);
        desc.external = true;
        let handle = ProcessHandle::spawn(&desc).unwrap();

        handle.terminate(Duration::from_secs(2)).await;
        let notice = handle.wait_exit().await;
        assert_eq!(notice.signal.as_deref(), Some("SIGTERM"));
    }

    #[tokio::test]
    async fn test_terminate_is_idempotent_after_exit() {
        let handle = ProcessHandle::spawn(&descriptor("gone", "true", &[])).unwrap();
        handle.wait_exit().await;

        // Both calls are no-ops: the first sees the exited flag, the
        // second sees the terminated flag.
        handle.terminate(Duration::from_millis(100)).await;
        handle.terminate(Duration::from_millis(100)).await;
    }
}
