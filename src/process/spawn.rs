//! Process spawning and lifecycle management.

use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::SupervisorConfig;
use crate::{Error, Result};

/// A running interpreter process.
///
/// This struct manages the lifecycle of a single interpreter invocation.
/// One process lives for the whole supervision session.
///
/// # Cancellation
///
/// Dropping an `InterpreterProcess` will kill the subprocess if it's
/// still running.
pub struct InterpreterProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
}

impl InterpreterProcess {
    /// Spawn the interpreter with the story file as its sole argument.
    ///
    /// Stdin and stdout are piped; stderr is inherited.
    pub fn spawn(config: &SupervisorConfig) -> Result<Self> {
        let mut cmd = Command::new(config.interpreter());
        cmd.arg(config.story_file());
        if let Some(dir) = config.working_directory() {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::inherit());

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::InterpreterNotFound {
                    path: config.interpreter().display().to_string(),
                }
            } else {
                Error::Launch(e)
            }
        })?;

        tracing::debug!(
            pid = ?child.id(),
            interpreter = %config.interpreter().display(),
            story = %config.story_file().display(),
            "interpreter spawned"
        );

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();

        Ok(Self { child, stdin, stdout })
    }

    /// Take the writable stdin handle. It can only be taken once.
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.stdin.take()
    }

    /// Take the readable stdout handle. It can only be taken once.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// Get the process ID of the running interpreter.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Liveness probe: check if the process is still running.
    pub fn is_running(&self) -> bool {
        self.child.id().is_some()
    }

    /// Wait for the process to exit and return its exit status.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        self.child.wait().await.map_err(|e| Error::Wait(e.to_string()))
    }

    /// Kill the process and wait for it to exit.
    pub async fn kill(&mut self) -> Result<()> {
        self.child.kill().await.map_err(|e| Error::Wait(e.to_string()))
    }

    /// Signal the process to die without waiting.
    pub fn start_kill(&mut self) -> Result<()> {
        self.child.start_kill().map_err(|e| Error::Wait(e.to_string()))
    }

    /// Move the process into a background wait task.
    ///
    /// The returned [`ProcessMonitor`] publishes the child's [`ExitNotice`]
    /// through a watch channel. Dropping the monitor aborts the wait task
    /// and kills the child if it is still alive.
    pub fn monitor(mut self) -> ProcessMonitor {
        let (tx, rx) = watch::channel(None);

        let handle = tokio::spawn(async move {
            let notice = match self.wait().await {
                Ok(status) => ExitNotice::Exited(status),
                Err(e) => ExitNotice::WaitFailed(e.to_string()),
            };
            tracing::debug!(?notice, "interpreter exited");
            let _ = tx.send(Some(notice));
        });

        ProcessMonitor { exit: rx, handle }
    }
}

impl Drop for InterpreterProcess {
    fn drop(&mut self) {
        if self.is_running() {
            tracing::warn!(pid = ?self.child.id(), "interpreter still running on drop; killing");
            let _ = self.start_kill();
        }
    }
}

/// Handle to the background task waiting on the interpreter.
///
/// The monitor owns the [`InterpreterProcess`]; its own lifetime bounds the
/// child's. Subscribers observe termination through cloned watch receivers.
pub struct ProcessMonitor {
    exit: watch::Receiver<Option<ExitNotice>>,
    handle: JoinHandle<()>,
}

impl ProcessMonitor {
    /// Get a receiver that resolves to the child's exit notice.
    ///
    /// The receiver holds `None` until the child exits.
    pub fn subscribe(&self) -> watch::Receiver<Option<ExitNotice>> {
        self.exit.clone()
    }
}

impl Drop for ProcessMonitor {
    fn drop(&mut self) {
        // Aborting the wait task drops the process, which kills the child.
        self.handle.abort();
    }
}

/// Terminal notification from the exit monitor.
#[derive(Debug, Clone)]
pub enum ExitNotice {
    /// The interpreter exited with this status.
    Exited(ExitStatus),
    /// Waiting on the interpreter failed.
    WaitFailed(String),
}

impl ExitNotice {
    /// Convert the notice into the matching terminal error.
    pub fn into_error(self) -> Error {
        match self {
            ExitNotice::Exited(status) => Error::Terminated { status },
            ExitNotice::WaitFailed(message) => Error::Wait(message),
        }
    }
}
