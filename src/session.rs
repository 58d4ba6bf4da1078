//! Command/reply round trips with the interpreter.
//!
//! This module provides [`Session`], the evaluator that pairs each command
//! written to the interpreter with the single demarcated reply it
//! produces.
//!
//! # Example
//!
//! ```ignore
//! use libfrotz::{InterpreterProcess, Session, SupervisorConfig};
//!
//! let config = SupervisorConfig::builder()
//!     .interpreter("/usr/bin/dfrotz")
//!     .story_file("ZORK1.DAT")
//!     .build()?;
//! let process = InterpreterProcess::spawn(&config)?;
//! let session = Session::new(process, config.quiet_window())?;
//!
//! let banner = session.evaluate("").await?;   // startup banner
//! let reply = session.evaluate("look").await?;
//! println!("{}", reply.text());
//! ```

use std::process::ExitStatus;

use tokio::sync::{watch, Mutex};

use crate::process::{CommandWriter, ExitNotice, InterpreterProcess, ProcessMonitor};
use crate::stream::{Reply, ReplyStream};
use crate::{Error, Result};

/// A supervision session over one interpreter process.
///
/// # Round-trip discipline
///
/// Round trips are strictly sequential: an internal mutex serializes
/// concurrent callers, so a reply is only ever derived from output
/// produced after its own command was written. There is no per-command
/// deadline; a command that never produces output blocks until the
/// interpreter exits.
///
/// # Failure semantics
///
/// The first terminal outcome (write failure, output pipe closed, or
/// interpreter exit) latches the session: every later call to
/// [`evaluate`](Self::evaluate) is rejected without touching the child.
///
/// # Thread Safety
///
/// `Session` is `Send + Sync` and can be shared across tasks.
pub struct Session {
    inner: Mutex<Inner>,
    exit: watch::Receiver<Option<ExitNotice>>,
    /// Bounds the child's lifetime: dropping the session kills a
    /// still-running interpreter via the monitor.
    _monitor: Option<ProcessMonitor>,
}

struct Inner {
    writer: CommandWriter,
    replies: ReplyStream,
    exit: watch::Receiver<Option<ExitNotice>>,
    fatal: Option<Fatal>,
}

/// Latched terminal state, replayed to every subsequent caller.
enum Fatal {
    Exited(ExitStatus),
    WaitFailed(String),
    OutputClosed,
    /// The original error (a write failure) carried a non-clonable source.
    Poisoned,
}

impl Fatal {
    fn from_notice(notice: ExitNotice) -> Self {
        match notice {
            ExitNotice::Exited(status) => Fatal::Exited(status),
            ExitNotice::WaitFailed(message) => Fatal::WaitFailed(message),
        }
    }

    fn to_error(&self) -> Error {
        match self {
            Fatal::Exited(status) => Error::Terminated { status: *status },
            Fatal::WaitFailed(message) => Error::Wait(message.clone()),
            Fatal::OutputClosed => Error::OutputClosed,
            Fatal::Poisoned => Error::SessionClosed,
        }
    }
}

impl Session {
    /// Build a session around a freshly spawned interpreter.
    ///
    /// Takes the process's pipes and moves the process itself into a
    /// background exit monitor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Launch`] if either pipe handle has already been
    /// taken from the process.
    pub fn new(mut process: InterpreterProcess, quiet_window: std::time::Duration) -> Result<Self> {
        let stdin = process
            .take_stdin()
            .ok_or_else(|| Error::Launch(pipe_unavailable("stdin")))?;
        let stdout = process
            .take_stdout()
            .ok_or_else(|| Error::Launch(pipe_unavailable("stdout")))?;

        let monitor = process.monitor();
        let exit = monitor.subscribe();

        Ok(Self::assemble(
            CommandWriter::new(stdin),
            ReplyStream::new(stdout, quiet_window),
            exit,
            Some(monitor),
        ))
    }

    /// Build a session from already-wired parts.
    ///
    /// This is the seam used by tests to drive a session over in-memory
    /// pipes instead of a real child process. No monitor is attached; the
    /// caller controls the exit channel.
    pub fn from_parts(
        writer: CommandWriter,
        replies: ReplyStream,
        exit: watch::Receiver<Option<ExitNotice>>,
    ) -> Self {
        Self::assemble(writer, replies, exit, None)
    }

    fn assemble(
        writer: CommandWriter,
        replies: ReplyStream,
        exit: watch::Receiver<Option<ExitNotice>>,
        monitor: Option<ProcessMonitor>,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                writer,
                replies,
                exit: exit.clone(),
                fatal: None,
            }),
            exit,
            _monitor: monitor,
        }
    }

    /// Perform one command/reply round trip.
    ///
    /// Writes the command followed by the line separator, then waits for
    /// whichever comes first: the next demarcated reply, or the
    /// interpreter's termination. An empty command performs no write and
    /// just awaits the next reply; the supervisor uses this once at
    /// startup to capture the banner.
    ///
    /// # Errors
    ///
    /// - [`Error::Write`] if the command cannot be sent; surfaced
    ///   immediately, without waiting for output.
    /// - [`Error::Terminated`] / [`Error::Wait`] if the interpreter goes
    ///   away before a reply arrives.
    /// - [`Error::OutputClosed`] if the output pipe closes and no exit
    ///   status is forthcoming.
    /// - The latched terminal error (or [`Error::SessionClosed`]) on every
    ///   call after a terminal outcome.
    pub async fn evaluate(&self, command: &str) -> Result<Reply> {
        let mut inner = self.inner.lock().await;
        let Inner { writer, replies, exit, fatal } = &mut *inner;

        if let Some(f) = fatal.as_ref() {
            return Err(f.to_error());
        }

        // An interpreter that already exited fails fast, before any write.
        let already_exited = exit.borrow().clone();
        if let Some(notice) = already_exited {
            return Err(latch(fatal, Fatal::from_notice(notice)));
        }

        if !command.is_empty() {
            tracing::trace!(%command, "sending command");
            if let Err(e) = writer.write_command(command).await {
                latch(fatal, Fatal::Poisoned);
                return Err(Error::Write(e));
            }
        }

        tokio::select! {
            reply = replies.next_reply() => match reply {
                Some(reply) => Ok(reply),
                None => {
                    // Output pipe closed: report the exit status once the
                    // monitor delivers it.
                    let f = match next_notice(exit).await {
                        Some(notice) => Fatal::from_notice(notice),
                        None => Fatal::OutputClosed,
                    };
                    Err(latch(fatal, f))
                }
            },
            notice = notice_or_pending(exit) => {
                Err(latch(fatal, Fatal::from_notice(notice)))
            }
        }
    }

    /// Wait for the interpreter to terminate.
    ///
    /// Used by the idle coordinator to notice an externally killed child
    /// without a round trip in flight. Resolves to the terminal error.
    pub async fn terminated(&self) -> Error {
        let mut exit = self.exit.clone();
        match next_notice(&mut exit).await {
            Some(notice) => notice.into_error(),
            None => Error::OutputClosed,
        }
    }
}

/// Record the terminal state and return the error to surface for it.
fn latch(fatal: &mut Option<Fatal>, state: Fatal) -> Error {
    let err = state.to_error();
    *fatal = Some(state);
    err
}

/// Await the exit notice; `None` means the monitor itself went away.
async fn next_notice(exit: &mut watch::Receiver<Option<ExitNotice>>) -> Option<ExitNotice> {
    match exit.wait_for(|notice| notice.is_some()).await {
        Ok(guard) => guard.clone(),
        Err(_) => None,
    }
}

/// Await the exit notice while a round trip is in flight.
///
/// A monitor that disappears without delivering a notice must not win the
/// race — the reply side keeps draining and reports the closure itself.
async fn notice_or_pending(exit: &mut watch::Receiver<Option<ExitNotice>>) -> ExitNotice {
    loop {
        match exit.wait_for(|notice| notice.is_some()).await {
            Ok(guard) => {
                if let Some(notice) = guard.clone() {
                    return notice;
                }
            }
            Err(_) => std::future::pending::<()>().await,
        }
    }
}

fn pipe_unavailable(name: &str) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::BrokenPipe,
        format!("{name} pipe already taken"),
    )
}
