//! Top-level supervision loop.
//!
//! This module provides [`Supervisor`], the coordinator that owns the
//! whole pipeline: operator input, command evaluation, and ordered output
//! dispatch.
//!
//! # Example
//!
//! ```ignore
//! use libfrotz::{Supervisor, SupervisorConfig};
//!
//! let config = SupervisorConfig::builder()
//!     .interpreter("/usr/bin/dfrotz")
//!     .story_file("ZORK1.DAT")
//!     .build()?;
//!
//! Supervisor::new(config).run().await?;
//! ```

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::SupervisorConfig;
use crate::handler::{LoggingHandler, OutputDispatcher, ReplyHandler};
use crate::process::InterpreterProcess;
use crate::session::Session;
use crate::Result;

/// Coordinator for one interpreter supervision session.
///
/// The loop launches the interpreter, captures its startup banner,
/// then repeatedly races the next operator input line against the
/// interpreter's termination. Each input line is trimmed, evaluated as
/// one round trip, and dispatched through the ordered output queue.
///
/// # Exit conditions
///
/// - Operator closes stdin → clean shutdown, `Ok(())`.
/// - Interpreter exits or a pipe fails → the terminal error, after the
///   pending output has been drained.
///
/// Either way the interpreter is no longer running when `run` returns.
pub struct Supervisor {
    config: SupervisorConfig,
    handler: Arc<dyn ReplyHandler>,
}

impl Supervisor {
    /// Create a supervisor with the default (logging) reply handler.
    pub fn new(config: SupervisorConfig) -> Self {
        Self::with_handler(config, Arc::new(LoggingHandler))
    }

    /// Create a supervisor with a custom reply handler.
    pub fn with_handler(config: SupervisorConfig, handler: Arc<dyn ReplyHandler>) -> Self {
        Self { config, handler }
    }

    /// Run the session to completion.
    pub async fn run(self) -> Result<()> {
        let process = InterpreterProcess::spawn(&self.config)?;
        let session = Session::new(process, self.config.quiet_window())?;
        let dispatcher = OutputDispatcher::new(Arc::clone(&self.handler));

        let result = Self::event_loop(&session, &dispatcher).await;

        // Drain pending output before unwinding; dropping the session
        // afterwards tears down the monitor and kills a live child.
        dispatcher.shutdown().await;
        result
    }

    async fn event_loop(session: &Session, dispatcher: &OutputDispatcher) -> Result<()> {
        // Starting: one implicit empty-command round trip captures the
        // banner the interpreter prints before its first prompt.
        let banner = session.evaluate("").await?;
        dispatcher.dispatch(String::new(), banner).await;

        let (mut input, input_worker) = spawn_input_lines();
        let result = Self::running(session, dispatcher, &mut input).await;
        input_worker.abort();
        result
    }

    async fn running(
        session: &Session,
        dispatcher: &OutputDispatcher,
        input: &mut mpsc::Receiver<String>,
    ) -> Result<()> {
        loop {
            tokio::select! {
                line = input.recv() => match line {
                    Some(line) => {
                        let command = line.trim().to_string();
                        // A bare enter would start a round trip with
                        // nothing to answer it.
                        if command.is_empty() {
                            continue;
                        }
                        let reply = session.evaluate(&command).await?;
                        dispatcher.dispatch(command, reply).await;
                    }
                    // Operator closed stdin: clean shutdown.
                    None => return Ok(()),
                },
                err = session.terminated() => return Err(err),
            }
        }
    }
}

/// Worker that feeds operator input lines into a channel.
///
/// Reading stdin pins a blocking thread; the worker is aborted when the
/// loop ends so the channel closes promptly on either side.
fn spawn_input_lines() -> (mpsc::Receiver<String>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(8);
    let handle = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) | Err(_) => break,
            }
        }
    });
    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supervisor_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Supervisor>();
    }

    #[test]
    fn handler_defaults_to_logging() {
        let config = SupervisorConfig::builder()
            .interpreter("dfrotz")
            .story_file("ZORK1.DAT")
            .build()
            .unwrap();
        let _supervisor = Supervisor::new(config);
    }
}
