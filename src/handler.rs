//! Reply handling: the observer trait and the ordered output dispatcher.

use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::stream::Reply;

/// Observer for completed round trips.
///
/// Implementations receive a callback after each reply has been written to
/// the output sink. This is for observation and side channels (metrics,
/// transcripts, persistence); displaying the reply is the dispatcher's
/// job.
///
/// # Implementation Notes
///
/// - Implementations must be lightweight; the dispatcher invokes them
///   synchronously, so a slow handler delays subsequent output.
/// - The method has a default empty implementation.
///
/// # Example
///
/// ```ignore
/// use libfrotz::{Reply, ReplyHandler};
///
/// struct MoveCounter {
///     moves: std::sync::atomic::AtomicUsize,
/// }
///
/// impl ReplyHandler for MoveCounter {
///     fn on_reply(&self, _command: &str, _reply: &Reply) {
///         self.moves.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///     }
/// }
/// ```
pub trait ReplyHandler: Send + Sync {
    /// Called once per round trip, after the reply text has been written.
    ///
    /// # Arguments
    ///
    /// * `command` - the command as sent (trimmed); empty for the startup
    ///   banner
    /// * `reply` - the demarcated reply, text verbatim
    fn on_reply(&self, command: &str, reply: &Reply) {
        let _ = (command, reply);
    }
}

/// Handler that logs round trips via `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHandler;

impl ReplyHandler for LoggingHandler {
    fn on_reply(&self, command: &str, reply: &Reply) {
        tracing::debug!(
            %command,
            reply_len = reply.text().len(),
            first_line = reply.first_line().unwrap_or(""),
            "round trip"
        );
    }
}

/// One completed round trip flowing through the dispatch queue.
struct RoundTrip {
    command: String,
    reply: Reply,
}

/// Serialized, in-order side effects for completed round trips.
///
/// A single consumer task drains a bounded queue: it writes each reply's
/// text verbatim to the sink, then invokes the [`ReplyHandler`]. The
/// single consumer gives both mutual exclusion and submission-order
/// execution, so display order always matches command order.
pub struct OutputDispatcher {
    tx: mpsc::Sender<RoundTrip>,
    worker: JoinHandle<()>,
}

impl OutputDispatcher {
    /// Create a dispatcher writing to stdout.
    pub fn new(handler: Arc<dyn ReplyHandler>) -> Self {
        Self::with_sink(handler, tokio::io::stdout())
    }

    /// Create a dispatcher writing to an explicit sink.
    pub fn with_sink(
        handler: Arc<dyn ReplyHandler>,
        sink: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let worker = tokio::spawn(drain(rx, handler, sink));
        Self { tx, worker }
    }

    /// Enqueue one round trip for display and handling.
    ///
    /// Applies backpressure when the queue is full. A failed enqueue (the
    /// consumer is gone) is logged and dropped; it cannot happen outside a
    /// panicking consumer.
    pub async fn dispatch(&self, command: String, reply: Reply) {
        if self.tx.send(RoundTrip { command, reply }).await.is_err() {
            tracing::warn!("output dispatcher is gone; dropping reply");
        }
    }

    /// Close the queue and wait for every enqueued reply to be handled.
    ///
    /// Called on the way out of the supervisor loop so no output is
    /// truncated at exit.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.worker.await;
    }
}

/// Consumer task: one reply at a time, in submission order.
async fn drain(
    mut rx: mpsc::Receiver<RoundTrip>,
    handler: Arc<dyn ReplyHandler>,
    mut sink: impl AsyncWrite + Send + Unpin,
) {
    while let Some(round_trip) = rx.recv().await {
        if let Err(e) = sink.write_all(round_trip.reply.text().as_bytes()).await {
            tracing::warn!(error = %e, "failed to write reply to sink");
        }
        if let Err(e) = sink.flush().await {
            tracing::warn!(error = %e, "failed to flush sink");
        }
        handler.on_reply(&round_trip.command, &round_trip.reply);
    }
}
