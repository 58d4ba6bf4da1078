//! Reply stream implementation.
//!
//! Two background tasks cooperate: a reader pulls raw chunks off the
//! source, and an accumulator merges them into [`Reply`] units, using a
//! quiet gap of at least the configured window as the unit boundary.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::reply::Reply;
use crate::config::DEFAULT_READ_BUFFER_SIZE;

/// A stream of demarcated replies from an undelimited byte source.
///
/// The stream ends when the source closes or errors; it is not
/// restartable. Any bytes pending at that point are flushed as a final
/// unit before the stream closes.
pub struct ReplyStream {
    rx: mpsc::Receiver<Reply>,
    reader_handle: JoinHandle<()>,
    accumulator_handle: JoinHandle<()>,
}

impl ReplyStream {
    /// Create a stream over `source`, splitting units on `quiet_window`.
    pub fn new(source: impl AsyncRead + Send + Unpin + 'static, quiet_window: Duration) -> Self {
        Self::with_buffer_size(source, quiet_window, DEFAULT_READ_BUFFER_SIZE)
    }

    /// Create a stream with an explicit raw-read buffer size.
    pub fn with_buffer_size(
        source: impl AsyncRead + Send + Unpin + 'static,
        quiet_window: Duration,
        buffer_size: usize,
    ) -> Self {
        let (chunk_tx, chunk_rx) = mpsc::channel(64);
        let (reply_tx, reply_rx) = mpsc::channel(64);

        let reader_handle = tokio::spawn(read_chunks(source, chunk_tx, buffer_size));
        let accumulator_handle = tokio::spawn(accumulate(chunk_rx, reply_tx, quiet_window));

        Self {
            rx: reply_rx,
            reader_handle,
            accumulator_handle,
        }
    }

    /// Receive the next demarcated reply.
    ///
    /// Returns `None` once the source has closed and every pending unit
    /// has been consumed.
    pub async fn next_reply(&mut self) -> Option<Reply> {
        self.rx.recv().await
    }
}

impl Stream for ReplyStream {
    type Item = Reply;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for ReplyStream {
    fn drop(&mut self) {
        self.reader_handle.abort();
        self.accumulator_handle.abort();
    }
}

/// Reader task: forward each raw read as one chunk.
///
/// A zero-byte read (EOF) or a read error ends the task; dropping the
/// sender tells the accumulator to drain and close.
async fn read_chunks(
    mut source: impl AsyncRead + Send + Unpin,
    tx: mpsc::Sender<Vec<u8>>,
    buffer_size: usize,
) {
    let mut buf = vec![0u8; buffer_size];
    loop {
        match source.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                tracing::trace!(bytes = n, "chunk received");
                if tx.send(buf[..n].to_vec()).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "source read failed; closing");
                break;
            }
        }
    }
}

/// Accumulator task: race "next chunk" against the quiet window.
///
/// The timer is only armed while bytes are pending, so a quiet gap with an
/// empty buffer is a no-op and every emitted unit is non-empty.
async fn accumulate(
    mut rx: mpsc::Receiver<Vec<u8>>,
    tx: mpsc::Sender<Reply>,
    quiet_window: Duration,
) {
    let mut pending: Vec<u8> = Vec::new();
    loop {
        if pending.is_empty() {
            match rx.recv().await {
                Some(chunk) => pending.extend_from_slice(&chunk),
                None => return,
            }
        } else {
            match timeout(quiet_window, rx.recv()).await {
                // Chunk before the window elapsed: append, window restarts.
                Ok(Some(chunk)) => pending.extend_from_slice(&chunk),
                // Source closed: flush what's pending, then end the stream.
                Ok(None) => {
                    let _ = emit(&mut pending, &tx).await;
                    return;
                }
                // Quiet gap: the pending bytes form one complete unit.
                Err(_) => {
                    if !emit(&mut pending, &tx).await {
                        return;
                    }
                }
            }
        }
    }
}

/// Emit the pending bytes as one unit and reset the buffer.
async fn emit(pending: &mut Vec<u8>, tx: &mpsc::Sender<Reply>) -> bool {
    let text = String::from_utf8_lossy(pending).into_owned();
    pending.clear();
    tracing::trace!(len = text.len(), "reply demarcated");
    tx.send(Reply::new(text)).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio::io::AsyncWriteExt;
    use tokio::time::sleep;

    const WINDOW: Duration = Duration::from_millis(300);

    /// Shorter than the window: chunks this far apart belong together.
    const BRIEF: Duration = Duration::from_millis(50);

    #[test]
    fn reply_stream_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ReplyStream>();
    }

    #[tokio::test(start_paused = true)]
    async fn chunks_within_window_merge_in_arrival_order() {
        let (mut tx, rx) = tokio::io::duplex(1024);
        let mut stream = ReplyStream::new(rx, WINDOW);

        tokio::spawn(async move {
            for part in ["West of House\n", "You are standing ", "in an open field.\n"] {
                tx.write_all(part.as_bytes()).await.unwrap();
                sleep(BRIEF).await;
            }
        });

        let reply = stream.next_reply().await.unwrap();
        assert_eq!(
            reply.text(),
            "West of House\nYou are standing in an open field.\n"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn qualifying_gap_splits_units() {
        let (mut tx, rx) = tokio::io::duplex(1024);
        let mut stream = ReplyStream::new(rx, WINDOW);

        tokio::spawn(async move {
            tx.write_all(b"first reply").await.unwrap();
            sleep(WINDOW * 2).await;
            tx.write_all(b"second reply").await.unwrap();
        });

        assert_eq!(stream.next_reply().await.unwrap().text(), "first reply");
        assert_eq!(stream.next_reply().await.unwrap().text(), "second reply");
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_chunks_is_one_unit() {
        let (mut tx, rx) = tokio::io::duplex(1024);
        let mut stream = ReplyStream::new(rx, WINDOW);

        tokio::spawn(async move {
            for i in 0..20 {
                tx.write_all(format!("{i};").as_bytes()).await.unwrap();
                sleep(Duration::from_millis(1)).await;
            }
        });

        let reply = stream.next_reply().await.unwrap();
        assert_eq!(reply.text().matches(';').count(), 20);
        assert!(reply.text().starts_with("0;1;"));
    }

    #[tokio::test(start_paused = true)]
    async fn unit_larger_than_read_buffer_concatenates_losslessly() {
        let (mut tx, rx) = tokio::io::duplex(64 * 1024);
        let mut stream = ReplyStream::with_buffer_size(rx, WINDOW, 16);

        let payload = "a".repeat(100);
        let expected = payload.clone();
        tokio::spawn(async move {
            tx.write_all(payload.as_bytes()).await.unwrap();
        });

        let reply = stream.next_reply().await.unwrap();
        assert_eq!(reply.text(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn eof_flushes_pending_bytes_then_closes() {
        let (mut tx, rx) = tokio::io::duplex(1024);
        let mut stream = ReplyStream::new(rx, WINDOW);

        tokio::spawn(async move {
            tx.write_all(b"final words").await.unwrap();
            // tx dropped here: EOF arrives before the window elapses.
        });

        assert_eq!(stream.next_reply().await.unwrap().text(), "final words");
        assert!(stream.next_reply().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn eof_with_empty_buffer_emits_nothing() {
        let (tx, rx) = tokio::io::duplex(1024);
        let mut stream = ReplyStream::new(rx, WINDOW);
        drop(tx);

        assert!(stream.next_reply().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn implements_futures_stream() {
        let (mut tx, rx) = tokio::io::duplex(1024);
        let mut stream = ReplyStream::new(rx, WINDOW);

        tokio::spawn(async move {
            tx.write_all(b"hello").await.unwrap();
        });

        let reply = stream.next().await.unwrap();
        assert_eq!(reply.text(), "hello");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_utf8_is_replaced_not_dropped() {
        let (mut tx, rx) = tokio::io::duplex(1024);
        let mut stream = ReplyStream::new(rx, WINDOW);

        tokio::spawn(async move {
            tx.write_all(&[b'o', b'k', 0xff, b'!']).await.unwrap();
        });

        let reply = stream.next_reply().await.unwrap();
        assert!(reply.text().starts_with("ok"));
        assert!(reply.text().ends_with('!'));
    }
}
