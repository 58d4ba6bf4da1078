//! Test utilities for libfrotz integration tests.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};
use tokio::sync::watch;

use libfrotz::{CommandWriter, ExitNotice, ReplyStream, Session};

/// Quiet window used by the in-memory scenarios.
pub const WINDOW: Duration = Duration::from_millis(300);

/// A gap shorter than the window: chunks this far apart merge.
pub const BRIEF: Duration = Duration::from_millis(50);

/// The far end of an in-memory session: what the interpreter would see.
///
/// Tests spawn a task that plays the interpreter's half of the dialogue
/// through these handles while the test body drives the [`Session`].
pub struct FakeInterpreter {
    commands: Lines<BufReader<DuplexStream>>,
    replies: DuplexStream,
    exit: watch::Sender<Option<ExitNotice>>,
}

impl FakeInterpreter {
    /// Read the next command line the session wrote.
    ///
    /// Returns `None` once the session (and its writer) is gone.
    pub async fn next_command(&mut self) -> Option<String> {
        self.commands.next_line().await.expect("read command line")
    }

    /// Write one reply in a single burst.
    pub async fn reply(&mut self, text: &str) {
        self.replies
            .write_all(text.as_bytes())
            .await
            .expect("write reply");
    }

    /// Write one reply split into chunks separated by `gap`.
    ///
    /// With `gap < WINDOW` the chunks demarcate as a single unit.
    pub async fn reply_chunks(&mut self, chunks: &[&str], gap: Duration) {
        for chunk in chunks {
            self.reply(chunk).await;
            tokio::time::sleep(gap).await;
        }
    }

    /// Close the output pipe and publish the exit notice.
    pub fn exit(self, status: ExitStatus) {
        let _ = self.exit.send(Some(ExitNotice::Exited(status)));
    }
}

/// Wire a [`Session`] to an in-memory [`FakeInterpreter`].
pub fn wired_session(window: Duration) -> (Session, FakeInterpreter) {
    let (stdin_tx, stdin_rx) = tokio::io::duplex(64 * 1024);
    let (stdout_tx, stdout_rx) = tokio::io::duplex(64 * 1024);
    let (exit_tx, exit_rx) = watch::channel(None);

    let session = Session::from_parts(
        CommandWriter::new(stdin_tx),
        ReplyStream::new(stdout_rx, window),
        exit_rx,
    );
    let fake = FakeInterpreter {
        commands: BufReader::new(stdin_rx).lines(),
        replies: stdout_tx,
        exit: exit_tx,
    };
    (session, fake)
}

/// Fabricate an exit status from a raw wait value (0 = success).
pub fn exit_status(raw: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(raw)
}
