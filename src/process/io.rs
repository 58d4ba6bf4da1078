//! Command writer for the interpreter's stdin.

use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Writes newline-terminated commands to the interpreter's stdin.
///
/// Unlike a one-shot prompt writer, the handle stays open for the whole
/// session: the interpreter reads one command per line until its stdin
/// closes.
pub struct CommandWriter {
    stdin: Box<dyn AsyncWrite + Send + Unpin>,
}

impl CommandWriter {
    /// Create a new writer from any async byte sink (normally the child's
    /// stdin handle).
    pub fn new(stdin: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self { stdin: Box::new(stdin) }
    }

    /// Write one command followed by the line separator and flush.
    pub async fn write_command(&mut self, command: &str) -> std::io::Result<()> {
        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await
    }
}
