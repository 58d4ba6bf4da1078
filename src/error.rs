use std::path::PathBuf;
use std::process::ExitStatus;

/// Errors that can occur when supervising an interpreter.
///
/// Errors are organized by category:
/// - Configuration errors: detected at `build()` time
/// - Launch errors: failed to start the interpreter process
/// - Session errors: communication failures during a round trip
/// - Termination errors: the interpreter went away
/// - Save errors: recoverable failures local to the save dialogue
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    // -------------------------------------------------------------------------
    // Configuration errors (detected at build() time)
    // -------------------------------------------------------------------------
    /// Invalid configuration provided to the builder.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -------------------------------------------------------------------------
    // Launch errors
    // -------------------------------------------------------------------------
    /// Interpreter executable not found.
    #[error("interpreter not found: {path}")]
    InterpreterNotFound { path: String },

    /// Failed to spawn the interpreter process or set up its pipes.
    #[error("failed to launch interpreter: {0}")]
    Launch(#[source] std::io::Error),

    // -------------------------------------------------------------------------
    // Session errors
    // -------------------------------------------------------------------------
    /// Failed to send a command to the interpreter's stdin.
    #[error("failed to send command: {0}")]
    Write(#[source] std::io::Error),

    /// The interpreter's output pipe closed without an exit status.
    #[error("interpreter output closed unexpectedly")]
    OutputClosed,

    /// A previous terminal error already closed this session.
    #[error("session closed by an earlier error")]
    SessionClosed,

    // -------------------------------------------------------------------------
    // Termination errors
    // -------------------------------------------------------------------------
    /// The interpreter exited.
    #[error("interpreter exited: {status}")]
    Terminated { status: ExitStatus },

    /// Waiting on the interpreter failed.
    #[error("failed to wait for interpreter: {0}")]
    Wait(String),

    // -------------------------------------------------------------------------
    // Save errors (recoverable, local to the save dialogue)
    // -------------------------------------------------------------------------
    /// The save target already exists and overwriting was not requested.
    #[error("save target already exists: {}", path.display())]
    SaveConflict { path: PathBuf },

    /// The interpreter's acknowledgment did not match the expected prefix.
    #[error("unexpected save acknowledgment: {response:?}")]
    SaveProtocol { response: String },
}

/// A specialized Result type for libfrotz operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error ends the supervision session.
    ///
    /// Save errors are reported to the caller of
    /// [`Session::save`](crate::Session::save) and leave the session
    /// usable; everything else unwinds the supervisor loop.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::SaveConflict { .. } | Error::SaveProtocol { .. }
        )
    }

    /// Check if this error reports interpreter termination.
    pub fn is_termination(&self) -> bool {
        matches!(
            self,
            Error::Terminated { .. } | Error::Wait(_) | Error::OutputClosed
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Write(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }

    #[test]
    fn save_errors_are_not_fatal() {
        assert!(!Error::SaveConflict { path: "/tmp/game.qzl".into() }.is_fatal());
        assert!(!Error::SaveProtocol { response: "Failed.".into() }.is_fatal());
    }

    #[test]
    fn supervision_errors_are_fatal() {
        assert!(Error::InterpreterNotFound { path: "dfrotz".into() }.is_fatal());
        assert!(Error::OutputClosed.is_fatal());
        assert!(Error::SessionClosed.is_fatal());
        assert!(Error::Wait("no child".into()).is_fatal());
        assert!(Error::InvalidConfig("bad".into()).is_fatal());
    }

    #[test]
    fn termination_detection() {
        assert!(Error::OutputClosed.is_termination());
        assert!(Error::Wait("interrupted".into()).is_termination());
        assert!(!Error::SessionClosed.is_termination());
        assert!(!Error::SaveConflict { path: "x".into() }.is_termination());
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Write(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn question_mark_operator_io() {
        fn fallible_io() -> Result<()> {
            Err::<(), std::io::Error>(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))?;
            Ok(())
        }
        assert!(matches!(fallible_io(), Err(Error::Write(_))));
    }

    #[test]
    fn display_includes_context() {
        let err = Error::SaveConflict { path: "/saves/west-of-house.qzl".into() };
        assert!(err.to_string().contains("west-of-house.qzl"));

        let err = Error::InterpreterNotFound { path: "dfrotz".into() };
        assert!(err.to_string().contains("dfrotz"));
    }
}
