//! # libfrotz
//!
//! Async supervisor for line-oriented interactive fiction interpreters.
//!
//! An interpreter like `dfrotz` talks over plain stdin/stdout pipes and
//! never marks where one reply ends: the only boundary signal is a pause
//! on the output pipe. This library supplies the machinery around that
//! fact:
//!
//! - Quiet-window demarcation of the undelimited output stream into
//!   logical replies
//! - Strictly sequential command/reply round trips
//! - Ordered, serialized output handling
//! - Process ownership with guaranteed termination on every exit path
//!
//! ## Quick Start
//!
//! ```ignore
//! use libfrotz::{Result, Supervisor, SupervisorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SupervisorConfig::builder()
//!         .interpreter("/usr/bin/dfrotz")
//!         .story_file("ZORK1.DAT")
//!         .build()?;
//!     Supervisor::new(config).run().await
//! }
//! ```
//!
//! ## Driving a session directly
//!
//! ```ignore
//! use libfrotz::{InterpreterProcess, Session};
//!
//! let process = InterpreterProcess::spawn(&config)?;
//! let session = Session::new(process, config.quiet_window())?;
//!
//! let banner = session.evaluate("").await?;
//! let reply = session.evaluate("look").await?;
//! println!("{}", reply.text());
//!
//! session.save("west-of-house.qzl".as_ref(), false).await?;
//! ```
//!
//! ## Framing caveat
//!
//! Demarcation is a heuristic, not a protocol: it assumes the interpreter
//! pauses at least the quiet window between replies and never that long
//! mid-reply. Tune the window through
//! [`SupervisorConfigBuilder::quiet_window`].

pub mod config;
mod error;
pub mod handler;
pub mod process;
mod save;
mod session;
pub mod stream;
mod supervisor;

pub use error::{Error, Result};

// Re-export the main entry points at crate root
pub use session::Session;
pub use supervisor::Supervisor;

// Re-export commonly used config types at crate root
pub use config::{SupervisorConfig, SupervisorConfigBuilder};

// Re-export commonly used process types at crate root
pub use process::{CommandWriter, ExitNotice, InterpreterProcess, ProcessMonitor};

// Re-export commonly used stream and handler types at crate root
pub use handler::{LoggingHandler, OutputDispatcher, ReplyHandler};
pub use stream::{Reply, ReplyStream};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}
    fn assert_send<T: Send>() {}

    /// All major public types must be Send + Sync for use across async tasks.
    #[test]
    fn public_types_are_send_sync() {
        // Entry points
        assert_send_sync::<Session>();

        // Configuration types
        assert_send_sync::<SupervisorConfig>();
        assert_send_sync::<SupervisorConfigBuilder>();

        // Process types
        assert_send_sync::<InterpreterProcess>();
        assert_send_sync::<ProcessMonitor>();
        assert_send_sync::<ExitNotice>();

        // Stream and handler types
        assert_send_sync::<Reply>();
        assert_send_sync::<OutputDispatcher>();
        assert_send_sync::<LoggingHandler>();

        // Error type
        assert_send_sync::<Error>();
    }

    /// ReplyStream and CommandWriter are Send but not Sync (mutable state).
    #[test]
    fn pipeline_types_are_send() {
        assert_send::<ReplyStream>();
        assert_send::<CommandWriter>();
        assert_send::<Supervisor>();
    }
}
