//! Supervisor configuration.
//!
//! This module provides [`SupervisorConfig`] and its builder. The
//! configuration names the interpreter executable, the story file it is
//! given as its sole argument, and the timing knobs of the quiet-window
//! framing heuristic.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use libfrotz::SupervisorConfig;
//!
//! let config = SupervisorConfig::builder()
//!     .interpreter("/usr/bin/dfrotz")
//!     .story_file("ZORK1.DAT")
//!     .quiet_window(Duration::from_millis(300))
//!     .build()?;
//! ```

mod builder;

pub use builder::{SupervisorConfig, SupervisorConfigBuilder};

/// Default quiet window between logical replies.
///
/// The framing heuristic assumes the interpreter pauses at least this long
/// between replies and never pauses this long mid-reply. Shorter windows
/// cut latency but risk fragmenting a reply into several units.
pub const DEFAULT_QUIET_WINDOW: std::time::Duration = std::time::Duration::from_millis(300);

/// Default size of the buffer each raw read fills.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4096;
