//! Quiet-window demarcation of the interpreter's output.
//!
//! The interpreter never marks the end of a reply with a delimiter; the
//! only observable boundary is a pause on the pipe. This module turns the
//! raw byte stream into a sequence of [`Reply`] units by treating a
//! configurable period of silence as the end of a unit.
//!
//! # Overview
//!
//! - [`Reply`] - one demarcated unit, carrying the text verbatim
//! - [`ReplyStream`] - a lazy, unbounded async stream of units
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use libfrotz::ReplyStream;
//!
//! let mut replies = ReplyStream::new(stdout, Duration::from_millis(300));
//! while let Some(reply) = replies.next_reply().await {
//!     print!("{}", reply.text());
//! }
//! ```
//!
//! # Cancellation
//!
//! Dropping a [`ReplyStream`] aborts both background tasks and releases
//! the source.

mod demarcate;
mod reply;

pub use demarcate::ReplyStream;
pub use reply::Reply;
