//! Configuration struct and builder.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{DEFAULT_QUIET_WINDOW, DEFAULT_READ_BUFFER_SIZE};
use crate::{Error, Result};

/// Configuration for an interpreter supervision session.
///
/// Use [`SupervisorConfig::builder()`] to create a new configuration.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    // Child invocation
    pub(crate) interpreter: PathBuf,
    pub(crate) story_file: PathBuf,
    pub(crate) working_directory: Option<PathBuf>,

    // Framing
    pub(crate) quiet_window: Duration,
    pub(crate) read_buffer_size: usize,
}

impl SupervisorConfig {
    /// Create a new builder for SupervisorConfig.
    pub fn builder() -> SupervisorConfigBuilder {
        SupervisorConfigBuilder::default()
    }

    /// Path to the interpreter executable.
    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    /// Path to the story file passed as the interpreter's sole argument.
    pub fn story_file(&self) -> &Path {
        &self.story_file
    }

    /// Working directory for the interpreter, if set.
    pub fn working_directory(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }

    /// Inactivity gap that ends a logical reply.
    pub fn quiet_window(&self) -> Duration {
        self.quiet_window
    }

    /// Size of the buffer each raw read fills.
    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }
}

/// Builder for [`SupervisorConfig`].
///
/// The builder validates the configuration when
/// [`build()`](SupervisorConfigBuilder::build) is called.
#[derive(Debug, Clone)]
pub struct SupervisorConfigBuilder {
    interpreter: Option<PathBuf>,
    story_file: Option<PathBuf>,
    working_directory: Option<PathBuf>,
    quiet_window: Duration,
    read_buffer_size: usize,
}

impl Default for SupervisorConfigBuilder {
    fn default() -> Self {
        Self {
            interpreter: None,
            story_file: None,
            working_directory: None,
            quiet_window: DEFAULT_QUIET_WINDOW,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl SupervisorConfigBuilder {
    /// Path to the interpreter executable (required).
    pub fn interpreter(mut self, path: impl Into<PathBuf>) -> Self {
        self.interpreter = Some(path.into());
        self
    }

    /// Path to the story file (required).
    pub fn story_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.story_file = Some(path.into());
        self
    }

    /// Working directory for the interpreter process.
    pub fn working_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(path.into());
        self
    }

    /// Inactivity gap that ends a logical reply.
    pub fn quiet_window(mut self, window: Duration) -> Self {
        self.quiet_window = window;
        self
    }

    /// Size of the buffer each raw read fills.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a required path is missing, the
    /// quiet window is zero, or the read buffer size is zero.
    pub fn build(self) -> Result<SupervisorConfig> {
        let interpreter = self
            .interpreter
            .ok_or_else(|| Error::InvalidConfig("interpreter path is required".into()))?;
        let story_file = self
            .story_file
            .ok_or_else(|| Error::InvalidConfig("story file path is required".into()))?;

        if self.quiet_window.is_zero() {
            return Err(Error::InvalidConfig("quiet window must be non-zero".into()));
        }
        if self.read_buffer_size == 0 {
            return Err(Error::InvalidConfig("read buffer size must be non-zero".into()));
        }

        Ok(SupervisorConfig {
            interpreter,
            story_file,
            working_directory: self.working_directory,
            quiet_window: self.quiet_window,
            read_buffer_size: self.read_buffer_size,
        })
    }
}
