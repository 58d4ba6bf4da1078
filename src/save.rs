//! The save dialogue.
//!
//! Saving is an in-protocol conversation with the interpreter: issue the
//! save command, supply a path at the filename prompt, and confirm or
//! decline if the interpreter asks about overwriting. Only the final
//! acknowledgment is validated; filename prompts are worded differently
//! across interpreters and are passed through untouched.

use std::path::Path;

use crate::session::Session;
use crate::{Error, Result};

/// The command that opens the save dialogue.
const SAVE_COMMAND: &str = "save";

/// Marker in a reply that the interpreter is asking before clobbering an
/// existing file ("Overwrite existing file?").
const OVERWRITE_PROMPT: &str = "Overwrite";

/// Expected prefix of a successful acknowledgment ("Ok.").
const SUCCESS_PREFIX: &str = "Ok";

impl Session {
    /// Save the game state to `path`.
    ///
    /// With `overwrite` unset, an existing target is rejected with
    /// [`Error::SaveConflict`] before any byte reaches the interpreter;
    /// the same error is returned if the interpreter itself asks to
    /// overwrite (the dialogue is declined first, leaving the child-side
    /// state unchanged).
    ///
    /// Save errors are recoverable and do not close the session.
    ///
    /// # Errors
    ///
    /// - [`Error::SaveConflict`] — the target exists and `overwrite` was
    ///   not requested.
    /// - [`Error::SaveProtocol`] — the final acknowledgment does not start
    ///   with the expected success prefix.
    /// - Any terminal session error from the underlying round trips.
    pub async fn save(&self, path: &Path, overwrite: bool) -> Result<()> {
        if !overwrite && path.exists() {
            return Err(Error::SaveConflict { path: path.to_path_buf() });
        }

        let _prompt = self.evaluate(SAVE_COMMAND).await?;
        let mut ack = self.evaluate(&path.display().to_string()).await?;

        if ack.text().contains(OVERWRITE_PROMPT) {
            if !overwrite {
                // Target appeared on the child's side only; decline and
                // report the conflict.
                self.evaluate("n").await?;
                return Err(Error::SaveConflict { path: path.to_path_buf() });
            }
            ack = self.evaluate("y").await?;
        }

        if ack.text().trim_start().starts_with(SUCCESS_PREFIX) {
            tracing::debug!(path = %path.display(), "game saved");
            Ok(())
        } else {
            Err(Error::SaveProtocol { response: ack.into_text() })
        }
    }
}
