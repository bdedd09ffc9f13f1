use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the pseudoterminal channel.
#[derive(Debug, Error)]
pub enum PtyError {
    /// The OS could not hand out a master/slave pair.
    #[error("No pseudoterminal available: {reason}")]
    Allocation { reason: String },

    /// The slave side could not be opened or switched to raw mode.
    #[error("Failed to put '{path}' into raw mode: {source}")]
    RawMode {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Launching a process on the slave side failed.
    #[error("Failed to spawn '{command}' on the pseudoterminal: {reason}")]
    Spawn { command: String, reason: String },

    /// The channel was used after `close()`.
    #[error("Pseudoterminal channel is already closed")]
    Closed,

    #[error("Pseudoterminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}
