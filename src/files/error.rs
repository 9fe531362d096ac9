//! File serving error types

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced while resolving or streaming a file
#[derive(Debug, Error)]
pub enum FileError {
    /// A required caller-supplied value is missing or empty
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        name: &'static str,
        reason: &'static str,
    },

    /// Offset or count falls outside the current file length
    #[error("`{name}` out of range: {value}")]
    OutOfRange { name: &'static str, value: u64 },

    /// Filesystem or sink failure
    #[error("failed to {op} '{}': {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The copy observed its cancellation token
    #[error("copy cancelled after {copied} bytes")]
    Cancelled { copied: u64 },
}

impl FileError {
    pub(crate) fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether the HTTP layer should answer 416 for this error
    pub const fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }
}
