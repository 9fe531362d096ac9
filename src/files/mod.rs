//! File sending module
//!
//! Resolves trustworthy file metadata (following symbolic links to their
//! targets) and streams exact byte windows of a file into an async sink.
//! Nothing here logs; every failure is returned to the caller.

mod copy;
mod error;
mod metadata;
mod responder;

pub use copy::{send_range, BUFFER_SIZE};
pub use error::FileError;
pub use metadata::{is_symbolic_link, resolve, FileMetadata};
pub use responder::{
    ByteRange, DefaultResponder, FileResponder, PhysicalFile, SymlinkFollowingResponder,
};
