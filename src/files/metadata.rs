//! File metadata resolution
//!
//! Directory-entry attributes of a symbolic link describe the link node, not
//! the file it points to. Lengths for links are therefore read from an open
//! handle on the target; everything else comes straight from the entry.

use chrono::{DateTime, Utc};
use std::io;
use std::path::Path;
use tokio::fs;

/// Snapshot of a file's metadata, built fresh on every query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    /// Whether the path resolves to a file
    pub exists: bool,
    /// Content length in bytes (the target's length for a symbolic link)
    pub length: u64,
    /// Modification time of the directory entry itself
    pub last_modified: DateTime<Utc>,
}

impl FileMetadata {
    const fn missing() -> Self {
        Self {
            exists: false,
            length: 0,
            last_modified: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// Resolve authoritative metadata for `path`
///
/// A missing entry is reported through `exists` rather than as an error, as
/// is anything that does not resolve to a regular file. For a symbolic link the target is opened once to
/// read its length; a failure to reach it (dangling link, permissions) is
/// returned.
pub async fn resolve(path: &Path) -> io::Result<FileMetadata> {
    let entry = match fs::symlink_metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(FileMetadata::missing()),
        Err(e) => return Err(e),
    };

    let last_modified = entry
        .modified()
        .map_or(DateTime::<Utc>::UNIX_EPOCH, DateTime::<Utc>::from);

    let not_a_file = FileMetadata {
        last_modified,
        ..FileMetadata::missing()
    };

    if !entry.file_type().is_symlink() {
        if !entry.is_file() {
            return Ok(not_a_file);
        }
        return Ok(FileMetadata {
            exists: true,
            length: entry.len(),
            last_modified,
        });
    }

    // Opening a FIFO would block until a writer shows up
    if !fs::metadata(path).await?.is_file() {
        return Ok(not_a_file);
    }

    let target = fs::File::open(path).await?.metadata().await?;
    if !target.is_file() {
        return Ok(not_a_file);
    }
    Ok(FileMetadata {
        exists: true,
        length: target.len(),
        last_modified,
    })
}

/// Check whether `path` is itself a symbolic link, without following it
pub async fn is_symbolic_link(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .await
        .is_ok_and(|m| m.file_type().is_symlink())
}
