//! Byte-range copy from a file into an async sink
//!
//! The window is validated against a length read immediately before the
//! copy, never against a value computed earlier in the request.

use super::error::FileError;
use super::metadata;
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Transfer buffer size for every copy
pub const BUFFER_SIZE: usize = 16 * 1024;

#[cfg(windows)]
const FILE_SHARE_READ: u32 = 0x0000_0001;
#[cfg(windows)]
const FILE_SHARE_WRITE: u32 = 0x0000_0002;
#[cfg(windows)]
const FILE_SHARE_DELETE: u32 = 0x0000_0004;
#[cfg(windows)]
const FILE_FLAG_SEQUENTIAL_SCAN: u32 = 0x0800_0000;

/// Copy `count` bytes (or everything up to EOF) starting at `offset`
///
/// Returns the number of bytes written to `dest`. Bytes already written are
/// not retracted when the copy fails part-way.
pub async fn send_range<W>(
    path: &Path,
    dest: &mut W,
    offset: u64,
    count: Option<u64>,
    cancel: &CancellationToken,
) -> Result<u64, FileError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let meta = metadata::resolve(path)
        .await
        .map_err(|e| FileError::io("stat", path, e))?;
    check_window(meta.length, offset, count)?;

    copy_window(path, dest, offset, count, cancel).await
}

/// Validate `[offset, offset + count)` against `length`
pub(crate) fn check_window(
    length: u64,
    offset: u64,
    count: Option<u64>,
) -> Result<(), FileError> {
    if offset > length {
        return Err(FileError::OutOfRange {
            name: "offset",
            value: offset,
        });
    }
    if let Some(count) = count {
        if count > length - offset {
            return Err(FileError::OutOfRange {
                name: "count",
                value: count,
            });
        }
    }
    Ok(())
}

/// Open, seek and stream an already validated window
pub(crate) async fn copy_window<W>(
    path: &Path,
    dest: &mut W,
    offset: u64,
    count: Option<u64>,
    cancel: &CancellationToken,
) -> Result<u64, FileError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut file = open_shared(path)
        .await
        .map_err(|e| FileError::io("open", path, e))?;

    file.seek(SeekFrom::Start(offset))
        .await
        .map_err(|e| FileError::io("seek", path, e))?;

    let copied = copy_chunks(&mut file, dest, count, cancel, path).await?;

    dest.flush()
        .await
        .map_err(|e| FileError::io("flush", path, e))?;
    Ok(copied)
}

/// Open for reading without blocking other readers or writers
async fn open_shared(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true);

    #[cfg(windows)]
    options
        .share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE)
        .custom_flags(FILE_FLAG_SEQUENTIAL_SCAN);

    options.open(path).await
}

async fn copy_chunks<W>(
    file: &mut File,
    dest: &mut W,
    count: Option<u64>,
    cancel: &CancellationToken,
    path: &Path,
) -> Result<u64, FileError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; BUFFER_SIZE];
    let mut remaining = count;
    let mut copied = 0u64;

    loop {
        let want = match remaining {
            Some(0) => break,
            #[allow(clippy::cast_possible_truncation)]
            Some(n) => n.min(BUFFER_SIZE as u64) as usize,
            None => BUFFER_SIZE,
        };

        if cancel.is_cancelled() {
            return Err(FileError::Cancelled { copied });
        }

        let read = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(FileError::Cancelled { copied }),
            r = file.read(&mut buf[..want]) => r.map_err(|e| FileError::io("read", path, e))?,
        };

        // End of file, possibly earlier than `count` if the file shrank
        if read == 0 {
            break;
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(FileError::Cancelled { copied }),
            r = dest.write_all(&buf[..read]) => r.map_err(|e| FileError::io("write", path, e))?,
        }

        copied += read as u64;
        if let Some(n) = remaining.as_mut() {
            *n -= read as u64;
        }
    }

    Ok(copied)
}
