//! File responders
//!
//! A responder writes a file result into a response sink. Two variants exist:
//! [`DefaultResponder`] trusts directory-entry metadata and suits ordinary
//! files; [`SymlinkFollowingResponder`] re-reads the true length of symbolic
//! link targets and hands everything else to its fallback.

use super::copy;
use super::error::FileError;
use super::metadata;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;

/// A file chosen by the request layer to be sent as the response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalFile {
    pub path: PathBuf,
}

impl PhysicalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn checked_path(&self) -> Result<&Path, FileError> {
        if self.path.as_os_str().is_empty() {
            return Err(FileError::InvalidArgument {
                name: "file",
                reason: "path is empty",
            });
        }
        Ok(&self.path)
    }
}

/// Parsed byte range with inclusive bounds, either of which may be open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl ByteRange {
    pub const fn new(from: Option<u64>, to: Option<u64>) -> Self {
        Self { from, to }
    }
}

/// Writes a file, or a window of it, into a response sink
pub trait FileResponder {
    /// Send `file` into `dest`
    ///
    /// `range_length` is the number of bytes the caller computed for `range`
    /// and is ignored when no range was requested. Returns bytes written.
    fn write_file<W>(
        &self,
        file: &PhysicalFile,
        dest: &mut W,
        range: Option<ByteRange>,
        range_length: u64,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<u64, FileError>> + Send
    where
        W: AsyncWrite + Unpin + Send + ?Sized;
}

/// Split a range request into a copy offset and optional count
const fn window(range: Option<ByteRange>, range_length: u64) -> (u64, Option<u64>) {
    match range {
        Some(r) => {
            let offset = match r.from {
                Some(from) => from,
                None => 0,
            };
            (offset, Some(range_length))
        }
        None => (0, None),
    }
}

/// Responder for ordinary files, validating against directory-entry length
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResponder;

impl FileResponder for DefaultResponder {
    async fn write_file<W>(
        &self,
        file: &PhysicalFile,
        dest: &mut W,
        range: Option<ByteRange>,
        range_length: u64,
        cancel: &CancellationToken,
    ) -> Result<u64, FileError>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let path = file.checked_path()?;
        if range.is_some() && range_length == 0 {
            return Ok(0);
        }

        let entry = fs::metadata(path)
            .await
            .map_err(|e| FileError::io("stat", path, e))?;
        let (offset, count) = window(range, range_length);
        copy::check_window(entry.len(), offset, count)?;

        copy::copy_window(path, dest, offset, count, cancel).await
    }
}

/// Responder that reads link targets directly and delegates other files
#[derive(Debug, Clone, Default)]
pub struct SymlinkFollowingResponder<F = DefaultResponder> {
    fallback: F,
}

impl<F: FileResponder> SymlinkFollowingResponder<F> {
    pub const fn new(fallback: F) -> Self {
        Self { fallback }
    }
}

impl<F> FileResponder for SymlinkFollowingResponder<F>
where
    F: FileResponder + Sync,
{
    async fn write_file<W>(
        &self,
        file: &PhysicalFile,
        dest: &mut W,
        range: Option<ByteRange>,
        range_length: u64,
        cancel: &CancellationToken,
    ) -> Result<u64, FileError>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let path = file.checked_path()?;
        if range.is_some() && range_length == 0 {
            return Ok(0);
        }

        // Ordinary files pay for one extra stat and nothing else
        if !metadata::is_symbolic_link(path).await {
            return self
                .fallback
                .write_file(file, dest, range, range_length, cancel)
                .await;
        }

        let (offset, count) = window(range, range_length);
        copy::send_range(path, dest, offset, count, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fallback double that counts calls instead of touching the disk
    #[derive(Default)]
    struct CountingResponder {
        calls: AtomicUsize,
    }

    impl FileResponder for CountingResponder {
        async fn write_file<W>(
            &self,
            _file: &PhysicalFile,
            _dest: &mut W,
            _range: Option<ByteRange>,
            _range_length: u64,
            _cancel: &CancellationToken,
        ) -> Result<u64, FileError>
        where
            W: AsyncWrite + Unpin + Send + ?Sized,
        {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        }
    }

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 256) as u8).collect()
    }

    #[test]
    fn test_window() {
        assert_eq!(window(None, 0), (0, None));
        assert_eq!(window(None, 99), (0, None));
        assert_eq!(window(Some(ByteRange::new(Some(10), Some(19))), 10), (10, Some(10)));
        assert_eq!(window(Some(ByteRange::new(None, Some(19))), 20), (0, Some(20)));
    }

    #[tokio::test]
    async fn test_empty_path_rejected() {
        let responder = SymlinkFollowingResponder::new(CountingResponder::default());
        let mut out = Vec::new();
        let err = responder
            .write_file(
                &PhysicalFile::new(""),
                &mut out,
                None,
                0,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::InvalidArgument { name: "file", .. }));
        assert_eq!(responder.fallback.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_length_range_opens_nothing() {
        let dir = tempfile::tempdir().unwrap();
        // Never created: any open or stat would fail
        let file = PhysicalFile::new(dir.path().join("absent.bin"));
        let responder = SymlinkFollowingResponder::new(CountingResponder::default());

        let mut out = Vec::new();
        let n = responder
            .write_file(
                &file,
                &mut out,
                Some(ByteRange::new(Some(5), Some(4))),
                0,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(n, 0);
        assert!(out.is_empty());
        assert_eq!(responder.fallback.calls.load(Ordering::SeqCst), 0);

        let n = DefaultResponder
            .write_file(
                &file,
                &mut out,
                Some(ByteRange::new(Some(0), None)),
                0,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn test_regular_file_delegates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.bin");
        std::fs::write(&path, sample(64)).unwrap();
        let responder = SymlinkFollowingResponder::new(CountingResponder::default());

        let mut out = Vec::new();
        responder
            .write_file(
                &PhysicalFile::new(&path),
                &mut out,
                None,
                0,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(responder.fallback.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_default_responder_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.bin");
        let data = sample(100);
        std::fs::write(&path, &data).unwrap();

        let mut out = Vec::new();
        let n = SymlinkFollowingResponder::new(DefaultResponder)
            .write_file(
                &PhysicalFile::new(&path),
                &mut out,
                Some(ByteRange::new(Some(50), Some(59))),
                10,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(n, 10);
        assert_eq!(out, &data[50..60]);
    }

    #[tokio::test]
    async fn test_default_responder_rejects_long_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.bin");
        std::fs::write(&path, sample(100)).unwrap();

        let mut out = Vec::new();
        let err = DefaultResponder
            .write_file(
                &PhysicalFile::new(&path),
                &mut out,
                Some(ByteRange::new(Some(95), None)),
                10,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::OutOfRange { name: "count", value: 10 }));
        assert!(out.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_bypasses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let data = sample(300);
        std::fs::write(dir.path().join("target.bin"), &data).unwrap();
        let link = dir.path().join("link.bin");
        std::os::unix::fs::symlink("target.bin", &link).unwrap();
        let responder = SymlinkFollowingResponder::new(CountingResponder::default());

        let mut out = Vec::new();
        let n = responder
            .write_file(
                &PhysicalFile::new(&link),
                &mut out,
                None,
                0,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(n, 300);
        assert_eq!(out, data);
        assert_eq!(responder.fallback.calls.load(Ordering::SeqCst), 0);

        let mut out = Vec::new();
        responder
            .write_file(
                &PhysicalFile::new(&link),
                &mut out,
                Some(ByteRange::new(Some(250), None)),
                50,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(out, &data[250..]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_range_past_target_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("target.bin"), sample(10)).unwrap();
        let link = dir.path().join("link.bin");
        std::os::unix::fs::symlink("target.bin", &link).unwrap();

        let mut out = Vec::new();
        let err = SymlinkFollowingResponder::new(DefaultResponder)
            .write_file(
                &PhysicalFile::new(&link),
                &mut out,
                Some(ByteRange::new(Some(20), None)),
                5,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(err.is_out_of_range());
    }
}
