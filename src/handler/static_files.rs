//! Static file serving module
//!
//! Maps routes to files on disk, answers with headers derived from resolved
//! metadata and streams the body through a file responder.

use crate::config::AppState;
use crate::files::{
    self, DefaultResponder, FileResponder, PhysicalFile, SymlinkFollowingResponder,
};
use crate::handler::router::RequestContext;
use crate::http::{self, body, mime, range::RangeParseResult, range::RangeSpec, ResponseBody};
use crate::http::response::{build_file_response, build_partial_response, FileHeaders};
use crate::logger;
use hyper::Response;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Capacity of the pipe between the copy task and the response body
const PIPE_CAPACITY: usize = 4 * files::BUFFER_SIZE;

/// Serve static files from a directory
pub async fn serve_directory(
    ctx: &RequestContext<'_>,
    dir: &str,
    route_prefix: &str,
    index_files: &[String],
    state: &Arc<AppState>,
) -> Response<ResponseBody> {
    match locate_in_directory(dir, ctx.path, route_prefix, index_files) {
        Some(path) => send_file(ctx, path, state).await,
        None => http::build_404_response(),
    }
}

/// Serve a single file
pub async fn serve_file(
    ctx: &RequestContext<'_>,
    file_path: &str,
    state: &Arc<AppState>,
) -> Response<ResponseBody> {
    send_file(ctx, PathBuf::from(file_path), state).await
}

/// Map a request path to a file under `static_dir`, with index file support
///
/// Symbolic links are allowed as long as they resolve inside `static_dir`.
pub fn locate_in_directory(
    static_dir: &str,
    path: &str,
    route_prefix: &str,
    index_files: &[String],
) -> Option<PathBuf> {
    let clean_path = path.trim_start_matches('/');
    if clean_path.split('/').any(|segment| segment == "..") {
        logger::log_warning(&format!("Path traversal attempt blocked: {path}"));
        return None;
    }

    // The prefix only matches on a segment boundary
    let prefix_clean = route_prefix.trim_matches('/');
    let relative_path = if prefix_clean.is_empty() {
        clean_path
    } else if clean_path == prefix_clean {
        ""
    } else {
        clean_path
            .strip_prefix(prefix_clean)?
            .strip_prefix('/')?
            .trim_start_matches('/')
    };

    let mut file_path = Path::new(static_dir).join(relative_path);

    let static_dir_canonical = match Path::new(static_dir).canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{static_dir}': {e}"
            ));
            return None;
        }
    };

    if file_path.is_dir() {
        file_path = index_files
            .iter()
            .map(|index| file_path.join(index))
            .find(|candidate| candidate.is_file())?;
    }

    // File not found is common (404), no need to log at warning level
    let file_path_canonical = file_path.canonicalize().ok()?;
    if !file_path_canonical.starts_with(&static_dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_path_canonical.display()
        ));
        return None;
    }

    // Keep the link path itself so the responder can see it is a link
    Some(file_path)
}

/// Answer with the whole file or the requested window of it
pub async fn send_file(
    ctx: &RequestContext<'_>,
    path: PathBuf,
    state: &Arc<AppState>,
) -> Response<ResponseBody> {
    let meta = match files::resolve(&path).await {
        Ok(m) if m.exists => m,
        Ok(_) => return http::build_404_response(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            logger::log_warning(&format!("Dangling link '{}': {e}", path.display()));
            return http::build_404_response();
        }
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read metadata for '{}': {e}",
                path.display()
            ));
            return http::build_500_response();
        }
    };

    let headers = FileHeaders {
        content_type: mime::content_type_for(&path),
        total_size: meta.length,
        last_modified: meta.last_modified,
    };

    let range = match http::parse_range_header(ctx.range_header.as_deref(), meta.length) {
        RangeParseResult::Valid(r) => Some(r),
        RangeParseResult::NotSatisfiable => return http::build_416_response(meta.length),
        RangeParseResult::None => None,
    };

    let (status, sent) = range.map_or((200, meta.length), |r| (206, r.length()));
    if ctx.access_log {
        logger::log_file_response(status, &path, sent);
    }

    let body = if ctx.is_head {
        body::empty()
    } else {
        spawn_transfer(
            PhysicalFile::new(path),
            range,
            state.config.files.follow_symlinks,
            state.copy_token(),
            ctx.access_log,
        )
    };

    match range {
        Some(r) => build_partial_response(&headers, r.start, r.end, body),
        None => build_file_response(&headers, body),
    }
}

/// Run the copy on its own task and return the read side as the body
///
/// The copy ends with a write error if the client goes away, or with a
/// cancellation if the server shuts down.
fn spawn_transfer(
    file: PhysicalFile,
    range: Option<RangeSpec>,
    follow_symlinks: bool,
    cancel: CancellationToken,
    access_log: bool,
) -> ResponseBody {
    let (reader, mut writer) = tokio::io::duplex(PIPE_CAPACITY);

    tokio::spawn(async move {
        let byte_range = range.map(RangeSpec::to_byte_range);
        let range_length = range.map_or(0, |r| r.length());

        let result = if follow_symlinks {
            SymlinkFollowingResponder::new(DefaultResponder)
                .write_file(&file, &mut writer, byte_range, range_length, &cancel)
                .await
        } else {
            DefaultResponder
                .write_file(&file, &mut writer, byte_range, range_length, &cancel)
                .await
        };

        match result {
            Ok(bytes) if access_log => logger::log_transfer_complete(&file.path, bytes),
            Ok(_) => {}
            // Headers were already sent with the earlier length
            Err(e) if e.is_out_of_range() => logger::log_warning(&format!(
                "'{}' changed size during the request: {e}",
                file.path.display()
            )),
            Err(e) => logger::log_transfer_failed(&file.path, &e),
        }
    });

    body::streaming(reader)
}
