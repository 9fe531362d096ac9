//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation, route matching, and dispatching.

use crate::config::{AppState, RouteHandler, RoutesConfig};
use crate::handler::static_files;
use crate::http::{self, ResponseBody};
use crate::logger;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub range_header: Option<String>,
    pub access_log: bool,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<ResponseBody>, Infallible> {
    let method = req.method();
    let uri = req.uri();
    let is_head = *method == Method::HEAD;

    let access_log = state.access_log();
    if access_log {
        logger::log_request(method, uri, req.version());
    }

    // 1. Check HTTP method
    if let Some(resp) = check_http_method(method, state.config.http.enable_cors) {
        return Ok(resp);
    }

    // 2. Check body size
    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        return Ok(resp);
    }

    // 3. Extract headers for range requests
    let ctx = RequestContext {
        path: uri.path(),
        is_head,
        range_header: req
            .headers()
            .get("range")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string),
        access_log,
    };

    let mut response = route_request(&ctx, &state.config.routes, &state).await;
    if let Ok(name) = state.config.http.server_name.parse() {
        response.headers_mut().insert("Server", name);
    }
    Ok(response)
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<ResponseBody>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<ResponseBody>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Find the route for a path: exact match first, then the longest prefix
pub fn find_route<'r>(routes: &'r RoutesConfig, path: &str) -> Option<(&'r str, &'r RouteHandler)> {
    if let Some((prefix, handler)) = routes.custom_routes.get_key_value(path) {
        return Some((prefix.as_str(), handler));
    }

    routes
        .custom_routes
        .iter()
        .filter(|(prefix, _)| prefix_matches(prefix, path))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(prefix, handler)| (prefix.as_str(), handler))
}

/// Whether `prefix` covers `path` on a segment boundary
fn prefix_matches(prefix: &str, path: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || prefix.ends_with('/') || rest.starts_with('/'))
}

/// Route request based on path and configuration
async fn route_request(
    ctx: &RequestContext<'_>,
    routes: &RoutesConfig,
    state: &Arc<AppState>,
) -> Response<ResponseBody> {
    let Some((prefix, handler)) = find_route(routes, ctx.path) else {
        return http::build_404_response();
    };

    match handler {
        RouteHandler::Dir { path: dir } => {
            static_files::serve_directory(ctx, dir, prefix, &routes.index_files, state).await
        }
        RouteHandler::File { path: file_path } => {
            static_files::serve_file(ctx, file_path, state).await
        }
        RouteHandler::Redirect { target } => http::build_redirect_response(target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;

    fn state_with_routes(routes: &[(&str, RouteHandler)]) -> Arc<AppState> {
        let mut cfg = Config::load_from("/nonexistent/linkserve-test").unwrap();
        cfg.logging.access_log = false;
        for (prefix, handler) in routes {
            cfg.routes
                .custom_routes
                .insert((*prefix).to_string(), handler.clone());
        }
        Arc::new(AppState::new(&cfg))
    }

    fn get(path: &str) -> hyper::http::request::Builder {
        Request::builder().method(Method::GET).uri(path)
    }

    #[test]
    fn test_find_route_prefers_exact_then_longest() {
        let mut routes = RoutesConfig::default();
        let media = RouteHandler::Dir { path: "/srv/media".into() };
        let films = RouteHandler::Dir { path: "/srv/films".into() };
        let latest = RouteHandler::File { path: "/srv/latest.mkv".into() };
        routes.custom_routes.insert("/media".into(), media.clone());
        routes.custom_routes.insert("/media/films".into(), films.clone());
        routes.custom_routes.insert("/latest".into(), latest.clone());

        assert_eq!(find_route(&routes, "/latest"), Some(("/latest", &latest)));
        assert_eq!(find_route(&routes, "/media/a.mkv"), Some(("/media", &media)));
        assert_eq!(
            find_route(&routes, "/media/films/b.mkv"),
            Some(("/media/films", &films))
        );
        assert_eq!(find_route(&routes, "/other"), None);
    }

    #[test]
    fn test_find_route_stops_at_segment_boundary() {
        let mut routes = RoutesConfig::default();
        let media = RouteHandler::Dir { path: "/srv/media".into() };
        let root = RouteHandler::Dir { path: "/srv/www".into() };
        routes.custom_routes.insert("/media".into(), media.clone());

        assert_eq!(find_route(&routes, "/mediafoo"), None);
        assert_eq!(find_route(&routes, "/media-old/a.mkv"), None);
        assert_eq!(find_route(&routes, "/media/"), Some(("/media", &media)));

        routes.custom_routes.insert("/".into(), root.clone());
        assert_eq!(find_route(&routes, "/mediafoo"), Some(("/", &root)));
        assert_eq!(find_route(&routes, "/media/a.mkv"), Some(("/media", &media)));
    }

    #[tokio::test]
    async fn test_sibling_of_dir_route_is_404() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("foo"), b"sibling").unwrap();
        let state = state_with_routes(&[(
            "/media",
            RouteHandler::Dir {
                path: dir.path().to_str().unwrap().to_string(),
            },
        )]);

        let resp = handle_request(get("/mediafoo").body(()).unwrap(), Arc::clone(&state))
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        let resp = handle_request(get("/media/foo").body(()).unwrap(), state)
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let state = state_with_routes(&[]);
        let req = Request::builder()
            .method(Method::POST)
            .uri("/x")
            .body(())
            .unwrap();
        let resp = handle_request(req, state).await.unwrap();
        assert_eq!(resp.status(), 405);
    }

    #[tokio::test]
    async fn test_body_too_large() {
        let state = state_with_routes(&[]);
        let req = get("/x")
            .header("content-length", "99999999999")
            .body(())
            .unwrap();
        let resp = handle_request(req, state).await.unwrap();
        assert_eq!(resp.status(), 413);
    }

    #[tokio::test]
    async fn test_unrouted_is_404() {
        let resp = handle_request(get("/x").body(()).unwrap(), state_with_routes(&[]))
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_file_route_with_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.flac");
        std::fs::write(&path, b"0123456789").unwrap();
        let state = state_with_routes(&[(
            "/song",
            RouteHandler::File {
                path: path.to_str().unwrap().to_string(),
            },
        )]);

        let req = get("/song").header("range", "bytes=2-5").body(()).unwrap();
        let resp = handle_request(req, state).await.unwrap();
        assert_eq!(resp.status(), 206);
        assert_eq!(resp.headers()["Server"], "linkserve/0.1");
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"2345");
    }

    #[tokio::test]
    async fn test_redirect_route() {
        let state = state_with_routes(&[(
            "/old",
            RouteHandler::Redirect {
                target: "/new".into(),
            },
        )]);
        let resp = handle_request(get("/old").body(()).unwrap(), state)
            .await
            .unwrap();
        assert_eq!(resp.status(), 302);
        assert_eq!(resp.headers()["Location"], "/new");
    }
}
