//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, route matching, dispatch.

use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::routing::{self, RouteAction};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
///
/// The request body is never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: Option<SocketAddr>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();

    let mut entry = state.config.logging.access_log.then(|| {
        AccessLogEntry::from_request(
            peer_addr,
            req.method(),
            req.uri(),
            req.version(),
            req.headers(),
        )
    });

    let response = respond(&req);

    if let Some(entry) = entry.as_mut() {
        let body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        let elapsed = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        entry.finish(response.status().as_u16(), body_bytes, elapsed);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Pick the response for a request. Only GET has a handler.
fn respond<B>(req: &Request<B>) -> Response<Full<Bytes>> {
    if let Some(resp) = check_http_method(req.method()) {
        return resp;
    }

    match request_target(req) {
        Some(target) => route_request(target),
        None => http::build_404_response(),
    }
}

/// Every method other than GET is rejected with 405
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    if method == Method::GET {
        return None;
    }
    logger::log_warning(&format!("Method not allowed: {method}"));
    Some(http::build_405_response())
}

/// Path plus query as sent, e.g. "/subscribe?x=1"
///
/// Absolute-form (`http://host/subscribe`) and authority-form targets are
/// never a route path, so they have no routable target.
fn request_target<B>(req: &Request<B>) -> Option<&str> {
    let uri = req.uri();
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }
    Some(
        uri.path_and_query()
            .map_or_else(|| uri.path(), hyper::http::uri::PathAndQuery::as_str),
    )
}

/// Route request by exact target match
fn route_request(target: &str) -> Response<Full<Bytes>> {
    match routing::match_route(target, routing::ROUTES) {
        Some(route) => dispatch_route_action(&route.action),
        None => http::build_404_response(),
    }
}

fn dispatch_route_action(action: &RouteAction) -> Response<Full<Bytes>> {
    match *action {
        RouteAction::Redirect { target, code } => http::build_redirect_response(target, code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;

    fn test_state(access_log: bool) -> Arc<AppState> {
        let mut cfg = Config::load_from("does-not-exist/redirector").unwrap();
        cfg.logging.access_log = access_log;
        Arc::new(AppState::new(&cfg))
    }

    async fn send(method: Method, target: &str) -> (u16, hyper::HeaderMap, Bytes) {
        let req = Request::builder()
            .method(method)
            .uri(target)
            .body(())
            .unwrap();
        let resp = handle_request(req, test_state(false), None).await.unwrap();
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body)
    }

    #[tokio::test]
    async fn test_get_subscribe_redirects() {
        let (status, headers, body) = send(Method::GET, "/subscribe").await;
        assert_eq!(status, 302);
        assert_eq!(headers["Location"], "http://127.0.0.1:3000");
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_get_root_not_found() {
        let (status, headers, body) = send(Method::GET, "/").await;
        assert_eq!(status, 404);
        assert!(headers.get("Location").is_none());
        assert_eq!(&body[..], b"Not Found");
    }

    #[tokio::test]
    async fn test_near_misses_not_found() {
        for target in ["/SUBSCRIBE", "/Subscribe", "/subscribe/", "/subscribe?x=1", "/subscribe?"] {
            let (status, _, body) = send(Method::GET, target).await;
            assert_eq!(status, 404, "target {target}");
            assert_eq!(&body[..], b"Not Found", "target {target}");
        }
    }

    #[tokio::test]
    async fn test_non_get_methods_rejected() {
        for method in [Method::POST, Method::HEAD, Method::PUT, Method::DELETE, Method::OPTIONS] {
            let (status, headers, _) = send(method.clone(), "/subscribe").await;
            assert_eq!(status, 405, "method {method}");
            assert_eq!(headers["Allow"], "GET");
        }
        let (status, _, body) = send(Method::POST, "/").await;
        assert_eq!(status, 405);
        assert_eq!(&body[..], b"Method Not Allowed");
    }

    #[tokio::test]
    async fn test_repeated_requests_are_identical() {
        let first = send(Method::GET, "/subscribe").await;
        let second = send(Method::GET, "/subscribe").await;
        assert_eq!(first.0, second.0);
        assert_eq!(first.1["Location"], second.1["Location"]);
    }

    #[tokio::test]
    async fn test_access_log_does_not_change_response() {
        let req = Request::builder().uri("/subscribe").body(()).unwrap();
        let peer = Some("127.0.0.1:40000".parse().unwrap());
        let resp = handle_request(req, test_state(true), peer).await.unwrap();
        assert_eq!(resp.status(), 302);
    }

    #[test]
    fn test_request_target_keeps_query() {
        let req = Request::builder().uri("/subscribe?x=1").body(()).unwrap();
        assert_eq!(request_target(&req), Some("/subscribe?x=1"));
    }

    #[test]
    fn test_request_target_rejects_absolute_form() {
        let req = Request::builder().uri("http://host:8080/subscribe").body(()).unwrap();
        assert_eq!(request_target(&req), None);
    }

    #[tokio::test]
    async fn test_absolute_form_not_found() {
        for target in ["http://evil/subscribe", "http://x:8080/subscribe"] {
            let (status, headers, body) = send(Method::GET, target).await;
            assert_eq!(status, 404, "target {target}");
            assert!(headers.get("Location").is_none());
            assert_eq!(&body[..], b"Not Found");
        }
    }

    // The uri parser discards fragments, so "#frag" never reaches routing.
    // Clients do not send fragments; this pins the behavior.
    #[tokio::test]
    async fn test_fragment_is_not_part_of_target() {
        let (status, _, _) = send(Method::GET, "/subscribe#frag").await;
        assert_eq!(status, 302);
    }
}
