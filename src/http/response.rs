//! HTTP response building module
//!
//! Builders for every status the server emits, decoupled from routing.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

pub const NOT_FOUND_BODY: &str = "Not Found";
pub const METHOD_NOT_ALLOWED_BODY: &str = "Method Not Allowed";

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(404)
        .body(Full::new(Bytes::from_static(NOT_FOUND_BODY.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::from_static(NOT_FOUND_BODY.as_bytes())))
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Allow", "GET")
        .body(Full::new(Bytes::from_static(
            METHOD_NOT_ALLOWED_BODY.as_bytes(),
        )))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from_static(
                METHOD_NOT_ALLOWED_BODY.as_bytes(),
            )))
        })
}

/// Build redirect response (302, 301, ...) with an empty body
pub fn build_redirect_response(target: &str, code: u16) -> Response<Full<Bytes>> {
    Response::builder()
        .status(code)
        .header("Location", target)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error(&code.to_string(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
