//! Standard responses produced by the router itself.
//!
//! # Responsibilities
//! - Status responses whose body is the canonical reason phrase
//! - Normalization redirects
//! - Body stripping for HEAD
//!
//! # Design Decisions
//! - Handler responses are returned verbatim; only HEAD bodies are dropped
//! - Router-generated bodies are plain text

use axum::body::Body;
use axum::http::header::{ALLOW, CONTENT_TYPE, LOCATION};
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;

use crate::handler::SUPPORTED_METHODS;

/// A response whose body is the status' reason phrase (e.g. `Not Found`).
pub fn status_response(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or_default();
    let mut response = Response::new(Body::from(reason));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

pub fn not_found() -> Response {
    status_response(StatusCode::NOT_FOUND)
}

/// 405 listing the methods the router accepts.
pub fn method_not_allowed() -> Response {
    let allow = SUPPORTED_METHODS
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let mut response = status_response(StatusCode::METHOD_NOT_ALLOWED);
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

/// 301 to `location`.
pub fn moved_permanently(location: &str) -> Response {
    let mut response = status_response(StatusCode::MOVED_PERMANENTLY);
    match HeaderValue::from_str(location) {
        Ok(value) => {
            response.headers_mut().insert(LOCATION, value);
            response
        }
        Err(_) => status_response(StatusCode::BAD_REQUEST),
    }
}

/// Drop the body of a response, keeping status and headers.
pub fn strip_body(response: Response) -> Response {
    let (parts, _) = response.into_parts();
    Response::from_parts(parts, Body::empty())
}
