//! Static file fallback.
//!
//! Requests that match no route are offered to a static collaborator before
//! the router answers 404.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Uri};
use axum::response::Response;
use std::path::PathBuf;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::dispatch::path::{encode_path, strip_mount};

/// Serves requests no route matched.
///
/// `None` means the collaborator does not handle `path`.
#[async_trait]
pub trait StaticFallback: Send + Sync {
    async fn serve(&self, request: Request<Body>, path: &str) -> Option<Response>;
}

/// Files served from a directory under a URL prefix.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    prefix: String,
    service: ServeDir,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            service: ServeDir::new(root.into()),
        }
    }
}

#[async_trait]
impl StaticFallback for StaticFiles {
    async fn serve(&self, request: Request<Body>, path: &str) -> Option<Response> {
        let relative = strip_mount(path, &self.prefix)?;

        let (mut parts, body) = request.into_parts();
        parts.uri = Uri::try_from(encode_path(relative)).ok()?;
        let request = Request::from_parts(parts, body);

        match self.service.clone().oneshot(request).await {
            Ok(response) => Some(response.map(Body::new)),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Static file lookup failed");
                None
            }
        }
    }
}
