//! Per-request entry point.
//!
//! # Data Flow
//! ```text
//! Request
//!     → method check (405)        → URL length check (414)
//!     → percent-decode (400)      → normalize (301 if changed)
//!     → strip mount prefix        → lookup cache / trie
//!     → handler cache / loader    → handler(request, params)
//!     → static fallback           → 404
//! ```

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use std::time::Instant;

use crate::dispatch::path::{encode_path, normalize, percent_decode, strip_mount};
use crate::dispatch::router::FsRouter;
use crate::handler::is_supported;
use crate::http::request::RequestIdExt;
use crate::http::response::{
    method_not_allowed, moved_permanently, not_found, status_response, strip_body,
};
use crate::observability::metrics;

/// Longest request target accepted, in bytes.
pub const MAX_URL_LENGTH: usize = 8192;

impl FsRouter {
    /// Route one request and produce its response. Never fails: every
    /// problem maps to a status response.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().clone();

        let response = self.dispatch(request).await;

        metrics::record_request(method.as_str(), response.status().as_u16(), start);
        response
    }

    async fn dispatch(&self, mut request: Request<Body>) -> Response {
        let method = request.method().clone();
        if !is_supported(&method) {
            return method_not_allowed();
        }

        let target_len = request
            .uri()
            .path_and_query()
            .map_or(0, |target| target.as_str().len());
        if target_len > MAX_URL_LENGTH {
            return status_response(StatusCode::URI_TOO_LONG);
        }

        let Some(decoded) = percent_decode(request.uri().path()) else {
            return status_response(StatusCode::BAD_REQUEST);
        };
        let path = normalize(&decoded);
        if path != decoded {
            let mut location = encode_path(&path);
            if let Some(query) = request.uri().query() {
                location.push('?');
                location.push_str(query);
            }
            tracing::debug!(request_id = %request.request_id(), from = %decoded, to = %location, "Redirecting to normalized path");
            return moved_permanently(&location);
        }

        if let Some(route_path) = strip_mount(&path, &self.settings().prefix) {
            let generation = self.generation();
            let found = match generation
                .resolve(self.loader.as_ref(), route_path, &method)
                .await
            {
                Ok(found) => found,
                Err(e) => {
                    tracing::error!(request_id = %request.request_id(), path = %path, error = %e, "Route table is inconsistent");
                    return status_response(StatusCode::INTERNAL_SERVER_ERROR);
                }
            };

            if let Some(found) = found {
                if let Some(handler) = generation
                    .handler(self.loader.as_ref(), &found.target, &method)
                    .await
                {
                    tracing::debug!(
                        request_id = %request.request_id(),
                        method = %method,
                        path = %path,
                        file = %found.target,
                        "Dispatching to route"
                    );
                    request.extensions_mut().insert(found.params.clone());
                    let response = handler(request, found.params).await;
                    return if method == Method::HEAD {
                        strip_body(response)
                    } else {
                        response
                    };
                }
            }
        }

        if let Some(fallback) = &self.fallback {
            if let Some(response) = fallback.serve(request, &path).await {
                return response;
            }
        }

        not_found()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutesConfig;
    use crate::dispatch::static_files::StaticFiles;
    use crate::handler::{handler, ModuleLoader, RegistryLoader, RouteModule};
    use crate::routing::Params;
    use axum::body::to_bytes;
    use axum::http::header::{ALLOW, LOCATION};
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn echo(label: &'static str) -> RouteModule {
        RouteModule::new().get(handler(move |_: Request<Body>, params: Params| async move {
            format!("{label} {}", serde_json::to_string(&params).unwrap())
        }))
    }

    async fn router_with(
        dir: &TempDir,
        files: &[&str],
        loader: RegistryLoader,
        prefix: &str,
    ) -> FsRouter {
        for file in files {
            touch(dir.path(), file);
        }
        let settings = RoutesConfig {
            root: dir.path().to_path_buf(),
            prefix: prefix.to_string(),
            extensions: vec!["rs".to_string()],
            ..RoutesConfig::default()
        };
        let loader: Arc<dyn ModuleLoader> = Arc::new(loader);
        FsRouter::new(settings, loader).await.unwrap()
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(router: &FsRouter, method: Method, uri: &str) -> (StatusCode, String) {
        let response = router.handle(request(method, uri)).await;
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_end_to_end_under_prefix() {
        let dir = TempDir::new().unwrap();
        let loader = RegistryLoader::new()
            .register("index.rs", echo("index"))
            .register("users/[id].rs", echo("user"));
        let router = router_with(&dir, &["index.rs", "users/[id].rs"], loader, "/api").await;

        assert_eq!(
            send(&router, Method::GET, "/api/").await,
            (StatusCode::OK, "index {}".to_string())
        );
        assert_eq!(
            send(&router, Method::GET, "/api/users/7").await,
            (StatusCode::OK, r#"user {"id":"7"}"#.to_string())
        );
        assert_eq!(
            send(&router, Method::POST, "/api/users/7").await,
            (StatusCode::NOT_FOUND, "Not Found".to_string())
        );
        assert_eq!(send(&router, Method::GET, "/users/7").await.0, StatusCode::NOT_FOUND);

        let response = router.handle(request(Method::OPTIONS, "/api/")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().contains_key(ALLOW));
    }

    #[tokio::test]
    async fn test_catch_all_and_groups() {
        let dir = TempDir::new().unwrap();
        let loader = RegistryLoader::new()
            .register("(site)/docs/[[...slug]].rs", echo("docs"))
            .register("files/[...path].rs", echo("files"));
        let router = router_with(
            &dir,
            &["(site)/docs/[[...slug]].rs", "files/[...path].rs"],
            loader,
            "",
        )
        .await;

        assert_eq!(
            send(&router, Method::GET, "/docs").await.1,
            r#"docs {"slug":[]}"#
        );
        assert_eq!(
            send(&router, Method::GET, "/docs/a/b").await.1,
            r#"docs {"slug":["a","b"]}"#
        );
        assert_eq!(
            send(&router, Method::GET, "/files/x/y.txt").await.1,
            r#"files {"path":["x","y.txt"]}"#
        );
        assert_eq!(send(&router, Method::GET, "/files").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_head_uses_get_without_body() {
        let dir = TempDir::new().unwrap();
        let loader = RegistryLoader::new().register("index.rs", echo("index"));
        let router = router_with(&dir, &["index.rs"], loader, "").await;

        assert_eq!(
            send(&router, Method::HEAD, "/").await,
            (StatusCode::OK, String::new())
        );
    }

    #[tokio::test]
    async fn test_params_reach_request_extensions() {
        let dir = TempDir::new().unwrap();
        let module = RouteModule::new().get(handler(|request: Request<Body>, _: Params| async move {
            let params = request.extensions().get::<Params>().cloned().unwrap_or_default();
            params.get("id").unwrap_or("none").to_string()
        }));
        let loader = RegistryLoader::new().register("[id].rs", module);
        let router = router_with(&dir, &["[id].rs"], loader, "").await;

        assert_eq!(send(&router, Method::GET, "/42").await.1, "42");
    }

    #[tokio::test]
    async fn test_url_too_long() {
        let dir = TempDir::new().unwrap();
        let loader = RegistryLoader::new().register("[id].rs", echo("id"));
        let router = router_with(&dir, &["[id].rs"], loader, "").await;

        let long = format!("/{}", "a".repeat(MAX_URL_LENGTH));
        assert_eq!(send(&router, Method::GET, &long).await.0, StatusCode::URI_TOO_LONG);
        let fits = format!("/{}", "a".repeat(MAX_URL_LENGTH - 1));
        assert_eq!(send(&router, Method::GET, &fits).await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_url_length_ignores_scheme_and_authority() {
        let dir = TempDir::new().unwrap();
        let loader = RegistryLoader::new().register("[id].rs", echo("id"));
        let router = router_with(&dir, &["[id].rs"], loader, "").await;

        let fits = format!("http://example.com/{}", "a".repeat(MAX_URL_LENGTH - 1));
        assert_eq!(send(&router, Method::GET, &fits).await.0, StatusCode::OK);
        let long = format!("http://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert_eq!(send(&router, Method::GET, &long).await.0, StatusCode::URI_TOO_LONG);
    }

    #[tokio::test]
    async fn test_head_without_get_export_is_not_found() {
        let dir = TempDir::new().unwrap();
        let submit = RouteModule::new().post(handler(|_: Request<Body>, _: Params| async move {
            "submitted"
        }));
        let loader = RegistryLoader::new().register("submit.rs", submit);
        let router = router_with(&dir, &["submit.rs"], loader, "").await;

        assert_eq!(
            send(&router, Method::HEAD, "/submit").await,
            (StatusCode::NOT_FOUND, "Not Found".to_string())
        );
        assert_eq!(
            send(&router, Method::GET, "/submit").await,
            (StatusCode::NOT_FOUND, "Not Found".to_string())
        );
        assert_eq!(
            send(&router, Method::POST, "/submit").await,
            (StatusCode::OK, "submitted".to_string())
        );
    }

    #[tokio::test]
    async fn test_normalization_redirects() {
        let dir = TempDir::new().unwrap();
        let router = router_with(&dir, &[], RegistryLoader::new(), "").await;

        let response = router.handle(request(Method::GET, "/a//b/../c?x=1")).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[LOCATION], "/a/c?x=1");

        let response = router.handle(request(Method::GET, "/a/%2E%2E/b%20c/")).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[LOCATION], "/b%20c/");
    }

    #[tokio::test]
    async fn test_bad_escape_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let router = router_with(&dir, &[], RegistryLoader::new(), "").await;
        assert_eq!(send(&router, Method::GET, "/a%zz").await.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_literal_marker_segments_do_not_match() {
        let dir = TempDir::new().unwrap();
        let loader = RegistryLoader::new().register("[id].rs", echo("id"));
        let router = router_with(&dir, &["[id].rs"], loader, "").await;

        assert_eq!(send(&router, Method::GET, "/%5B%5D").await.1, r#"id {"id":"[]"}"#);
    }

    #[tokio::test]
    async fn test_reload_removes_cached_route() {
        let dir = TempDir::new().unwrap();
        let loader = RegistryLoader::new().register("gone.rs", echo("gone"));
        let router = router_with(&dir, &["gone.rs"], loader, "").await;

        assert_eq!(send(&router, Method::GET, "/gone").await.0, StatusCode::OK);
        fs::remove_file(dir.path().join("gone.rs")).unwrap();
        router.reload().await.unwrap();
        assert_eq!(send(&router, Method::GET, "/gone").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unregistered_file_falls_through() {
        let dir = TempDir::new().unwrap();
        let loader = RegistryLoader::new().register("[id].rs", echo("dynamic"));
        let router = router_with(&dir, &["about.rs", "[id].rs"], loader, "").await;

        // "about.rs" exports nothing, so the slug route answers instead.
        assert_eq!(
            send(&router, Method::GET, "/about").await.1,
            r#"dynamic {"id":"about"}"#
        );
    }

    #[tokio::test]
    async fn test_static_fallback() {
        let dir = TempDir::new().unwrap();
        let public = TempDir::new().unwrap();
        fs::write(public.path().join("robots.txt"), "User-agent: *").unwrap();

        let loader = RegistryLoader::new().register("index.rs", echo("index"));
        let router = router_with(&dir, &["index.rs"], loader, "")
            .await
            .with_static_files(Arc::new(StaticFiles::new(public.path(), "")));

        assert_eq!(
            send(&router, Method::GET, "/robots.txt").await,
            (StatusCode::OK, "User-agent: *".to_string())
        );
        assert_eq!(send(&router, Method::GET, "/").await.1, "index {}");
        assert_eq!(send(&router, Method::GET, "/missing").await.0, StatusCode::NOT_FOUND);
    }
}
