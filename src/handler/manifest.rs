//! Declarative route files.
//!
//! A manifest is a TOML file whose top-level tables are named after the HTTP
//! methods it exports:
//!
//! ```toml
//! [GET]
//! status = 200
//! content_type = "application/json"
//! body = '{"user": "{id}"}'
//!
//! [GET.headers]
//! cache-control = "no-store"
//! ```
//!
//! `{name}` in the body or a header value is replaced by the bound parameter
//! (catch-all segments joined with `/`); `{params}` renders all parameters as JSON.
//! The file is read on every load, so edits take effect once caches are cleared.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::LoadError;
use crate::handler::{handler, is_supported, ModuleLoader, RouteModule};
use crate::routing::{Params, RouteFile};

const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// One exported method as written in the manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestExport {
    #[serde(default = "default_status")]
    status: u16,

    #[serde(default)]
    headers: BTreeMap<String, String>,

    #[serde(default)]
    body: String,

    content_type: Option<String>,
}

fn default_status() -> u16 {
    200
}

/// A validated export, ready to answer requests.
#[derive(Debug)]
struct StaticReply {
    status: StatusCode,
    content_type: String,
    headers: Vec<(HeaderName, String)>,
    body: String,
}

impl StaticReply {
    fn render(&self, params: &Params) -> Response {
        let mut response = (self.status, render_template(&self.body, params)).into_response();
        let headers = response.headers_mut();

        match HeaderValue::from_str(&render_template(&self.content_type, params)) {
            Ok(value) => {
                headers.insert(CONTENT_TYPE, value);
            }
            Err(_) => tracing::warn!(content_type = %self.content_type, "Invalid content type in route manifest"),
        }
        for (name, template) in &self.headers {
            match HeaderValue::from_str(&render_template(template, params)) {
                Ok(value) => {
                    headers.insert(name.clone(), value);
                }
                Err(_) => tracing::warn!(header = %name, "Skipping invalid header value in route manifest"),
            }
        }
        response
    }
}

/// Loader that reads TOML route manifests from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestLoader;

impl ManifestLoader {
    pub fn new() -> Self {
        Self
    }

    /// Parse manifest text into a route module.
    pub fn parse(file: &RouteFile, text: &str) -> Result<RouteModule, LoadError> {
        let invalid = |reason: String| LoadError::Manifest {
            file: file.to_string(),
            reason,
        };

        let exports: BTreeMap<String, ManifestExport> =
            toml::from_str(text).map_err(|e| invalid(e.to_string()))?;

        let mut module = RouteModule::new();
        for (name, export) in exports {
            let method = Method::from_bytes(name.as_bytes())
                .ok()
                .filter(is_supported)
                .ok_or_else(|| invalid(format!("'{name}' is not a supported method")))?;

            let status = StatusCode::from_u16(export.status)
                .map_err(|_| invalid(format!("invalid status {} for {name}", export.status)))?;

            let headers = export
                .headers
                .into_iter()
                .map(|(header, value)| {
                    HeaderName::from_bytes(header.as_bytes())
                        .map(|header| (header, value))
                        .map_err(|_| invalid(format!("invalid header name '{header}'")))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let reply = Arc::new(StaticReply {
                status,
                content_type: export
                    .content_type
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
                headers,
                body: export.body,
            });

            module = module.with(
                method,
                handler(move |_request: Request<Body>, params: Params| {
                    let reply = Arc::clone(&reply);
                    async move { reply.render(&params) }
                }),
            );
        }
        Ok(module)
    }
}

#[async_trait]
impl ModuleLoader for ManifestLoader {
    async fn load(&self, file: &RouteFile) -> Result<Option<Arc<RouteModule>>, LoadError> {
        let text = tokio::fs::read_to_string(file.path())
            .await
            .map_err(|source| LoadError::Io {
                file: file.to_string(),
                source,
            })?;
        let module = Self::parse(file, &text)?;
        tracing::debug!(file = %file, module = ?module, "Loaded route manifest");
        Ok(Some(Arc::new(module)))
    }
}

/// Substitute `{name}` placeholders with parameter values.
///
/// Placeholders are found in the template only; inserted values are never
/// scanned again, so request-derived text cannot expand further.
fn render_template(template: &str, params: &Params) -> String {
    if !template.contains('{') {
        return template.to_string();
    }
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let name = after.find('}').map(|close| &after[..close]);
        match name.filter(|name| is_placeholder(name)) {
            Some(name) => {
                match placeholder_value(name, params) {
                    Some(value) => rendered.push_str(&value),
                    None => {
                        rendered.push('{');
                        rendered.push_str(name);
                        rendered.push('}');
                    }
                }
                rest = &after[name.len() + 1..];
            }
            None => {
                rendered.push('{');
                rest = after;
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

fn is_placeholder(name: &str) -> bool {
    !name.is_empty() && !name.contains(|c: char| c == '{' || c.is_whitespace())
}

fn placeholder_value(name: &str, params: &Params) -> Option<String> {
    match params.value(name) {
        Some(value) => Some(value.to_path()),
        None if name == "params" => Some(serde_json::to_string(params).unwrap_or_default()),
        None => None,
    }
}
