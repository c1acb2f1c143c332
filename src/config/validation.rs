//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, capacity > 0)
//! - Check prefixes and addresses are well formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::RouterConfig;

/// A single semantic problem in a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    check_prefix(&mut errors, "routes.prefix", &config.routes.prefix);
    if config.routes.cache_capacity == 0 {
        errors.push(ValidationError::new(
            "routes.cache_capacity",
            "must be greater than 0",
        ));
    }
    if config.routes.extensions.is_empty() {
        errors.push(ValidationError::new(
            "routes.extensions",
            "at least one extension is required",
        ));
    }
    for extension in &config.routes.extensions {
        if extension.is_empty() || extension.starts_with('.') {
            errors.push(ValidationError::new(
                "routes.extensions",
                format!("'{extension}' must be a bare extension such as \"toml\""),
            ));
        }
    }

    if let Some(static_files) = &config.static_files {
        check_prefix(&mut errors, "static_files.prefix", &static_files.prefix);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be greater than 0",
        ));
    }

    let observability = &config.observability;
    if !matches!(observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("'{}' is not one of \"pretty\", \"json\"", observability.log_format),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_prefix(errors: &mut Vec<ValidationError>, field: &'static str, prefix: &str) {
    if prefix.is_empty() {
        return;
    }
    if !prefix.starts_with('/') {
        errors.push(ValidationError::new(field, "must start with '/'"));
    }
    if prefix.ends_with('/') {
        errors.push(ValidationError::new(field, "must not end with '/'"));
    }
}
