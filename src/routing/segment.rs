//! Route segment classification.
//!
//! # Syntax
//! - `about` → literal segment
//! - `[id]` → dynamic slug, binds exactly one URL segment
//! - `[...path]` → required catch-all, binds one or more trailing segments
//! - `[[...path]]` → optional catch-all, binds zero or more trailing segments
//! - `(group)` → route group, purely organizational, contributes no URL segment

use crate::error::RouteError;

/// One classified segment of a route file path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Slug(&'a str),
    CatchAll(&'a str),
    OptionalCatchAll(&'a str),
}

impl Segment<'_> {
    /// Returns true for the segment kinds that must end a route.
    pub fn is_catch_all(&self) -> bool {
        matches!(self, Segment::CatchAll(_) | Segment::OptionalCatchAll(_))
    }
}

/// Returns true if the segment is a route group such as `(marketing)`.
pub fn is_group(segment: &str) -> bool {
    segment.len() >= 2 && segment.starts_with('(') && segment.ends_with(')')
}

/// Splits a route path into the segments that take part in URL matching.
///
/// Empty segments and route groups are dropped.
pub fn routable_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty() && !is_group(s))
}

/// Classify a single raw segment, validating any slug name it declares.
pub fn classify(raw: &str) -> Result<Segment<'_>, RouteError> {
    let Some(mut name) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) else {
        return Ok(Segment::Literal(raw));
    };

    let mut optional = false;
    if let Some(inner) = name.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        name = inner;
        optional = true;
    }

    if name.starts_with('…') {
        return Err(RouteError::EllipsisTypo {
            segment: raw.to_string(),
        });
    }

    let catch_all = match name.strip_prefix("...") {
        Some(rest) => {
            name = rest;
            true
        }
        None => false,
    };

    if name.starts_with('[') || name.ends_with(']') {
        return Err(RouteError::ExtraBrackets {
            name: name.to_string(),
        });
    }
    if name.starts_with('.') {
        return Err(RouteError::LeadingPeriod {
            name: name.to_string(),
        });
    }
    if name.is_empty() {
        return Err(RouteError::EmptySlugName {
            segment: raw.to_string(),
        });
    }

    match (catch_all, optional) {
        (false, false) => Ok(Segment::Slug(name)),
        (true, false) => Ok(Segment::CatchAll(name)),
        (true, true) => Ok(Segment::OptionalCatchAll(name)),
        (false, true) => Err(RouteError::OptionalParamUnsupported {
            segment: raw.to_string(),
        }),
    }
}

/// Slug name reduced to its word characters, used to spot near-duplicates.
pub(crate) fn word_chars(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}
