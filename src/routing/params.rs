//! Parameters bound while matching a request path.

use serde::Serialize;
use std::collections::BTreeMap;

/// Value bound to a slug name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Bound by a dynamic slug (`[id]`).
    One(String),
    /// Bound by a catch-all (`[...path]` or `[[...path]]`), possibly empty.
    Many(Vec<String>),
}

impl ParamValue {
    /// Render the value as URL text; catch-all lists are joined with `/`.
    pub fn to_path(&self) -> String {
        match self {
            ParamValue::One(value) => value.clone(),
            ParamValue::Many(values) => values.join("/"),
        }
    }
}

/// Named parameters of a matched route, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a single-segment parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        match self.0.get(name)? {
            ParamValue::One(value) => Some(value),
            ParamValue::Many(_) => None,
        }
    }

    /// Get the segments bound by a catch-all parameter.
    pub fn get_all(&self, name: &str) -> Option<&[String]> {
        match self.0.get(name)? {
            ParamValue::Many(values) => Some(values),
            ParamValue::One(_) => None,
        }
    }

    /// Get the raw value for a name, whatever its kind.
    pub fn value(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn bind_one(&mut self, name: &str, value: &str) {
        self.0
            .insert(name.to_string(), ParamValue::One(value.to_string()));
    }

    pub(crate) fn bind_many(&mut self, name: &str, values: &[&str]) {
        let values = values.iter().map(|s| s.to_string()).collect();
        self.0.insert(name.to_string(), ParamValue::Many(values));
    }
}
