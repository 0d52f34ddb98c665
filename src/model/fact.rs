//! Typed fact values, matching the upstream store's data-item kinds.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PageId;

/// A page's derived semantic data: attribute name → values.
pub type PropertySet = HashMap<String, Vec<FactValue>>;

/// One typed fact value.
///
/// Only the `Text` kind carries a serialized link pattern; every other
/// kind is opaque to the resolver and passes through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum FactValue {
    /// Blob/text fact — the serialized form a link pattern is read from.
    Text(String),
    /// Reference to another page.
    Page(PageId),
    Number(f64),
    Bool(bool),
    Time(DateTime<Utc>),
}

impl FactValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            FactValue::Text(_) => "TEXT",
            FactValue::Page(_) => "PAGE",
            FactValue::Number(_) => "NUMBER",
            FactValue::Bool(_) => "BOOLEAN",
            FactValue::Time(_) => "TIME",
        }
    }

    /// The serialized text of a `Text` fact, `None` for every other kind.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FactValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FactValue {
    fn from(s: &str) -> Self {
        FactValue::Text(s.to_string())
    }
}

impl From<String> for FactValue {
    fn from(s: String) -> Self {
        FactValue::Text(s)
    }
}
