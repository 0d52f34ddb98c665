//! Propagation configuration.
//!
//! Read once at startup and passed immutably to the propagation engine;
//! nothing here is reloaded at runtime.

use serde::{Deserialize, Serialize};

/// Default traversal ceiling: a page is refreshed at most this many times
/// over the process lifetime before the guard refuses it.
pub const DEFAULT_TRAVERSAL_CEILING: u32 = 2;

/// Default cap on dependent pages returned per fact-store query.
pub const DEFAULT_QUERY_RESULT_LIMIT: usize = 10_000;

/// Immutable configuration for one propagation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationConfig {
    /// Attribute whose presence marks a page as a dependency root.
    /// Normalized on construction: spaces become underscores, the form
    /// the store keys its attributes by.
    pub tracked_attribute: String,
    /// Dispatch refreshes through the async queue instead of inline.
    pub use_async_queue: bool,
    /// Visits allowed per page identifier before the guard refuses it.
    pub traversal_ceiling: u32,
    /// Result cap passed to every fact-store query.
    pub query_result_limit: usize,
    /// Multi-value list separator used by an optional companion
    /// form-input module. When set, list values are rewritten into
    /// alternation before querying.
    pub list_separator: Option<char>,
}

impl PropagationConfig {
    /// Configuration tracking `attribute`, with documented defaults for
    /// everything else.
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            tracked_attribute: normalize_attribute(&attribute.into()),
            use_async_queue: false,
            traversal_ceiling: DEFAULT_TRAVERSAL_CEILING,
            query_result_limit: DEFAULT_QUERY_RESULT_LIMIT,
            list_separator: None,
        }
    }

    pub fn with_async_queue(mut self, on: bool) -> Self {
        self.use_async_queue = on;
        self
    }

    pub fn with_traversal_ceiling(mut self, ceiling: u32) -> Self {
        self.traversal_ceiling = ceiling;
        self
    }

    pub fn with_query_result_limit(mut self, limit: usize) -> Self {
        self.query_result_limit = limit;
        self
    }

    pub fn with_list_separator(mut self, sep: char) -> Self {
        self.list_separator = Some(sep);
        self
    }
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self::new("")
    }
}

/// Attribute names are stored with underscores where titles show spaces.
fn normalize_attribute(name: &str) -> String {
    name.trim().replace(' ', "_")
}
