//! Page identity.

use serde::{Deserialize, Serialize};

/// Opaque page identifier, in the upstream store's prefixed key form
/// (e.g. `"Project:Release_plan"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(pub String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A page identifier together with its resolvable title.
///
/// `title` is `None` when the page can no longer be located (deleted
/// mid-flight, dangling reference). Such pages cannot be refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub id: PageId,
    pub title: Option<String>,
}

impl PageRef {
    /// A page whose title resolves.
    pub fn resolved(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: PageId::new(id),
            title: Some(title.into()),
        }
    }

    /// A page reference with no locatable title.
    pub fn dangling(id: impl Into<String>) -> Self {
        Self {
            id: PageId::new(id),
            title: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.title.is_some()
    }
}

impl std::fmt::Display for PageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.title {
            Some(title) => write!(f, "{title}"),
            None => write!(f, "{}", self.id),
        }
    }
}
