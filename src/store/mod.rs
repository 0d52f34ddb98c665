//! # External Service Contracts
//!
//! These traits are THE seams between the propagation core and its host:
//! the semantic fact store with its query engine, the content/revision
//! store, and the async job queue. The core consumes all three as opaque
//! services and owns no persistence of its own.
//!
//! ## Implementations
//!
//! | Service | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryWiki` | `memory` | In-memory fact + content store for testing/embedding |
//! | `MemoryQueue` | `memory` | Drainable in-memory job queue |
//!
//! Production hosts implement these traits over their real wiki backend;
//! nothing in the core assumes anything beyond the contracts below.

pub mod memory;

use async_trait::async_trait;

use crate::dispatch::RefreshTask;
use crate::model::{PageId, PageRef, PropertySet};
use crate::Result;

pub use memory::{MemoryQueue, MemoryWiki};

// ============================================================================
// Raw content
// ============================================================================

/// A page's raw content, opaque to the core.
///
/// The null edit re-saves exactly these bytes; the core never interprets
/// them.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RawContent(pub String);

impl RawContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Task handle
// ============================================================================

/// Opaque acknowledgement for an enqueued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TaskHandle(pub u64);

// ============================================================================
// FactStore
// ============================================================================

/// The semantic fact store and its query engine.
#[async_trait]
pub trait FactStore: Send + Sync + 'static {
    /// The current semantic data of `subject`.
    async fn semantic_data(&self, subject: &PageId) -> Result<PropertySet>;

    /// Pages matching a linked-page query, capped at `limit`.
    ///
    /// `pattern` is in the store's own query syntax (the output of
    /// [`crate::pattern::normalize`]). A malformed pattern is rejected
    /// with [`crate::Error::QueryRejected`].
    async fn query_linked_pages(&self, pattern: &str, limit: usize) -> Result<Vec<PageRef>>;
}

// ============================================================================
// ContentStore
// ============================================================================

/// The page content and revision/versioning store.
#[async_trait]
pub trait ContentStore: Send + Sync + 'static {
    /// Current raw content of `page`, or `None` if the page is missing.
    async fn raw_content(&self, page: &PageId) -> Result<Option<RawContent>>;

    /// Save `content` as a new revision of `page`.
    async fn save_revision(
        &self,
        page: &PageId,
        content: &RawContent,
        comment: &str,
        actor: &str,
    ) -> Result<()>;

    /// Drop any cached rendering of `page`.
    async fn purge_cache(&self, page: &PageId) -> Result<()>;
}

// ============================================================================
// JobQueue
// ============================================================================

/// The asynchronous job queue.
///
/// Ownership of a task passes to the queue on acknowledgement; execution
/// ordering and retry are the queue's business, not the core's.
#[async_trait]
pub trait JobQueue: Send + Sync + 'static {
    async fn enqueue(&self, task: RefreshTask) -> Result<TaskHandle>;
}
