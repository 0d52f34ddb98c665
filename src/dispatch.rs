//! # Refresh Dispatch
//!
//! Performs the null edit: re-save a dependent page's content unchanged,
//! forcing cache purge and re-derivation of its semantic data. Inline
//! dispatch runs the edit on the calling request; queued dispatch hands a
//! [`RefreshTask`] to the job queue and returns as soon as the queue
//! acknowledges it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::PageRef;
use crate::store::{ContentStore, JobQueue};
use crate::Result;

/// System identity the null edits are attributed to.
pub const SYSTEM_ACTOR: &str = "Semantic Ripple updater";

/// Audit comment recorded on every null-edit revision.
pub const NULL_EDIT_COMMENT: &str = "[SemanticRipple] Null edit.";

// ============================================================================
// Dispatch mode
// ============================================================================

/// How a refresh is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchMode {
    /// Synchronously, on the triggering request. Amplifies request
    /// latency proportionally to the dependency set.
    Inline,
    /// Deferred through the job queue; completion is not observed by the
    /// caller.
    Queued,
}

// ============================================================================
// Null edit
// ============================================================================

/// Re-save `page`'s current content unchanged and purge its cache.
///
/// A missing page succeeds as a no-op; there is nothing to refresh.
/// Safely re-executable: running it again performs the same idempotent
/// edit.
pub(crate) async fn null_edit<C: ContentStore>(content: &C, page: &PageRef) -> Result<()> {
    let Some(raw) = content.raw_content(&page.id).await? else {
        debug!(page = %page, "no content found, nothing to refresh");
        return Ok(());
    };

    content
        .save_revision(&page.id, &raw, NULL_EDIT_COMMENT, SYSTEM_ACTOR)
        .await?;
    content.purge_cache(&page.id).await?;
    Ok(())
}

// ============================================================================
// RefreshTask
// ============================================================================

/// Deferred unit of work: "refresh page P".
///
/// Self-contained and serializable so a queue can carry it to a worker
/// independent of the triggering request. Retry on failure belongs to the
/// queue's own policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshTask {
    pub target: PageRef,
}

impl RefreshTask {
    pub fn new(target: PageRef) -> Self {
        Self { target }
    }

    /// Execute the refresh against `content`. Identical semantics to an
    /// inline dispatch of the same page.
    pub async fn run<C: ContentStore>(&self, content: &C) -> Result<()> {
        debug!(page = %self.target, "running queued refresh");
        null_edit(content, &self.target).await
    }
}

// ============================================================================
// RefreshDispatcher
// ============================================================================

/// Issues null-edit refreshes, inline or via the queue.
pub struct RefreshDispatcher<C, Q> {
    content: Arc<C>,
    queue: Arc<Q>,
}

impl<C: ContentStore, Q: JobQueue> RefreshDispatcher<C, Q> {
    pub fn new(content: Arc<C>, queue: Arc<Q>) -> Self {
        Self { content, queue }
    }

    /// Refresh `page` in the given mode.
    ///
    /// Queued mode succeeds once the queue acknowledges the task; an
    /// unavailable queue surfaces as [`crate::Error::EnqueueFailed`] —
    /// never a silent inline fallback, which would defeat the
    /// latency-isolation purpose of queuing.
    pub async fn refresh(&self, page: &PageRef, mode: DispatchMode) -> Result<()> {
        match mode {
            DispatchMode::Inline => {
                debug!(page = %page, "refreshing inline");
                null_edit(self.content.as_ref(), page).await
            }
            DispatchMode::Queued => {
                debug!(page = %page, "enqueueing refresh");
                let handle = self.queue.enqueue(RefreshTask::new(page.clone())).await?;
                debug!(page = %page, handle = handle.0, "refresh enqueued");
                Ok(())
            }
        }
    }
}
