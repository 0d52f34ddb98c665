//! # semantic-ripple — Dependency Propagation for Semantic Wikis
//!
//! When a page's derived semantic data changes, every page whose content
//! depends on it must be refreshed (a "null edit": re-save unchanged
//! content to force cache purge and re-derivation). This crate is that
//! propagation core: it classifies change events, resolves dependents
//! through the fact store's query engine, bounds recursive refresh, and
//! dispatches the null edits inline or through a job queue.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `FactStore`, `ContentStore` and `JobQueue` are the
//!    contracts to the host wiki; the core owns no persistence
//! 2. **Clean DTOs**: `ChangeEvent`, `PageRef`, `FactValue` cross all
//!    boundaries
//! 3. **Explicit waves**: a refresh that triggers a new upstream event
//!    re-enters as an independent wave — no recursion, no shared stack
//! 4. **Explicit state**: the traversal ledger and the configuration are
//!    owned values, not globals
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use semantic_ripple::{
//!     ChangeEvent, MemoryQueue, MemoryWiki, PageRef, PropagationConfig, Propagator,
//! };
//!
//! # async fn example() -> semantic_ripple::Result<()> {
//! let wiki = Arc::new(MemoryWiki::new());
//! wiki.add_page("Report:Summary", "Uses figures from Data:Warsaw.");
//! wiki.add_fact("Report:Summary", "Source", "Warsaw");
//!
//! let engine = Propagator::new(
//!     PropagationConfig::new("Depends On"),
//!     wiki.clone(),
//!     wiki.clone(),
//!     Arc::new(MemoryQueue::new()),
//! )?;
//!
//! // Upstream store: Data:Warsaw's semantic data was recomputed.
//! let event = ChangeEvent::new(
//!     PageRef::resolved("Data:Warsaw", "Data:Warsaw"),
//!     [("Depends_On".to_string(), vec!["Source::Warsaw".into()])].into(),
//! );
//! let report = engine.on_data_updated(event).await?;
//! println!("refreshed {} dependent pages", report.refreshed.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Module | Decides |
//! |-------|--------|---------|
//! | Classify | `classifier` | go/no-go per change event |
//! | Resolve | `resolver` + `pattern` | which pages depend on the subject |
//! | Guard | `guard` | which of those are still within budget |
//! | Dispatch | `dispatch` | inline null edit, or queued `RefreshTask` |

// ============================================================================
// Modules
// ============================================================================

pub mod classifier;
pub mod config;
pub mod dispatch;
pub mod guard;
pub mod model;
pub mod pattern;
pub mod resolver;
pub mod store;

use std::sync::Arc;

use tracing::{debug, warn};

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    ChangeEvent, FactValue, PageId, PageRef, PropertySet, TableChange, MODIFICATION_DATE_TABLE,
};

// ============================================================================
// Re-exports: Configuration
// ============================================================================

pub use config::{PropagationConfig, DEFAULT_QUERY_RESULT_LIMIT, DEFAULT_TRAVERSAL_CEILING};

// ============================================================================
// Re-exports: Pipeline
// ============================================================================

pub use dispatch::{DispatchMode, RefreshDispatcher, RefreshTask};
pub use guard::TraversalGuard;
pub use resolver::Resolution;

// ============================================================================
// Re-exports: Service contracts
// ============================================================================

pub use store::{
    ContentStore, FactStore, JobQueue, MemoryQueue, MemoryWiki, RawContent, TaskHandle,
};

// ============================================================================
// Wave report
// ============================================================================

/// One page-scoped failure inside a wave.
///
/// `page` is `None` when the failure was a query rejection scoped to a
/// fact value rather than to a dependent page.
#[derive(Debug)]
pub struct WaveFailure {
    pub page: Option<PageId>,
    pub error: Error,
}

/// Outcome of one propagation wave.
///
/// Failures are collected here, never escalated: a page-scoped failure
/// must not block propagation to the rest of the dependency set.
#[derive(Debug, Default)]
pub struct WaveReport {
    /// Whether the classifier let the event through at all.
    pub propagated: bool,
    /// Pages refreshed inline.
    pub refreshed: Vec<PageId>,
    /// Pages handed to the job queue.
    pub enqueued: Vec<PageId>,
    /// Pages over their traversal budget, excluded from dispatch.
    pub skipped: Vec<PageId>,
    /// Page-scoped failures, logged and carried for the caller.
    pub failures: Vec<WaveFailure>,
}

impl WaveReport {
    /// Pages this wave acted on, regardless of mode.
    pub fn dispatched(&self) -> usize {
        self.refreshed.len() + self.enqueued.len()
    }
}

// ============================================================================
// Propagator
// ============================================================================

/// The propagation engine: owns the configuration, the traversal guard
/// and the service handles, and runs one wave per upstream event.
///
/// Construct once at process start and share; the guard's ledger is
/// process-lifetime state.
pub struct Propagator<F, C, Q> {
    facts: Arc<F>,
    dispatcher: RefreshDispatcher<C, Q>,
    guard: TraversalGuard,
    config: PropagationConfig,
}

impl<F, C, Q> Propagator<F, C, Q>
where
    F: FactStore,
    C: ContentStore,
    Q: JobQueue,
{
    pub fn new(
        config: PropagationConfig,
        facts: Arc<F>,
        content: Arc<C>,
        queue: Arc<Q>,
    ) -> Result<Self> {
        if config.tracked_attribute.is_empty() {
            return Err(Error::Config(
                "tracked attribute must not be empty".to_string(),
            ));
        }
        Ok(Self {
            facts,
            dispatcher: RefreshDispatcher::new(content, queue),
            guard: TraversalGuard::new(config.traversal_ceiling),
            config,
        })
    }

    pub fn config(&self) -> &PropagationConfig {
        &self.config
    }

    /// The engine's traversal guard (shared across all waves).
    pub fn guard(&self) -> &TraversalGuard {
        &self.guard
    }

    /// Run one propagation wave for an upstream "semantic data updated"
    /// event.
    ///
    /// Returns the wave's outcome; page-scoped failures are inside the
    /// report. `Err` is reserved for misuse of the engine itself, so a
    /// host can `?` this without ever aborting its own request.
    pub async fn on_data_updated(&self, event: ChangeEvent) -> Result<WaveReport> {
        let mut report = WaveReport::default();
        debug!(subject = %event.subject, "change event received");

        if !classifier::should_propagate(&event, &self.config.tracked_attribute) {
            return Ok(report);
        }
        report.propagated = true;

        let values = event
            .properties
            .get(&self.config.tracked_attribute)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let resolution = resolver::resolve(self.facts.as_ref(), values, &self.config).await;
        for error in resolution.rejected {
            report.failures.push(WaveFailure { page: None, error });
        }

        let mode = if self.config.use_async_queue {
            DispatchMode::Queued
        } else {
            DispatchMode::Inline
        };

        for page in resolution.dependents {
            self.guard.record(&page.id);
            if !self.guard.admit(&page.id) {
                debug!(page = %page, "over traversal budget, skipping");
                report.skipped.push(page.id);
                continue;
            }

            match self.dispatcher.refresh(&page, mode).await {
                Ok(()) => match mode {
                    DispatchMode::Inline => report.refreshed.push(page.id),
                    DispatchMode::Queued => report.enqueued.push(page.id),
                },
                Err(error) => {
                    warn!(page = %page, %error, "refresh failed, continuing wave");
                    report.failures.push(WaveFailure {
                        page: Some(page.id),
                        error,
                    });
                }
            }
        }

        debug!(
            dispatched = report.dispatched(),
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            "wave complete"
        );
        Ok(report)
    }

    /// Run a wave for a subject about to be deleted.
    ///
    /// The store produces no diff on this path, so the subject's last
    /// known semantic data is loaded and the event propagates
    /// conservatively.
    pub async fn on_subject_deleted(&self, subject: PageRef) -> Result<WaveReport> {
        debug!(subject = %subject, "subject deleted, propagating from last known data");
        let properties = self.facts.semantic_data(&subject.id).await?;
        self.on_data_updated(ChangeEvent::new(subject, properties))
            .await
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Query rejected for pattern {pattern}: {message}")]
    QueryRejected { pattern: String, message: String },

    #[error("Content of {page} could not be re-serialized: {message}")]
    SerializationFailed { page: PageId, message: String },

    #[error("Save failed for {page}: {message}")]
    SaveFailed { page: PageId, message: String },

    #[error("Enqueue failed: {0}")]
    EnqueueFailed(String),

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, Error>;
