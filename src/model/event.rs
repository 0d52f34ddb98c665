//! Semantic-data change events emitted by the upstream store.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{PageRef, PropertySet};

/// Internal table holding the subject's last-modified timestamp.
///
/// The upstream store touches this table on every recompute, data change
/// or not. A diff confined to it is bookkeeping, not a content change.
/// Exactly this one table is excluded from the diff check; the key
/// mirrors the store's schema and is not generalized here.
pub const MODIFICATION_DATE_TABLE: &str = "smw_fpt_mdat";

/// Per-table change record inside an incremental diff.
///
/// The classifier only looks at which tables appear in the diff, never at
/// the row counts; they are carried for logging and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableChange {
    pub inserted: usize,
    pub deleted: usize,
}

impl TableChange {
    pub fn new(inserted: usize, deleted: usize) -> Self {
        Self { inserted, deleted }
    }
}

/// One "semantic data updated" notification.
///
/// Produced whenever a page's derived data is recomputed or deleted.
/// Immutable; consumed once per propagation decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// The page whose data changed.
    pub subject: PageRef,
    /// The subject's semantic data after the change.
    pub properties: PropertySet,
    /// Incremental per-table diff, when the store could compute one.
    /// `None` on full-delete paths — absence of a diff is not proof of
    /// absence of change.
    pub diff_by_table: Option<HashMap<String, TableChange>>,
}

impl ChangeEvent {
    pub fn new(subject: PageRef, properties: PropertySet) -> Self {
        Self {
            subject,
            properties,
            diff_by_table: None,
        }
    }

    pub fn with_diff(mut self, diff: HashMap<String, TableChange>) -> Self {
        self.diff_by_table = Some(diff);
        self
    }
}
