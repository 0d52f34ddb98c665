//! # Diff Classification
//!
//! The go/no-go gate in front of propagation. Pure decision logic —
//! no I/O, no state; every rejection is logged with its reason.
//!
//! Propagation costs one write per dependent page, so this gate
//! suppresses no-op and internal-only updates while still firing on
//! genuine deletions where no diff exists.

use tracing::debug;

use crate::model::{ChangeEvent, MODIFICATION_DATE_TABLE};

/// Decide whether `event` warrants a propagation wave.
///
/// The checks short-circuit in order:
/// 1. a subject with no resolvable title has nothing to propagate from;
/// 2. a subject without the tracked attribute is not a dependency root;
/// 3. an incremental diff confined to the store's internal
///    modification-date table is a bookkeeping touch, not a change;
/// 4. no diff at all (full-delete path) cannot prove absence of change,
///    so it propagates conservatively.
pub fn should_propagate(event: &ChangeEvent, tracked_attribute: &str) -> bool {
    if !event.subject.is_resolved() {
        debug!(subject = %event.subject.id, "subject has no resolvable title, skipping");
        return false;
    }

    if !event.properties.contains_key(tracked_attribute) {
        debug!(
            subject = %event.subject,
            attribute = tracked_attribute,
            "tracked attribute not present, skipping"
        );
        return false;
    }

    if let Some(diff) = &event.diff_by_table {
        let meaningful = diff
            .keys()
            .filter(|table| table.as_str() != MODIFICATION_DATE_TABLE)
            .count();
        if meaningful == 0 {
            debug!(subject = %event.subject, "no semantic data changes detected, skipping");
            return false;
        }
        debug!(subject = %event.subject, tables = meaningful, "data changes detected");
    }
    // No diff available: the store could not say what changed, so assume
    // something did.

    true
}
