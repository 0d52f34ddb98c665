//! # Dependency Resolution
//!
//! Turns a tracked attribute's values into the set of pages whose content
//! depends on the changed page, by querying the fact store with the
//! normalized linked-page pattern.

use tracing::{debug, trace, warn};

use crate::config::PropagationConfig;
use crate::model::{FactValue, PageRef};
use crate::pattern;
use crate::store::FactStore;
use crate::Error;

/// Outcome of resolving one event's tracked-attribute values.
///
/// Resolution has partial-failure semantics: a fact value whose pattern
/// the query service rejects contributes an error here, but never blocks
/// the other values from resolving.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Dependent pages, in query-result order, deduplicated by id.
    pub dependents: Vec<PageRef>,
    /// Per-fact-value query rejections.
    pub rejected: Vec<Error>,
}

/// Resolve `values` to the pages referencing them.
///
/// Only text/blob facts can carry a link query; every other kind is
/// skipped. Hits without a resolvable title are dropped silently — they
/// cannot be refreshed.
pub async fn resolve<F: FactStore>(
    facts: &F,
    values: &[FactValue],
    config: &PropagationConfig,
) -> Resolution {
    let mut resolution = Resolution::default();
    let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();

    for value in values {
        let Some(raw) = value.as_text() else {
            trace!(kind = value.type_name(), "skipping non-text fact value");
            continue;
        };

        let query = pattern::normalize(raw, config.list_separator);
        debug!(%query, "querying dependent pages");

        let hits = match facts
            .query_linked_pages(&query, config.query_result_limit)
            .await
        {
            Ok(hits) => hits,
            Err(err) => {
                warn!(%query, error = %err, "query rejected, skipping this fact value");
                resolution.rejected.push(err);
                continue;
            }
        };

        debug!(%query, hits = hits.len(), "dependent pages found");
        for hit in hits {
            if !hit.is_resolved() {
                trace!(page = %hit.id, "dropping hit without resolvable title");
                continue;
            }
            if seen.insert(hit.id.0.clone()) {
                resolution.dependents.push(hit);
            }
        }
    }

    resolution
}
