//! End-to-end propagation waves against the in-memory backends.
//!
//! Each test exercises the full pipeline: classify -> resolve -> guard ->
//! dispatch, driven through `Propagator::on_data_updated` /
//! `on_subject_deleted` with `MemoryWiki` as both fact and content store.

use std::collections::HashMap;
use std::sync::Arc;

use semantic_ripple::{
    ChangeEvent, Error, FactValue, MemoryQueue, MemoryWiki, PageId, PageRef, PropagationConfig,
    Propagator, TableChange, MODIFICATION_DATE_TABLE,
};

type Engine = Propagator<MemoryWiki, MemoryWiki, MemoryQueue>;

fn engine(wiki: &Arc<MemoryWiki>) -> Engine {
    Propagator::new(
        PropagationConfig::new("Depends On"),
        wiki.clone(),
        wiki.clone(),
        Arc::new(MemoryQueue::new()),
    )
    .unwrap()
}

/// A diff that touches one real data table (plus the timestamp table the
/// store always touches).
fn data_diff() -> HashMap<String, TableChange> {
    let mut diff = HashMap::new();
    diff.insert(MODIFICATION_DATE_TABLE.to_string(), TableChange::new(1, 1));
    diff.insert("prop_table_foo".to_string(), TableChange::new(2, 1));
    diff
}

fn event_for(subject: &str, values: Vec<FactValue>) -> ChangeEvent {
    let mut properties = HashMap::new();
    properties.insert("Depends_On".to_string(), values);
    ChangeEvent::new(PageRef::resolved(subject, subject), properties).with_diff(data_diff())
}

// ============================================================================
// 1. Changed page X refreshes the pages referencing Y
// ============================================================================

#[tokio::test]
async fn test_change_refreshes_dependents() {
    let wiki = Arc::new(MemoryWiki::new());
    wiki.add_page("P1", "content of P1");
    wiki.add_fact("P1", "Depends_On", "Y");
    wiki.add_page("P2", "content of P2");
    wiki.add_fact("P2", "Depends_On", "Y");
    wiki.add_page("Unrelated", "content");

    let engine = engine(&wiki);
    let report = engine
        .on_data_updated(event_for("X", vec![FactValue::from("Depends_On::Y")]))
        .await
        .unwrap();

    assert!(report.propagated);
    assert_eq!(report.refreshed, vec![PageId::new("P1"), PageId::new("P2")]);
    assert!(report.failures.is_empty());

    // One null edit per dependent, caches purged, nothing else touched.
    assert_eq!(wiki.revisions_of(&PageId::new("P1")).len(), 1);
    assert_eq!(wiki.revisions_of(&PageId::new("P2")).len(), 1);
    assert_eq!(wiki.purge_count(&PageId::new("P1")), 1);
    assert!(wiki.revisions_of(&PageId::new("Unrelated")).is_empty());

    // First visit recorded for both.
    assert_eq!(engine.guard().visits(&PageId::new("P1")), 1);
    assert_eq!(engine.guard().visits(&PageId::new("P2")), 1);
}

// ============================================================================
// 2. Timestamp-only diffs are suppressed
// ============================================================================

#[tokio::test]
async fn test_timestamp_only_diff_is_suppressed() {
    let wiki = Arc::new(MemoryWiki::new());
    wiki.add_page("P1", "content");
    wiki.add_fact("P1", "Depends_On", "Y");

    let engine = engine(&wiki);
    let mut diff = HashMap::new();
    diff.insert(MODIFICATION_DATE_TABLE.to_string(), TableChange::new(1, 1));
    let mut event = event_for("X", vec![FactValue::from("Depends_On::Y")]);
    event.diff_by_table = Some(diff);

    let report = engine.on_data_updated(event).await.unwrap();

    assert!(!report.propagated);
    assert_eq!(report.dispatched(), 0);
    assert!(wiki.revisions_of(&PageId::new("P1")).is_empty());
}

// ============================================================================
// 3. A missing diff propagates conservatively
// ============================================================================

#[tokio::test]
async fn test_missing_diff_propagates() {
    let wiki = Arc::new(MemoryWiki::new());
    wiki.add_page("P1", "content");
    wiki.add_fact("P1", "Depends_On", "Y");

    let engine = engine(&wiki);
    let mut event = event_for("X", vec![FactValue::from("Depends_On::Y")]);
    event.diff_by_table = None;

    let report = engine.on_data_updated(event).await.unwrap();

    assert!(report.propagated);
    assert_eq!(report.refreshed, vec![PageId::new("P1")]);
}

// ============================================================================
// 4. Cycle safety: the third wave through a page is refused
// ============================================================================

#[tokio::test]
async fn test_third_wave_through_same_page_is_refused() {
    let wiki = Arc::new(MemoryWiki::new());
    wiki.add_page("P1", "content");
    wiki.add_fact("P1", "Depends_On", "Y");

    let engine = engine(&wiki);

    // P1's own refresh keeps re-triggering events naming it as dependent.
    for _ in 0..2 {
        let report = engine
            .on_data_updated(event_for("X", vec![FactValue::from("Depends_On::Y")]))
            .await
            .unwrap();
        assert_eq!(report.refreshed, vec![PageId::new("P1")]);
    }

    let third = engine
        .on_data_updated(event_for("X", vec![FactValue::from("Depends_On::Y")]))
        .await
        .unwrap();

    assert!(third.refreshed.is_empty());
    assert_eq!(third.skipped, vec![PageId::new("P1")]);
    assert_eq!(wiki.revisions_of(&PageId::new("P1")).len(), 2);
    assert_eq!(engine.guard().visits(&PageId::new("P1")), 3);
}

// ============================================================================
// 5. Deletion path: no diff available, still propagates
// ============================================================================

#[tokio::test]
async fn test_subject_deletion_propagates() {
    let wiki = Arc::new(MemoryWiki::new());
    wiki.add_page("X", "about to be deleted");
    wiki.add_fact("X", "Depends_On", "Depends_On::Y");
    wiki.add_page("P1", "content");
    wiki.add_fact("P1", "Depends_On", "Y");

    let engine = engine(&wiki);
    let report = engine
        .on_subject_deleted(PageRef::resolved("X", "X"))
        .await
        .unwrap();

    assert!(report.propagated);
    assert_eq!(report.refreshed, vec![PageId::new("P1")]);
}

// ============================================================================
// 6. Partial failure: one bad fact value does not block the rest
// ============================================================================

#[tokio::test]
async fn test_malformed_value_does_not_block_others() {
    let wiki = Arc::new(MemoryWiki::new());
    wiki.add_page("P1", "content");
    wiki.add_fact("P1", "Depends_On", "Y");

    let engine = engine(&wiki);
    let report = engine
        .on_data_updated(event_for(
            "X",
            vec![
                // No '::' — the query service rejects the clause.
                FactValue::from("just a title"),
                FactValue::from("Depends_On::Y"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(report.refreshed, vec![PageId::new("P1")]);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].page.is_none());
    assert!(matches!(
        report.failures[0].error,
        Error::QueryRejected { .. }
    ));
}

// ============================================================================
// 7. A failing save is page-scoped, the wave continues
// ============================================================================

#[tokio::test]
async fn test_save_failure_does_not_stop_the_wave() {
    let wiki = Arc::new(MemoryWiki::new());
    wiki.add_page("P1", "content");
    wiki.add_fact("P1", "Depends_On", "Y");
    wiki.add_page("P2", "content");
    wiki.add_fact("P2", "Depends_On", "Y");
    wiki.reject_saves_for("P1");

    let engine = engine(&wiki);
    let report = engine
        .on_data_updated(event_for("X", vec![FactValue::from("Depends_On::Y")]))
        .await
        .unwrap();

    assert_eq!(report.refreshed, vec![PageId::new("P2")]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].page, Some(PageId::new("P1")));
    assert!(matches!(report.failures[0].error, Error::SaveFailed { .. }));
    assert_eq!(wiki.revisions_of(&PageId::new("P2")).len(), 1);
}

// ============================================================================
// 8. Dependents are refreshed once per wave even when named twice
// ============================================================================

#[tokio::test]
async fn test_dependents_deduplicated_within_a_wave() {
    let wiki = Arc::new(MemoryWiki::new());
    wiki.add_page("P1", "content");
    wiki.add_fact("P1", "Depends_On", "Y");
    wiki.add_fact("P1", "Uses", "Z");

    let engine = engine(&wiki);
    let report = engine
        .on_data_updated(event_for(
            "X",
            vec![
                FactValue::from("Depends_On::Y"),
                FactValue::from("Uses::Z"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(report.refreshed, vec![PageId::new("P1")]);
    assert_eq!(wiki.revisions_of(&PageId::new("P1")).len(), 1);
    assert_eq!(engine.guard().visits(&PageId::new("P1")), 1);
}

// ============================================================================
// 9. Dependents whose titles no longer resolve are dropped silently
// ============================================================================

#[tokio::test]
async fn test_unresolvable_dependents_are_dropped() {
    let wiki = Arc::new(MemoryWiki::new());
    wiki.add_page("P1", "content");
    wiki.add_fact("P1", "Depends_On", "Y");
    wiki.add_orphan("Ghost");
    wiki.add_fact("Ghost", "Depends_On", "Y");

    let engine = engine(&wiki);
    let report = engine
        .on_data_updated(event_for("X", vec![FactValue::from("Depends_On::Y")]))
        .await
        .unwrap();

    assert_eq!(report.refreshed, vec![PageId::new("P1")]);
    assert!(report.failures.is_empty());
}

// ============================================================================
// 10. Non-text fact kinds never reach the query service
// ============================================================================

#[tokio::test]
async fn test_non_text_values_are_ignored() {
    let wiki = Arc::new(MemoryWiki::new());
    wiki.add_page("P1", "content");
    wiki.add_fact("P1", "Depends_On", "Y");

    let engine = engine(&wiki);
    let report = engine
        .on_data_updated(event_for("X", vec![FactValue::Bool(true), FactValue::Number(3.0)]))
        .await
        .unwrap();

    assert!(report.propagated);
    assert_eq!(report.dispatched(), 0);
    assert!(report.failures.is_empty());
}

// ============================================================================
// 11. Multi-value list separator resolves as alternation
// ============================================================================

#[tokio::test]
async fn test_list_separator_values_resolve_as_alternation() {
    let wiki = Arc::new(MemoryWiki::new());
    wiki.add_page("P1", "content");
    wiki.add_fact("P1", "Depends_On", "Y");
    wiki.add_page("P2", "content");
    wiki.add_fact("P2", "Depends_On", "Z");

    let engine = Propagator::new(
        PropagationConfig::new("Depends On").with_list_separator(';'),
        wiki.clone(),
        wiki.clone(),
        Arc::new(MemoryQueue::new()),
    )
    .unwrap();

    let report = engine
        .on_data_updated(event_for("X", vec![FactValue::from("Depends_On::Y;Z;")]))
        .await
        .unwrap();

    assert_eq!(report.refreshed, vec![PageId::new("P1"), PageId::new("P2")]);
}

// ============================================================================
// 12. Engine construction rejects an empty tracked attribute
// ============================================================================

#[tokio::test]
async fn test_empty_tracked_attribute_is_rejected() {
    let wiki = Arc::new(MemoryWiki::new());
    let result = Propagator::new(
        PropagationConfig::new("  "),
        wiki.clone(),
        wiki.clone(),
        Arc::new(MemoryQueue::new()),
    );
    assert!(matches!(result, Err(Error::Config(_))));
}
