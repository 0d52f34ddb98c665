//! In-memory service implementations.
//!
//! These are the reference implementations of the [`FactStore`],
//! [`ContentStore`] and [`JobQueue`] contracts. Simple HashMaps protected
//! by parking_lot locks.
//!
//! ## Limitations
//!
//! - **No persistence**: everything lives for the process lifetime.
//! - **Full-scan matching**: `query_linked_pages` scans every page; there
//!   is no index.
//! - **Minimal query grammar**: only the clause shapes produced by
//!   [`crate::pattern::normalize`] are understood — `[[Attr::Value]]`
//!   clauses, adjacency for conjunction, `OR` between clauses, `||`
//!   alternation inside a clause.
//!
//! Use these backends for:
//! - Testing the classifier, resolver, guard and dispatcher end to end
//! - Embedding the engine in applications that don't need a real wiki

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::dispatch::RefreshTask;
use crate::model::{FactValue, PageId, PageRef, PropertySet};
use crate::store::{ContentStore, FactStore, JobQueue, RawContent, TaskHandle};
use crate::{Error, Result};

// ============================================================================
// MemoryWiki
// ============================================================================

/// One saved revision, kept for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub page: PageId,
    pub content: RawContent,
    pub comment: String,
    pub actor: String,
}

/// In-memory wiki holding both semantic facts and page content.
pub struct MemoryWiki {
    inner: Arc<WikiInner>,
}

struct WikiInner {
    /// page id → title (`None` for pages with no locatable title)
    titles: RwLock<HashMap<String, Option<String>>>,
    /// page id → attribute → fact values
    facts: RwLock<HashMap<String, PropertySet>>,
    /// page id → current raw content
    content: RwLock<HashMap<String, RawContent>>,
    /// append-only revision log
    revisions: RwLock<Vec<Revision>>,
    /// page id → cache purge count
    purges: RwLock<HashMap<String, u32>>,
    /// page ids in registration order, for deterministic query results
    page_order: RwLock<Vec<String>>,
    /// pages whose saves are rejected (failure injection for tests)
    save_rejects: RwLock<HashSet<String>>,
}

impl MemoryWiki {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(WikiInner {
                titles: RwLock::new(HashMap::new()),
                facts: RwLock::new(HashMap::new()),
                content: RwLock::new(HashMap::new()),
                revisions: RwLock::new(Vec::new()),
                purges: RwLock::new(HashMap::new()),
                page_order: RwLock::new(Vec::new()),
                save_rejects: RwLock::new(HashSet::new()),
            }),
        }
    }

    /// Register a page with a resolvable title and raw content.
    pub fn add_page(&self, id: &str, content: &str) {
        self.register(id, Some(id.to_string()));
        self.inner
            .content
            .write()
            .insert(id.to_string(), RawContent::new(content));
    }

    /// Register a page whose title cannot be resolved. It can carry facts
    /// and match queries, but the resolver will drop it.
    pub fn add_orphan(&self, id: &str) {
        self.register(id, None);
    }

    /// Attach one fact to a page.
    pub fn add_fact(&self, id: &str, attribute: &str, value: impl Into<FactValue>) {
        self.inner
            .facts
            .write()
            .entry(id.to_string())
            .or_default()
            .entry(attribute.to_string())
            .or_default()
            .push(value.into());
    }

    /// Reject every future save of `id` (failure injection).
    pub fn reject_saves_for(&self, id: &str) {
        self.inner.save_rejects.write().insert(id.to_string());
    }

    /// Revisions saved for `page`, oldest first.
    pub fn revisions_of(&self, page: &PageId) -> Vec<Revision> {
        self.inner
            .revisions
            .read()
            .iter()
            .filter(|r| &r.page == page)
            .cloned()
            .collect()
    }

    /// Cache purges issued for `page`.
    pub fn purge_count(&self, page: &PageId) -> u32 {
        self.inner
            .purges
            .read()
            .get(page.as_str())
            .copied()
            .unwrap_or(0)
    }

    fn register(&self, id: &str, title: Option<String>) {
        let mut titles = self.inner.titles.write();
        if !titles.contains_key(id) {
            self.inner.page_order.write().push(id.to_string());
        }
        titles.insert(id.to_string(), title);
    }
}

// ============================================================================
// Query evaluation
// ============================================================================

/// One `[[Attr::Value]]` clause; `alternatives` holds the `||` branches.
struct Clause {
    attribute: String,
    alternatives: Vec<String>,
}

/// Parse a normalized pattern into OR-separated conjunction groups.
fn parse_query(pattern: &str) -> Result<Vec<Vec<Clause>>> {
    let reject = |message: &str| Error::QueryRejected {
        pattern: pattern.to_string(),
        message: message.to_string(),
    };

    let mut groups: Vec<Vec<Clause>> = Vec::new();
    let mut current: Vec<Clause> = Vec::new();
    let mut rest = pattern;

    loop {
        let Some(open) = rest.find("[[") else {
            if !rest.trim().is_empty() {
                return Err(reject("text outside clause brackets"));
            }
            break;
        };

        let before = rest[..open].trim();
        if !before.is_empty() {
            match before {
                "OR" => {
                    if current.is_empty() {
                        return Err(reject("OR with no preceding clause"));
                    }
                    groups.push(std::mem::take(&mut current));
                }
                _ => return Err(reject("unexpected text between clauses")),
            }
        }

        let body_start = open + 2;
        let Some(close) = rest[body_start..].find("]]") else {
            return Err(reject("unbalanced clause brackets"));
        };
        current.push(parse_clause(&rest[body_start..body_start + close], &reject)?);
        rest = &rest[body_start + close + 2..];
    }

    if current.is_empty() {
        return Err(reject("no clauses"));
    }
    groups.push(current);
    Ok(groups)
}

fn parse_clause(body: &str, reject: &dyn Fn(&str) -> Error) -> Result<Clause> {
    let Some((attribute, values)) = body.split_once("::") else {
        return Err(reject("clause without an attribute (missing '::')"));
    };
    let attribute = attribute.trim().replace(' ', "_");
    if attribute.is_empty() {
        return Err(reject("clause with an empty attribute"));
    }

    let alternatives: Vec<String> = values
        .split("||")
        .map(|v| v.trim().to_string())
        .collect();
    if alternatives.iter().any(|alt| alt.is_empty()) {
        return Err(reject("clause with an empty value"));
    }

    Ok(Clause {
        attribute,
        alternatives,
    })
}

fn fact_matches(value: &FactValue, wanted: &str) -> bool {
    match value {
        FactValue::Text(s) => s == wanted,
        FactValue::Page(p) => p.as_str() == wanted,
        _ => false,
    }
}

fn clause_matches(facts: &PropertySet, clause: &Clause) -> bool {
    facts.get(&clause.attribute).is_some_and(|values| {
        values
            .iter()
            .any(|v| clause.alternatives.iter().any(|alt| fact_matches(v, alt)))
    })
}

// ============================================================================
// FactStore impl
// ============================================================================

#[async_trait]
impl FactStore for MemoryWiki {
    async fn semantic_data(&self, subject: &PageId) -> Result<PropertySet> {
        Ok(self
            .inner
            .facts
            .read()
            .get(subject.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn query_linked_pages(&self, pattern: &str, limit: usize) -> Result<Vec<PageRef>> {
        let groups = parse_query(pattern)?;

        let facts = self.inner.facts.read();
        let titles = self.inner.titles.read();
        let empty = PropertySet::new();

        let mut hits = Vec::new();
        for id in self.inner.page_order.read().iter() {
            if hits.len() >= limit {
                break;
            }
            let page_facts = facts.get(id).unwrap_or(&empty);
            let matched = groups
                .iter()
                .any(|group| group.iter().all(|clause| clause_matches(page_facts, clause)));
            if matched {
                hits.push(PageRef {
                    id: PageId::new(id.clone()),
                    title: titles.get(id).cloned().flatten(),
                });
            }
        }
        Ok(hits)
    }
}

// ============================================================================
// ContentStore impl
// ============================================================================

#[async_trait]
impl ContentStore for MemoryWiki {
    async fn raw_content(&self, page: &PageId) -> Result<Option<RawContent>> {
        Ok(self.inner.content.read().get(page.as_str()).cloned())
    }

    async fn save_revision(
        &self,
        page: &PageId,
        content: &RawContent,
        comment: &str,
        actor: &str,
    ) -> Result<()> {
        if self.inner.save_rejects.read().contains(page.as_str()) {
            return Err(Error::SaveFailed {
                page: page.clone(),
                message: "content store rejected the save".to_string(),
            });
        }

        self.inner
            .content
            .write()
            .insert(page.0.clone(), content.clone());
        self.inner.revisions.write().push(Revision {
            page: page.clone(),
            content: content.clone(),
            comment: comment.to_string(),
            actor: actor.to_string(),
        });
        Ok(())
    }

    async fn purge_cache(&self, page: &PageId) -> Result<()> {
        *self
            .inner
            .purges
            .write()
            .entry(page.0.clone())
            .or_insert(0) += 1;
        Ok(())
    }
}

// ============================================================================
// MemoryQueue
// ============================================================================

/// Drainable in-memory job queue.
///
/// Tasks are held JSON-encoded, the shape a real queue transports; the
/// worker side is simulated by [`MemoryQueue::drain`].
pub struct MemoryQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    payloads: Mutex<Vec<String>>,
    next_handle: AtomicU64,
    closed: AtomicBool,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(QueueInner {
                payloads: Mutex::new(Vec::new()),
                next_handle: AtomicU64::new(1),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Make every future enqueue fail, simulating an unavailable queue.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.inner.payloads.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every queued task, decoded, in enqueue order.
    pub fn drain(&self) -> Result<Vec<RefreshTask>> {
        let payloads: Vec<String> = self.inner.payloads.lock().drain(..).collect();
        payloads
            .iter()
            .map(|p| {
                serde_json::from_str(p)
                    .map_err(|e| Error::Store(format!("task payload decode failed: {e}")))
            })
            .collect()
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn enqueue(&self, task: RefreshTask) -> Result<TaskHandle> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(Error::EnqueueFailed("queue is closed".to_string()));
        }
        let payload = serde_json::to_string(&task)
            .map_err(|e| Error::EnqueueFailed(format!("task payload encode failed: {e}")))?;
        self.inner.payloads.lock().push(payload);
        let handle = self.inner.next_handle.fetch_add(1, Ordering::Relaxed);
        Ok(TaskHandle(handle))
    }
}

// ============================================================================
// Tests
// ============================================================================
