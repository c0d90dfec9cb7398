//! Citation registry: scoped id issuance, dedup, and deterministic numbering.
//!
//! The registry is the only authority for citation identifiers. Ids are
//! issued in two scopes: a global planning scope (`PLAN-NN`) and one scope
//! per topic block (`CIT-<topic>-NN`). Issuance, registration, and the
//! counters behind them live under a single mutex, so every operation is
//! linearizable: concurrent issuance in one scope never returns equal
//! values, and no caller observes a half-registered citation.
//!
//! Final reference numbers are computed by
//! [`build_ref_number_map`](CitationRegistry::build_ref_number_map), a pure
//! function of the registered set, independent of the real-time order in
//! which workers completed.

use crate::types::{Citation, CitationId, PipelineError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Serializable image of the registry: counters plus every citation.
///
/// Reloading a snapshot reproduces an identical
/// [`build_ref_number_map`](CitationRegistry::build_ref_number_map) output
/// for the same registered set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Global plan-scope counter.
    pub plan_counter: u32,
    /// Per-topic counters.
    pub topic_counters: HashMap<u64, u32>,
    /// All registered citations, ordered by scope.
    pub citations: Vec<Citation>,
}

struct RegistryInner {
    plan_counter: u32,
    topic_counters: HashMap<u64, u32>,
    citations: Vec<Citation>,
    index: HashMap<String, usize>,
}

/// Issues scoped monotonic citation identifiers, deduplicates repeat
/// sources, and computes the deterministic final numbering.
pub struct CitationRegistry {
    inner: Mutex<RegistryInner>,
}

impl Default for CitationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CitationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                plan_counter: 0,
                topic_counters: HashMap::new(),
                citations: Vec::new(),
                index: HashMap::new(),
            }),
        }
    }

    /// Issues the next id in the global plan scope, e.g. `PLAN-01`.
    ///
    /// The counter advances immediately; an id discarded after a failed tool
    /// call leaves a gap and is never reused.
    pub fn next_plan_id(&self) -> CitationId {
        let mut inner = self.inner.lock();
        inner.plan_counter += 1;
        CitationId::plan(inner.plan_counter)
    }

    /// Issues the next id in one topic's scope, e.g. `CIT-3-01`.
    pub fn next_topic_id(&self, topic_id: u64) -> CitationId {
        let mut inner = self.inner.lock();
        let counter = inner.topic_counters.entry(topic_id).or_insert(0);
        *counter += 1;
        CitationId::topic(topic_id, *counter)
    }

    /// Inserts a fully-formed citation keyed by its id.
    ///
    /// Re-registering an id is a fatal [`PipelineError::DuplicateCitation`].
    /// A repeated `dedup_key` is legal: both citations persist and collapse
    /// to one reference number at numbering time.
    pub fn register(&self, citation: Citation) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.index.contains_key(&citation.citation_id) {
            return Err(PipelineError::DuplicateCitation(citation.citation_id));
        }
        debug!(
            citation_id = %citation.citation_id,
            tool = %citation.tool,
            dedup_key = ?citation.dedup_key,
            "citation registered"
        );
        let slot = inner.citations.len();
        inner.index.insert(citation.citation_id.clone(), slot);
        inner.citations.push(citation);
        Ok(())
    }

    /// Number of registered citations.
    pub fn len(&self) -> usize {
        self.inner.lock().citations.len()
    }

    /// True iff nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A copy of one citation, if registered.
    pub fn get(&self, citation_id: &str) -> Option<Citation> {
        let inner = self.inner.lock();
        inner
            .index
            .get(citation_id)
            .map(|&slot| inner.citations[slot].clone())
    }

    /// Copies of all citations, ordered by scope.
    pub fn all_citations(&self) -> Vec<Citation> {
        let inner = self.inner.lock();
        let mut citations = inner.citations.clone();
        citations.sort_by_key(|c| c.scope);
        citations
    }

    /// Computes the deterministic mapping `citation_id -> ref_number`.
    ///
    /// Order: plan citations first by sequence, then topic citations by
    /// (topic id, within-topic sequence); numbers are sequential and
    /// 1-based. When several citations share a `dedup_key`, only the first
    /// in that order receives a fresh number; the rest reuse it.
    ///
    /// Pure with respect to the registered set: two computations over the
    /// same set agree exactly.
    pub fn build_ref_number_map(&self) -> BTreeMap<String, u32> {
        let inner = self.inner.lock();
        Self::number(&inner.citations)
    }

    /// Stamps each stored citation with its final `ref_number` and returns
    /// the mapping. Called once, by the reporting phase, after the
    /// registered set is frozen.
    pub fn apply_ref_numbers(&self) -> BTreeMap<String, u32> {
        let mut inner = self.inner.lock();
        let map = Self::number(&inner.citations);
        for citation in inner.citations.iter_mut() {
            citation.ref_number = map.get(&citation.citation_id).copied();
        }
        map
    }

    fn number(citations: &[Citation]) -> BTreeMap<String, u32> {
        let mut ordered: Vec<&Citation> = citations.iter().collect();
        ordered.sort_by_key(|c| c.scope);

        let mut map = BTreeMap::new();
        let mut by_source: HashMap<&str, u32> = HashMap::new();
        let mut next = 1u32;
        for citation in ordered {
            let number = match citation.dedup_key.as_deref() {
                Some(key) => *by_source.entry(key).or_insert_with(|| {
                    let fresh = next;
                    next += 1;
                    fresh
                }),
                None => {
                    let fresh = next;
                    next += 1;
                    fresh
                }
            };
            map.insert(citation.citation_id.clone(), number);
        }
        map
    }

    /// Serializable image of counters and citations.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let inner = self.inner.lock();
        let mut citations = inner.citations.clone();
        citations.sort_by_key(|c| c.scope);
        RegistrySnapshot {
            plan_counter: inner.plan_counter,
            topic_counters: inner.topic_counters.clone(),
            citations,
        }
    }

    /// Rebuilds a registry from a snapshot.
    ///
    /// Fails with [`PipelineError::DuplicateCitation`] if the snapshot
    /// carries a repeated citation id.
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Result<Self> {
        let mut index = HashMap::new();
        for (slot, citation) in snapshot.citations.iter().enumerate() {
            if index
                .insert(citation.citation_id.clone(), slot)
                .is_some()
            {
                return Err(PipelineError::DuplicateCitation(
                    citation.citation_id.clone(),
                ));
            }
        }
        Ok(Self {
            inner: Mutex::new(RegistryInner {
                plan_counter: snapshot.plan_counter,
                topic_counters: snapshot.topic_counters,
                citations: snapshot.citations,
                index,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CitationScope, ToolKind, ToolOutput};
    use serde_json::json;

    fn citation(id: &CitationId, dedup_key: Option<&str>) -> Citation {
        Citation::from_output(
            id,
            ToolKind::PaperSearch,
            &ToolOutput {
                payload: json!({"title": "A paper"}),
                summary: "one hit".into(),
                dedup_key: dedup_key.map(String::from),
            },
        )
    }

    #[test]
    fn test_ids_are_strictly_increasing_per_scope() {
        let registry = CitationRegistry::new();
        assert_eq!(registry.next_plan_id().key(), "PLAN-01");
        assert_eq!(registry.next_plan_id().key(), "PLAN-02");
        assert_eq!(registry.next_topic_id(3).key(), "CIT-3-01");
        assert_eq!(registry.next_topic_id(3).key(), "CIT-3-02");
        // Independent scope
        assert_eq!(registry.next_topic_id(4).key(), "CIT-4-01");
    }

    #[test]
    fn test_concurrent_issuance_never_duplicates() {
        use std::sync::Arc;

        let registry = Arc::new(CitationRegistry::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(std::thread::spawn(move || {
                (0..50)
                    .map(|_| registry.next_topic_id(3).key().to_string())
                    .collect::<Vec<_>>()
            }));
        }

        let mut all: Vec<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let issued = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), issued, "duplicate citation id issued");
    }

    #[test]
    fn test_register_rejects_duplicate_id() {
        let registry = CitationRegistry::new();
        let id = registry.next_plan_id();
        registry.register(citation(&id, None)).unwrap();

        let err = registry.register(citation(&id, None)).unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateCitation(ref key) if key == "PLAN-01"));
        assert!(err.is_fatal());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_ref_numbers_order_plan_then_topics() {
        let registry = CitationRegistry::new();
        // Register out of numbering order on purpose.
        let t2 = registry.next_topic_id(2);
        let plan = registry.next_plan_id();
        let t1a = registry.next_topic_id(1);
        let t1b = registry.next_topic_id(1);
        for id in [&t2, &plan, &t1a, &t1b] {
            registry.register(citation(id, None)).unwrap();
        }

        let map = registry.build_ref_number_map();
        assert_eq!(map["PLAN-01"], 1);
        assert_eq!(map["CIT-1-01"], 2);
        assert_eq!(map["CIT-1-02"], 3);
        assert_eq!(map["CIT-2-01"], 4);
    }

    #[test]
    fn test_shared_dedup_key_collapses_to_one_ref_number() {
        let registry = CitationRegistry::new();
        let a = registry.next_topic_id(1);
        let b = registry.next_topic_id(2);
        let c = registry.next_topic_id(2);
        registry
            .register(citation(&a, Some("doi:10.1/xyz")))
            .unwrap();
        registry
            .register(citation(&b, Some("doi:10.1/xyz")))
            .unwrap();
        registry.register(citation(&c, None)).unwrap();

        let map = registry.build_ref_number_map();
        assert_eq!(map["CIT-1-01"], 1);
        assert_eq!(map["CIT-2-01"], 1, "repeat source must reuse the number");
        assert_eq!(map["CIT-2-02"], 2, "numbering stays sequential after a collapse");
    }

    #[test]
    fn test_numbering_is_pure() {
        let registry = CitationRegistry::new();
        for topic in [5u64, 1, 3] {
            let id = registry.next_topic_id(topic);
            registry.register(citation(&id, None)).unwrap();
        }
        assert_eq!(registry.build_ref_number_map(), registry.build_ref_number_map());
    }

    #[test]
    fn test_discarded_id_leaves_gap_without_breaking_order() {
        let registry = CitationRegistry::new();
        let first = registry.next_topic_id(1);
        let _discarded = registry.next_topic_id(1); // tool call failed, never registered
        let third = registry.next_topic_id(1);
        registry.register(citation(&first, None)).unwrap();
        registry.register(citation(&third, None)).unwrap();

        let map = registry.build_ref_number_map();
        assert_eq!(map["CIT-1-01"], 1);
        assert_eq!(map["CIT-1-03"], 2);
        assert!(!map.contains_key("CIT-1-02"));
    }

    #[test]
    fn test_snapshot_round_trip_preserves_numbering_and_counters() {
        let registry = CitationRegistry::new();
        let plan = registry.next_plan_id();
        let a = registry.next_topic_id(1);
        let b = registry.next_topic_id(2);
        registry.register(citation(&plan, None)).unwrap();
        registry.register(citation(&a, Some("doi:10.1/xyz"))).unwrap();
        registry.register(citation(&b, Some("doi:10.1/xyz"))).unwrap();

        let expected = registry.build_ref_number_map();
        let snapshot = registry.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored =
            CitationRegistry::from_snapshot(serde_json::from_str(&json).unwrap()).unwrap();

        assert_eq!(restored.build_ref_number_map(), expected);
        // Counters resume where they left off.
        assert_eq!(restored.next_topic_id(1).key(), "CIT-1-02");
        assert_eq!(restored.next_plan_id().key(), "PLAN-02");
    }

    #[test]
    fn test_apply_ref_numbers_stamps_citations() {
        let registry = CitationRegistry::new();
        let id = registry.next_plan_id();
        registry.register(citation(&id, None)).unwrap();

        registry.apply_ref_numbers();
        let stamped = registry.get("PLAN-01").unwrap();
        assert_eq!(stamped.ref_number, Some(1));
        assert_eq!(stamped.scope, CitationScope::Plan { seq: 1 });
    }
}
