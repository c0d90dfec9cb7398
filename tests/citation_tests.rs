//! Concurrency and determinism tests for the citation registry.

mod common;

use coral::citations::CitationRegistry;
use coral::snapshot::PipelineSnapshot;
use coral::queue::TopicQueue;
use coral::types::{Citation, ToolKind, ToolOutput};
use futures::future::join_all;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

fn paper(registry: &CitationRegistry, topic_id: u64, dedup_key: Option<&str>) -> Citation {
    let id = registry.next_topic_id(topic_id);
    Citation::from_output(
        &id,
        ToolKind::PaperSearch,
        &ToolOutput {
            payload: json!({ "title": "A paper", "doi": "10.1/xyz" }),
            summary: "hit".into(),
            dedup_key: dedup_key.map(String::from),
        },
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_two_workers_on_the_same_topic_get_distinct_sequential_ids() {
    let registry = Arc::new(CitationRegistry::new());

    let (a, b) = tokio::join!(
        {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.next_topic_id(3).key().to_string() })
        },
        {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.next_topic_id(3).key().to_string() })
        }
    );

    let issued: HashSet<String> = [a.unwrap(), b.unwrap()].into_iter().collect();
    let expected: HashSet<String> =
        ["CIT-3-01".to_string(), "CIT-3-02".to_string()].into_iter().collect();
    assert_eq!(issued, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issuance_across_scopes_is_pairwise_distinct() {
    let registry = Arc::new(CitationRegistry::new());

    let handles = (0..6u64).map(|worker| {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            let mut keys = Vec::new();
            for _ in 0..40 {
                // Workers 0/1 hammer topic 1, the rest mix scopes.
                let id = match worker {
                    0 | 1 => registry.next_topic_id(1),
                    2 => registry.next_plan_id(),
                    w => registry.next_topic_id(w),
                };
                keys.push(id.key().to_string());
                tokio::task::yield_now().await;
            }
            keys
        })
    });

    let all: Vec<String> = join_all(handles)
        .await
        .into_iter()
        .flat_map(|joined| joined.unwrap())
        .collect();
    let issued = all.len();
    let distinct: HashSet<String> = all.into_iter().collect();
    assert_eq!(distinct.len(), issued, "citation ids must never collide");
}

#[test]
fn test_repeat_source_collapses_to_one_ref_number() {
    let registry = CitationRegistry::new();
    let first = paper(&registry, 1, Some("doi:10.1/xyz"));
    let second = paper(&registry, 2, Some("doi:10.1/xyz"));
    registry.register(first).unwrap();
    registry.register(second).unwrap();

    let map = registry.build_ref_number_map();
    assert_eq!(map["CIT-1-01"], map["CIT-2-01"]);
    assert_eq!(map["CIT-1-01"], 1);
}

#[test]
fn test_numbering_is_independent_of_registration_order() {
    let build = |order: &[u64]| {
        let registry = CitationRegistry::new();
        // One citation per topic scope; registration follows `order`, which
        // models workers finishing in different real-time sequences.
        for &topic in order {
            let citation = paper(&registry, topic, None);
            registry.register(citation).unwrap();
        }
        registry.build_ref_number_map()
    };

    // Same registered set, different completion order.
    assert_eq!(build(&[1, 2, 3]), build(&[3, 1, 2]));
    let map = build(&[2, 3, 1]);
    assert_eq!(map["CIT-1-01"], 1);
    assert_eq!(map["CIT-2-01"], 2);
    assert_eq!(map["CIT-3-01"], 3);
}

#[test]
fn test_snapshot_reload_reproduces_the_ref_number_map() {
    let queue = TopicQueue::new(4, 3);
    queue.enqueue("alpha", None).unwrap();
    let claimed = queue.claim_next().unwrap();
    queue.complete(claimed).unwrap();

    let registry = CitationRegistry::new();
    registry.register(paper(&registry, 0, Some("doi:10.1/xyz"))).unwrap();
    registry.register(paper(&registry, 0, None)).unwrap();
    let expected = registry.build_ref_number_map();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.snapshot.json");
    PipelineSnapshot::capture("alpha", &queue, &registry)
        .save(&path)
        .unwrap();

    let restored = PipelineSnapshot::load(&path).unwrap().restore_registry().unwrap();
    assert_eq!(restored.build_ref_number_map(), expected);
}
