//! End-to-end retrieval behavior over the local hashing embedder

use std::sync::Arc;

use tabletalk_core::{builtin_cards, SchemaCard};
use tabletalk_embed::HashEmbedder;
use tabletalk_index::{ExactBackend, IndexBackend, IndexError, PersistedBackend, VectorIndex};

fn backends() -> Vec<Box<dyn IndexBackend>> {
    vec![Box::new(ExactBackend)]
}

#[tokio::test]
async fn query_returns_at_most_k_descending() {
    let cards = builtin_cards();
    let total = cards.len();
    let index = VectorIndex::build(cards, Arc::new(HashEmbedder::new(384)), &backends())
        .await
        .unwrap();
    assert_eq!(index.len(), total);
    assert_eq!(index.active_backend(), "exact-memory");

    let results = index.query("current salary of employees", 3).await.unwrap();
    assert!(results.len() <= 3);
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    // k larger than the corpus returns everything, still ordered.
    let all = index.query("departments", 100).await.unwrap();
    assert_eq!(all.len(), total);
}

#[tokio::test]
async fn employee_count_question_retrieves_employees_card() {
    let index = VectorIndex::build(
        builtin_cards(),
        Arc::new(HashEmbedder::new(384)),
        &backends(),
    )
    .await
    .unwrap();

    let results = index.query("How many employees are there?", 3).await.unwrap();
    assert!(
        results.iter().any(|r| r.card.table == "employees"),
        "employees card missing from top-3: {:?}",
        results.iter().map(|r| &r.card.table).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn equal_scores_keep_insertion_order() {
    // Identical content embeds to identical vectors, so scores tie exactly.
    let cards = vec![
        SchemaCard::new("first", "Table: duplicated content"),
        SchemaCard::new("second", "Table: duplicated content"),
        SchemaCard::new("third", "Table: duplicated content"),
    ];
    let index = VectorIndex::build(cards, Arc::new(HashEmbedder::new(128)), &backends())
        .await
        .unwrap();

    let results = index.query("duplicated content", 3).await.unwrap();
    let order: Vec<&str> = results.iter().map(|r| r.card.table.as_str()).collect();
    assert_eq!(order, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn empty_corpus_is_a_build_error() {
    let result = VectorIndex::build(vec![], Arc::new(HashEmbedder::new(64)), &backends()).await;
    assert!(matches!(result, Err(IndexError::EmptyCorpus)));
}

#[tokio::test]
async fn build_falls_back_to_memory_when_persistence_fails() {
    let dir = tempfile::tempdir().unwrap();
    let blocked = dir.path().join("blocked");
    std::fs::write(&blocked, "occupied").unwrap();

    // Persisted backend points at a path occupied by a plain file and
    // fails; the in-memory backend takes over.
    let chain: Vec<Box<dyn IndexBackend>> = vec![
        Box::new(PersistedBackend::new(&blocked)),
        Box::new(ExactBackend),
    ];
    let index = VectorIndex::build(builtin_cards(), Arc::new(HashEmbedder::new(64)), &chain)
        .await
        .unwrap();
    assert_eq!(index.active_backend(), "exact-memory");
}

#[tokio::test]
async fn build_reports_when_all_backends_fail() {
    let dir = tempfile::tempdir().unwrap();
    let blocked = dir.path().join("blocked");
    std::fs::write(&blocked, "occupied").unwrap();

    let chain: Vec<Box<dyn IndexBackend>> = vec![Box::new(PersistedBackend::new(&blocked))];
    let err = VectorIndex::build(builtin_cards(), Arc::new(HashEmbedder::new(64)), &chain)
        .await
        .err()
        .expect("build should fail with no working backend");

    match err {
        IndexError::AllBackendsFailed { failures } => {
            assert_eq!(failures.len(), 1);
            assert!(failures[0].starts_with("file-persisted:"));
        }
        other => panic!("expected AllBackendsFailed, got {other}"),
    }
}

#[tokio::test]
async fn persisted_backend_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let chain: Vec<Box<dyn IndexBackend>> = vec![Box::new(PersistedBackend::new(dir.path()))];

    let index = VectorIndex::build(builtin_cards(), Arc::new(HashEmbedder::new(64)), &chain)
        .await
        .unwrap();
    assert_eq!(index.active_backend(), "file-persisted");

    let reloaded = PersistedBackend::new(dir.path()).load().unwrap();
    assert_eq!(reloaded.len(), index.len());
    assert!(reloaded.iter().all(|e| e.vector.len() == 64));
}
