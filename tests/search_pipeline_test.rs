// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! End-to-end indexing pipeline tests: store -> document builder -> backend,
//! all in-process against the mock backend.

mod common;

use common::{draft_post, published_post, tool, MockBackend};
use portal_search::models::content::ContentType;
use portal_search::services::index_manager::{IndexManager, DEFAULT_BATCH_SIZE};
use portal_search::services::registry::ContentRegistry;
use portal_search::services::store::MemoryStore;
use std::sync::Arc;

fn manager(backend: Arc<MockBackend>, store: Arc<MemoryStore>) -> IndexManager {
    IndexManager::new(Arc::new(ContentRegistry::with_defaults()), backend, store)
}

#[tokio::test]
async fn test_reindex_type_counts_visible_and_skipped() {
    let store = Arc::new(MemoryStore::new(vec![
        published_post(1, "First", "rust"),
        draft_post(2, "Unpublished"),
        published_post(3, "Third", "web"),
    ]));
    let backend = Arc::new(MockBackend::default());
    let mgr = manager(backend.clone(), store);

    let report = mgr.reindex_by_type(ContentType::Post).await.unwrap();
    assert_eq!(report.indexed, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);

    let ids = backend.document_ids();
    assert!(ids.contains(&"Post:1".to_string()));
    assert!(ids.contains(&"Post:3".to_string()));
    assert!(!ids.contains(&"Post:2".to_string()));
}

#[tokio::test]
async fn test_reindex_all_covers_every_type() {
    let store = Arc::new(MemoryStore::new(vec![
        published_post(1, "Article", ""),
        tool(2, "Widget"),
    ]));
    let backend = Arc::new(MockBackend::default());
    let mgr = manager(backend.clone(), store);

    let reports = mgr.reindex_all().await;
    assert_eq!(reports.len(), 3);
    assert_eq!(reports["Post"].indexed, 1);
    assert_eq!(reports["Tool"].indexed, 1);
    assert_eq!(reports["Resource"].indexed, 0);

    let ids = backend.document_ids();
    assert_eq!(ids.len(), 2);
}

#[tokio::test]
async fn test_reindex_is_idempotent() {
    let store = Arc::new(MemoryStore::new(vec![published_post(1, "Once", "")]));
    let backend = Arc::new(MockBackend::default());
    let mgr = manager(backend.clone(), store);

    mgr.reindex_by_type(ContentType::Post).await.unwrap();
    mgr.reindex_by_type(ContentType::Post).await.unwrap();

    // Same id upserts; the index never grows on re-submission.
    assert_eq!(backend.document_ids(), vec!["Post:1".to_string()]);
}

#[tokio::test]
async fn test_delete_after_index_removes_document() {
    let store = Arc::new(MemoryStore::new(vec![published_post(5, "Gone soon", "")]));
    let backend = Arc::new(MockBackend::default());
    let mgr = manager(backend.clone(), store);

    mgr.reindex_by_type(ContentType::Post).await.unwrap();
    assert_eq!(backend.document_ids(), vec!["Post:5".to_string()]);

    assert!(mgr.delete_one(ContentType::Post, 5).await);
    assert!(backend.document_ids().is_empty());
}

#[tokio::test]
async fn test_bulk_index_with_failing_backend_reports_failed() {
    let records: Vec<_> = (1..=5).map(|i| published_post(i, "Post", "")).collect();
    let backend = Arc::new(MockBackend::failing());
    let mgr = manager(backend, Arc::new(MemoryStore::default()));

    let report = mgr
        .bulk_index(&records, DEFAULT_BATCH_SIZE, None, None)
        .await;
    assert_eq!(report.indexed, 0);
    assert_eq!(report.failed, 5);
    assert_eq!(report.skipped, 0);
}

#[tokio::test]
async fn test_configure_index_applies_settings() {
    let backend = Arc::new(MockBackend::default());
    let mgr = manager(backend.clone(), Arc::new(MemoryStore::default()));

    assert!(mgr.configure_index().await);
    let applied = backend.settings_applied.lock().unwrap();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].searchable_attributes[0], "fields.title");
}

#[tokio::test]
async fn test_indexed_documents_are_sanitized() {
    let mut record = published_post(1, "A <b>styled</b> title", "");
    record.description = Some("<p>plain</p><script>alert(1)</script>".to_string());
    let store = Arc::new(MemoryStore::new(vec![record]));
    let backend = Arc::new(MockBackend::default());
    let mgr = manager(backend.clone(), store);

    mgr.reindex_by_type(ContentType::Post).await.unwrap();

    let documents = backend.documents.lock().unwrap();
    let document = &documents[0];
    assert_eq!(document.text("title"), Some("A styled title"));
    assert_eq!(document.text("description"), Some("plain"));
    assert!(!document.excerpt.contains("alert"));
}
