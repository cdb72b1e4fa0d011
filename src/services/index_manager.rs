// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Synchronizes content records into the external search index.
//!
//! Bulk indexing runs in two phases: a build phase that never touches the
//! network, then batched submissions with continue-on-error accounting. A
//! failed batch is reported as a unit; Meilisearch ingests each submission
//! atomically, so partial-batch success is not modeled.

use crate::error::SearchError;
use crate::models::content::{ContentRecord, ContentType};
use crate::models::document::SearchDocument;
use crate::models::search::BulkIndexReport;
use crate::services::builder::DocumentBuilder;
use crate::services::registry::ContentRegistry;
use crate::services::search::{IndexSettingsSpec, SearchBackend};
use crate::services::store::ContentStore;
use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::error::Elapsed;
use tokio::time::timeout;
use tracing::{error, info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default timeout applied to every external-service submission. A timeout
/// is treated like any other submission failure.
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Progress events emitted during `bulk_index`.
#[derive(Debug, Clone, Copy)]
pub enum BulkProgress {
    /// One record's document build finished (whether it produced a document
    /// or was skipped).
    Built { processed: usize, total: usize },
    /// One batch submission finished.
    BatchSubmitted {
        batch: usize,
        batches: usize,
        failed: bool,
    },
}

pub type ProgressFn<'a> = &'a (dyn Fn(BulkProgress) + Send + Sync);

pub struct IndexManager {
    registry: Arc<ContentRegistry>,
    builder: DocumentBuilder,
    backend: Arc<dyn SearchBackend>,
    store: Arc<dyn ContentStore>,
    submit_timeout: Duration,
}

impl IndexManager {
    pub fn new(
        registry: Arc<ContentRegistry>,
        backend: Arc<dyn SearchBackend>,
        store: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            builder: DocumentBuilder::new(registry.clone()),
            registry,
            backend,
            store,
            submit_timeout: SUBMIT_TIMEOUT,
        }
    }

    /// Index a single record. Returns false when the record built no
    /// document (skipped) or the submission failed; failures are logged and
    /// not retried synchronously.
    pub async fn index_one(&self, record: &ContentRecord) -> bool {
        let Some(document) = self.builder.build(record) else {
            return false;
        };
        self.submit(std::slice::from_ref(&document)).await
    }

    /// Delete a document by the same `{type}:{id}` key scheme used when
    /// indexing.
    pub async fn delete_one(&self, content_type: ContentType, record_id: i64) -> bool {
        let document_id = SearchDocument::compose_id(content_type, record_id);
        let outcome = timeout(
            self.submit_timeout,
            self.backend.delete_document(&document_id),
        )
        .await;
        match classify(outcome) {
            Ok(()) => true,
            Err(e) => {
                error!(document_id = %document_id, error = %e, "Failed to delete document");
                false
            }
        }
    }

    /// Build documents for all records, then submit them in fixed-size
    /// batches. Build errors never touch the network; batch failures mark
    /// the whole batch failed and processing continues. When `cancel` trips,
    /// no new batches are started and the report reflects only what was
    /// attempted.
    pub async fn bulk_index(
        &self,
        records: &[ContentRecord],
        batch_size: usize,
        progress: Option<ProgressFn<'_>>,
        cancel: Option<&AtomicBool>,
    ) -> BulkIndexReport {
        let batch_size = batch_size.max(1);

        // Phase 1: build every document sequentially, no network.
        let mut documents = Vec::new();
        let mut skipped = 0usize;
        for (processed, record) in records.iter().enumerate() {
            match self.builder.build(record) {
                Some(document) => documents.push(document),
                None => skipped += 1,
            }
            if let Some(report) = progress {
                report(BulkProgress::Built {
                    processed: processed + 1,
                    total: records.len(),
                });
            }
        }

        // Phase 2: submit batches, continue on error.
        let mut indexed = documents.len();
        let mut failed = 0usize;
        let batches: Vec<&[SearchDocument]> = documents.chunks(batch_size).collect();
        let total_batches = batches.len();

        for (number, batch) in batches.into_iter().enumerate() {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                // Unstarted batches were neither indexed nor failed.
                indexed -= batch.len();
                for remaining in number + 1..total_batches {
                    let start = remaining * batch_size;
                    indexed -= documents[start..].len().min(batch_size);
                }
                warn!(
                    submitted_batches = number,
                    total_batches, "Bulk indexing cancelled"
                );
                break;
            }

            let ok = self.submit(batch).await;
            if !ok {
                failed += batch.len();
                indexed -= batch.len();
            }
            if let Some(report) = progress {
                report(BulkProgress::BatchSubmitted {
                    batch: number + 1,
                    batches: total_batches,
                    failed: !ok,
                });
            }
        }

        BulkIndexReport {
            indexed,
            skipped,
            failed,
        }
    }

    /// Fetch every record of one content type and bulk-index it.
    pub async fn reindex_by_type(&self, content_type: ContentType) -> Result<BulkIndexReport> {
        let records = self.store.fetch_all(content_type).await?;
        info!(
            content_type = %content_type,
            records = records.len(),
            "Reindexing content type"
        );
        Ok(self
            .bulk_index(&records, DEFAULT_BATCH_SIZE, None, None)
            .await)
    }

    /// Reindex every registered content type. A type whose fetch fails is
    /// logged and omitted from the result map; the rest proceed.
    pub async fn reindex_all(&self) -> BTreeMap<String, BulkIndexReport> {
        let mut reports = BTreeMap::new();
        for entry in self.registry.entries() {
            match self.reindex_by_type(entry.content_type).await {
                Ok(report) => {
                    reports.insert(entry.content_type.to_string(), report);
                }
                Err(e) => {
                    error!(
                        content_type = %entry.content_type,
                        error = %e,
                        "Reindex failed for content type"
                    );
                }
            }
        }
        reports
    }

    /// Push the static index configuration. Idempotent; safe to call at
    /// every startup.
    pub async fn configure_index(&self) -> bool {
        let settings = index_settings();
        let outcome = timeout(self.submit_timeout, self.backend.apply_settings(&settings)).await;
        match classify(outcome) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to configure index");
                false
            }
        }
    }

    async fn submit(&self, batch: &[SearchDocument]) -> bool {
        let outcome = timeout(self.submit_timeout, self.backend.add_documents(batch)).await;
        match classify(outcome) {
            Ok(()) => true,
            Err(e) => {
                error!(batch_size = batch.len(), error = %e, "Batch submission failed");
                false
            }
        }
    }
}

/// Classify a timed external-service call: backend errors and timeouts are
/// both indexing faults. Never surfaced to callers of bulk operations, only
/// logged and counted.
fn classify(outcome: Result<anyhow::Result<()>, Elapsed>) -> Result<(), SearchError> {
    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(SearchError::Indexing(e.to_string())),
        Err(_) => Err(SearchError::Indexing("submission timed out".to_string())),
    }
}

/// Static index configuration: searchable priority order, filter/sort
/// attributes, base relevance rules followed by descending custom boosts,
/// and a stop-word list.
pub fn index_settings() -> IndexSettingsSpec {
    IndexSettingsSpec {
        searchable_attributes: to_owned(&[
            "fields.title",
            "fields.tags",
            "fields.description",
            "fields.content",
            "excerpt",
        ]),
        filterable_attributes: to_owned(&[
            "content_type",
            "metadata.is_visible",
            "metadata.category",
            "metadata.kind",
            "metadata.featured",
        ]),
        sortable_attributes: to_owned(&[
            "metadata.published_at",
            "metadata.views",
            "metadata.rating",
            "fields.title",
        ]),
        displayed_attributes: to_owned(&[
            "id",
            "content_type",
            "record_id",
            "fields",
            "metadata",
            "url",
            "category_label",
            "category_icon",
            "excerpt",
        ]),
        ranking_rules: to_owned(&[
            "words",
            "typo",
            "proximity",
            "attribute",
            "sort",
            "exactness",
            "metadata.featured:desc",
            "metadata.views:desc",
            "metadata.rating:desc",
            "metadata.published_at:desc",
        ]),
        stop_words: to_owned(&[
            "a", "an", "and", "as", "at", "be", "by", "for", "from", "in", "is", "it", "of",
            "on", "or", "the", "to", "with",
        ]),
    }
}

fn to_owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}
