// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Shared test doubles and record fixtures for the integration tests.

// Each test binary uses its own subset of these helpers.
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use portal_search::models::content::{ContentRecord, ContentType, TagInput};
use portal_search::models::document::SearchDocument;
use portal_search::models::query::QuerySpec;
use portal_search::services::search::{
    BackendSearchResults, IndexSettingsSpec, IndexStats, SearchBackend,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory search backend: stores submitted documents, records queries,
/// and can be switched into a failing state to exercise the fallback path.
#[derive(Default)]
pub struct MockBackend {
    pub documents: Mutex<Vec<SearchDocument>>,
    pub searches: Mutex<Vec<QuerySpec>>,
    pub settings_applied: Mutex<Vec<IndexSettingsSpec>>,
    pub fail_all: AtomicBool,
}

impl MockBackend {
    pub fn failing() -> Self {
        let backend = Self::default();
        backend.fail_all.store(true, Ordering::Relaxed);
        backend
    }

    pub fn document_ids(&self) -> Vec<String> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .map(|d| d.id.clone())
            .collect()
    }

    fn check(&self) -> Result<()> {
        if self.fail_all.load(Ordering::Relaxed) {
            anyhow::bail!("search backend unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl SearchBackend for MockBackend {
    async fn add_documents(&self, documents: &[SearchDocument]) -> Result<()> {
        self.check()?;
        let mut stored = self.documents.lock().unwrap();
        for document in documents {
            stored.retain(|d| d.id != document.id);
            stored.push(document.clone());
        }
        Ok(())
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        self.check()?;
        self.documents
            .lock()
            .unwrap()
            .retain(|d| d.id != document_id);
        Ok(())
    }

    async fn search(&self, spec: &QuerySpec) -> Result<BackendSearchResults> {
        self.check()?;
        self.searches.lock().unwrap().push(spec.clone());

        // Naive substring match over titles, enough for response-shape tests.
        let needle = spec.q.to_lowercase();
        let hits: Vec<SearchDocument> = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| {
                d.text("title")
                    .is_some_and(|t| t.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();

        let total = hits.len() as u64;
        Ok(BackendSearchResults {
            hits: hits
                .into_iter()
                .skip(spec.offset)
                .take(spec.limit)
                .collect(),
            estimated_total_hits: total,
            processing_time_ms: 1,
            facet_distribution: None,
        })
    }

    async fn apply_settings(&self, settings: &IndexSettingsSpec) -> Result<()> {
        self.check()?;
        self.settings_applied.lock().unwrap().push(settings.clone());
        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats> {
        self.check()?;
        Ok(IndexStats {
            document_count: self.documents.lock().unwrap().len() as u64,
            is_indexing: false,
        })
    }
}

pub fn published_post(id: i64, title: &str, tags: &str) -> ContentRecord {
    let mut record = ContentRecord::new(
        ContentType::Post,
        id,
        title,
        &format!("post-{}", id),
    );
    record.description = Some(format!("About {}", title));
    record.tags = TagInput::Csv(tags.to_string());
    record.published_at = Some(Utc::now() - Duration::hours(1));
    record
}

pub fn draft_post(id: i64, title: &str) -> ContentRecord {
    ContentRecord::new(ContentType::Post, id, title, &format!("post-{}", id))
}

pub fn tool(id: i64, title: &str) -> ContentRecord {
    let mut record = ContentRecord::new(ContentType::Tool, id, title, &format!("tool-{}", id));
    record.description = Some(format!("{} tool", title));
    record
}
