// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Meilisearch client wrapper and the backend contract it implements.
//!
//! The rest of the crate only sees `SearchBackend`, so the index manager and
//! monitor can be exercised against a mock without a live Meilisearch.

use crate::error::SearchError;
use crate::models::document::SearchDocument;
use crate::models::query::QuerySpec;
use anyhow::Result;
use async_trait::async_trait;
use meilisearch_sdk::client::Client;
use meilisearch_sdk::search::Selectors;
use meilisearch_sdk::settings::Settings;
use std::collections::HashMap;
use tracing::info;

/// Index configuration pushed by `configure_index`. Idempotent payload;
/// safe to apply repeatedly.
#[derive(Debug, Clone)]
pub struct IndexSettingsSpec {
    pub searchable_attributes: Vec<String>,
    pub filterable_attributes: Vec<String>,
    pub sortable_attributes: Vec<String>,
    pub displayed_attributes: Vec<String>,
    pub ranking_rules: Vec<String>,
    pub stop_words: Vec<String>,
}

/// Index-level statistics used by the health check.
#[derive(Debug, Clone, Copy)]
pub struct IndexStats {
    pub document_count: u64,
    pub is_indexing: bool,
}

/// Raw search outcome from the external service.
#[derive(Debug, Clone)]
pub struct BackendSearchResults {
    pub hits: Vec<SearchDocument>,
    pub estimated_total_hits: u64,
    pub processing_time_ms: u64,
    pub facet_distribution: Option<HashMap<String, HashMap<String, usize>>>,
}

/// The external document-search service, as seen by this crate.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Upsert documents keyed by the `id` primary key. Re-submitting an id
    /// overwrites, never duplicates.
    async fn add_documents(&self, documents: &[SearchDocument]) -> Result<()>;

    /// Delete one document by its `{content_type}:{record_id}` id.
    async fn delete_document(&self, document_id: &str) -> Result<()>;

    async fn search(&self, spec: &QuerySpec) -> Result<BackendSearchResults>;

    async fn apply_settings(&self, settings: &IndexSettingsSpec) -> Result<()>;

    async fn stats(&self) -> Result<IndexStats>;
}

/// Meilisearch client wrapper for indexing and searching content documents
#[derive(Debug)]
pub struct SearchClient {
    client: Client,
    index_name: String,
}

impl SearchClient {
    /// Create a new Meilisearch client. A malformed host/endpoint is a
    /// configuration fault and fatal at startup.
    pub fn new(
        host: &str,
        api_key: Option<String>,
        index_name: String,
    ) -> Result<Self, SearchError> {
        // Construct the full URL if only host:port is provided
        let url = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };
        url::Url::parse(&url).map_err(|e| {
            SearchError::Configuration(format!("invalid Meilisearch host '{}': {}", host, e))
        })?;

        let client = Client::new(&url, api_key).map_err(|e| {
            SearchError::Configuration(format!("failed to create Meilisearch client: {}", e))
        })?;

        info!(url = %url, index = %index_name, "Connected to Meilisearch");

        Ok(Self { client, index_name })
    }
}

#[async_trait]
impl SearchBackend for SearchClient {
    async fn add_documents(&self, documents: &[SearchDocument]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let index = self.client.index(&self.index_name);

        // Convert documents to JSON for indexing
        let doc_jsons: Vec<_> = documents
            .iter()
            .filter_map(|doc| serde_json::to_value(doc).ok())
            .collect();

        index
            .add_documents(&doc_jsons, Some("id"))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to index documents: {}", e))?;

        Ok(())
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        let index = self.client.index(&self.index_name);

        index
            .delete_document(document_id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to delete document: {}", e))?;

        Ok(())
    }

    async fn search(&self, spec: &QuerySpec) -> Result<BackendSearchResults> {
        let index = self.client.index(&self.index_name);

        let sort: Vec<&str> = spec.sort.iter().map(String::as_str).collect();
        let highlight: Vec<&str> = spec.highlight_fields.iter().map(String::as_str).collect();
        let facets: Vec<&str> = spec.facets.iter().map(String::as_str).collect();

        let mut query = index.search();
        query
            .with_query(&spec.q)
            .with_limit(spec.limit)
            .with_offset(spec.offset)
            .with_attributes_to_highlight(Selectors::Some(&highlight))
            .with_highlight_pre_tag(&spec.highlight_pre_tag)
            .with_highlight_post_tag(&spec.highlight_post_tag);
        if let Some(filter) = spec.filter.as_deref() {
            query.with_filter(filter);
        }
        if !sort.is_empty() {
            query.with_sort(&sort);
        }
        if !facets.is_empty() {
            query.with_facets(Selectors::Some(&facets));
        }

        let results = query
            .execute::<SearchDocument>()
            .await
            .map_err(|e| anyhow::anyhow!("Search failed: {}", e))?;

        Ok(BackendSearchResults {
            hits: results.hits.into_iter().map(|hit| hit.result).collect(),
            estimated_total_hits: results.estimated_total_hits.unwrap_or(0) as u64,
            processing_time_ms: results.processing_time_ms as u64,
            facet_distribution: results.facet_distribution,
        })
    }

    async fn apply_settings(&self, settings: &IndexSettingsSpec) -> Result<()> {
        let index = self.client.index(&self.index_name);

        let payload = Settings::new()
            .with_searchable_attributes(settings.searchable_attributes.clone())
            .with_filterable_attributes(settings.filterable_attributes.clone())
            .with_sortable_attributes(settings.sortable_attributes.clone())
            .with_displayed_attributes(settings.displayed_attributes.clone())
            .with_ranking_rules(settings.ranking_rules.clone())
            .with_stop_words(settings.stop_words.clone());

        index
            .set_settings(&payload)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to apply index settings: {}", e))?;

        info!(index = %self.index_name, "Applied Meilisearch index settings");

        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats> {
        let index = self.client.index(&self.index_name);

        let stats = index
            .get_stats()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to fetch index stats: {}", e))?;

        Ok(IndexStats {
            document_count: stats.number_of_documents as u64,
            is_indexing: stats.is_indexing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_normalizes_bare_host() {
        let client = SearchClient::new("127.0.0.1:7700", None, "content".to_string());
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_host_is_configuration_fault() {
        let err = SearchClient::new("http://", None, "content".to_string()).unwrap_err();
        assert!(matches!(err, SearchError::Configuration(_)));
    }

    #[tokio::test]
    #[ignore] // Requires Meilisearch running
    async fn test_stats_roundtrip() {
        let client = SearchClient::new("http://127.0.0.1:7700", None, "content".to_string())
            .expect("Failed to create client");
        let stats = client.stats().await;
        assert!(stats.is_ok());
    }
}
