// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::document::SearchDocument;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Query-string parameters of the search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQueryParams {
    pub q: String,
    /// Comma-separated content-type names, e.g. "Post,Tool".
    pub types: Option<String>,
    pub category: Option<String>,
    pub kind: Option<String>,
    /// Logical sort field: date, rating, views, title, relevance.
    pub sort: Option<String>,
    /// "asc" or "desc"; only meaningful together with `sort`.
    pub order: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// One formatted search hit returned to API consumers. An explicit value
/// type constructed from the search document — nothing duck-typed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub content_type: String,
    pub title: String,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_label: Option<String>,
}

impl SearchHit {
    pub fn from_document(document: &SearchDocument) -> Self {
        Self {
            id: document.id.clone(),
            content_type: document.content_type.to_string(),
            title: document.text("title").unwrap_or_default().to_string(),
            excerpt: document.excerpt.clone(),
            url: document.url.clone(),
            tags: document
                .tags("tags")
                .map(<[String]>::to_vec)
                .unwrap_or_default(),
            category_label: document.category_label.clone(),
        }
    }
}

/// Pagination metadata attached to every search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: usize,
    pub per_page: usize,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(page: usize, per_page: usize, total: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page as u64)
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// JSON response of the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    pub pagination: PaginationMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facets: Option<HashMap<String, HashMap<String, usize>>>,
    pub processing_time_ms: u64,
    /// Which engine answered: "meilisearch" or "fallback".
    pub engine: String,
    /// Query suggestions; populated only by the fallback engine.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// Outcome counts of one bulk indexing run. A failed batch is reported as a
/// unit: its size moves from `indexed` to `failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkIndexReport {
    pub indexed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Response of the admin reindex endpoints: one report per content type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReindexResponse {
    pub reports: std::collections::BTreeMap<String, BulkIndexReport>,
}

/// Response of the admin index-settings endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigureIndexResponse {
    pub success: bool,
}

/// Response of the health endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: crate::models::metrics::HealthStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_meta_total_pages() {
        let meta = PaginationMeta::new(1, 20, 41);
        assert_eq!(meta.total_pages, 3);

        let meta = PaginationMeta::new(1, 20, 40);
        assert_eq!(meta.total_pages, 2);

        let meta = PaginationMeta::new(1, 20, 0);
        assert_eq!(meta.total_pages, 0);
    }

    #[test]
    fn test_bulk_report_default_is_zero() {
        let report = BulkIndexReport::default();
        assert_eq!(report.indexed + report.skipped + report.failed, 0);
    }
}
