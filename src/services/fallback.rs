// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! In-process keyword search used when the external search service is down.
//!
//! Deliberately simple: substring matching over freshly built documents with
//! weighted scoring from the registry. No inverted index, no typo tolerance.
//! A degraded store for one content type costs only that type's results.

use crate::error::SearchError;
use crate::models::content::ContentType;
use crate::models::document::{FieldValue, SearchDocument};
use crate::services::builder::DocumentBuilder;
use crate::services::registry::ContentRegistry;
use crate::services::store::ContentStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Queries shorter than this (after trimming) return empty results without
/// touching the store.
const MIN_QUERY_LENGTH: usize = 2;

/// Flat score bonus for a keyword matching a tag, before the type weight.
const TAG_BONUS: f32 = 5.0;

const MAX_TAG_SUGGESTIONS: usize = 5;
const MAX_CATEGORY_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone)]
pub struct FallbackHit {
    pub document: SearchDocument,
    pub score: f32,
}

#[derive(Debug, Clone, Default)]
pub struct FallbackResults {
    pub results: Vec<FallbackHit>,
    pub total_count: usize,
    pub suggestions: Vec<String>,
}

pub struct FallbackEngine {
    registry: Arc<ContentRegistry>,
    store: Arc<dyn ContentStore>,
    builder: DocumentBuilder,
}

impl FallbackEngine {
    pub fn new(registry: Arc<ContentRegistry>, store: Arc<dyn ContentStore>) -> Self {
        Self {
            builder: DocumentBuilder::new(registry.clone()),
            registry,
            store,
        }
    }

    /// Search visible records of the allowed types (all registered types when
    /// `None`). Zero-score documents are excluded; the rest are sorted by
    /// descending score with registration order preserved on ties.
    pub async fn search(
        &self,
        query: &str,
        allowed_types: Option<&[ContentType]>,
        limit: usize,
    ) -> FallbackResults {
        let trimmed = query.trim();
        if trimmed.chars().count() < MIN_QUERY_LENGTH {
            return FallbackResults::default();
        }

        let keywords = extract_keywords(trimmed);
        if keywords.is_empty() {
            return FallbackResults::default();
        }

        let mut hits = Vec::new();
        for entry in self.registry.entries() {
            if allowed_types.is_some_and(|types| !types.contains(&entry.content_type)) {
                continue;
            }

            let records = match self.store.fetch_visible(entry.content_type).await {
                Ok(records) => records,
                Err(e) => {
                    let fault = SearchError::FallbackQuery {
                        content_type: entry.content_type.to_string(),
                        message: e.to_string(),
                    };
                    warn!(error = %fault, "Fallback search skipping unavailable content type");
                    continue;
                }
            };

            for record in &records {
                let Some(document) = self.builder.build(record) else {
                    continue;
                };
                let score = self.score(entry.content_type, &document, &keywords);
                if score > 0.0 {
                    hits.push(FallbackHit { document, score });
                }
            }
        }

        // Stable sort keeps registration order on equal scores.
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let total_count = hits.len();
        let suggestions = self.suggestions(trimmed, &keywords, &hits);
        hits.truncate(limit);

        FallbackResults {
            results: hits,
            total_count,
            suggestions,
        }
    }

    /// Weighted keyword scoring: for every registered field, each keyword
    /// found as a substring adds the field weight (tags add a flat bonus per
    /// matching keyword). The total is scaled by the type weight.
    fn score(
        &self,
        content_type: ContentType,
        document: &SearchDocument,
        keywords: &[String],
    ) -> f32 {
        let Some(entry) = self.registry.get(content_type) else {
            return 0.0;
        };

        let mut score = 0.0f32;
        for rule in entry.fields {
            match document.fields.get(rule.name) {
                Some(FieldValue::Text(text)) => {
                    let haystack = text.to_lowercase();
                    for keyword in keywords {
                        if haystack.contains(keyword.as_str()) {
                            score += rule.weight;
                        }
                    }
                }
                Some(FieldValue::Tags(tags)) => {
                    for tag in tags {
                        let tag = tag.to_lowercase();
                        for keyword in keywords {
                            if tag.contains(keyword.as_str()) {
                                score += TAG_BONUS;
                            }
                        }
                    }
                }
                None => {}
            }
        }

        score * entry.type_weight
    }

    /// Refinement suggestions from the top results: frequent tags not already
    /// in the query, then category scoping when results span several labels.
    fn suggestions(&self, query: &str, keywords: &[String], hits: &[FallbackHit]) -> Vec<String> {
        let query_lower = query.to_lowercase();
        let top = &hits[..hits.len().min(10)];

        let mut tag_counts: HashMap<String, usize> = HashMap::new();
        let mut first_casing: HashMap<String, String> = HashMap::new();
        for hit in top {
            if let Some(tags) = hit.document.tags("tags") {
                for tag in tags {
                    let key = tag.to_lowercase();
                    if query_lower.contains(&key) || keywords.contains(&key) {
                        continue;
                    }
                    *tag_counts.entry(key.clone()).or_insert(0) += 1;
                    first_casing.entry(key).or_insert_with(|| tag.clone());
                }
            }
        }

        let mut ranked: Vec<(String, usize)> = tag_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut suggestions: Vec<String> = ranked
            .into_iter()
            .take(MAX_TAG_SUGGESTIONS)
            .map(|(key, _)| format!("{} {}", query, first_casing[&key]))
            .collect();

        let mut labels: Vec<&str> = top
            .iter()
            .filter_map(|hit| hit.document.category_label.as_deref())
            .collect();
        labels.sort_unstable();
        labels.dedup();
        if labels.len() > 1 {
            for label in labels.into_iter().take(MAX_CATEGORY_SUGGESTIONS) {
                suggestions.push(format!("{} in {}", query, label));
            }
        }

        suggestions
    }
}

/// Normalize a query into lowercase keywords: strip everything but
/// alphanumerics, underscores, hyphens, and whitespace; keep tokens of two or
/// more characters; include the full phrase when the query has several
/// tokens so exact phrase matches outrank single-word ones.
fn extract_keywords(query: &str) -> Vec<String> {
    let cleaned: String = query
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let mut keywords: Vec<String> = cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() >= MIN_QUERY_LENGTH)
        .map(str::to_string)
        .collect();

    if keywords.len() > 1 {
        let phrase = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        keywords.push(phrase);
    }
    keywords
}
