// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Turns one content record into a normalized, index-ready search document.
//!
//! Only two things stop document construction: a missing registry entry and
//! a false visibility check. Everything else degrades per-field — a missing
//! value becomes an empty string, an unresolvable URL becomes null.

use crate::models::content::{ContentRecord, TagInput};
use crate::models::document::{FieldValue, MetaValue, SearchDocument};
use crate::services::registry::{self, ContentRegistry, RegistryEntry, UrlRule};
use crate::services::sanitize::sanitize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::warn;

/// Tag lists are capped so one record cannot bloat the index.
const MAX_TAGS: usize = 20;

/// Derived excerpts are truncated to this many characters.
const EXCERPT_LENGTH: usize = 200;

#[derive(Clone)]
pub struct DocumentBuilder {
    registry: Arc<ContentRegistry>,
}

impl DocumentBuilder {
    pub fn new(registry: Arc<ContentRegistry>) -> Self {
        Self { registry }
    }

    /// Build the search document for `record`, or `None` when the record has
    /// no registry entry or fails its visibility check. The `None` path is
    /// how unpublished/soft-deleted records leave the index.
    pub fn build(&self, record: &ContentRecord) -> Option<SearchDocument> {
        let Some(entry) = self.registry.get(record.content_type) else {
            warn!(
                content_type = %record.content_type,
                record_id = record.id,
                "no registry entry for content type, skipping record"
            );
            return None;
        };

        if !(entry.visibility)(record) {
            return None;
        }

        let mut fields = BTreeMap::new();
        for rule in entry.fields {
            let value = if rule.tags {
                FieldValue::Tags(parse_tags(&record.tags))
            } else {
                let raw = record.text_field(rule.name).unwrap_or_default();
                FieldValue::Text(sanitize(raw, rule.mode))
            };
            fields.insert(rule.name.to_string(), value);
        }

        let mut metadata = BTreeMap::new();
        for name in entry.metadata_fields {
            if let Some(value) = metadata_value(record, name) {
                metadata.insert((*name).to_string(), value);
            }
        }

        let url = resolve_url(entry, record);
        let excerpt = derive_excerpt(&fields);

        Some(SearchDocument {
            id: SearchDocument::compose_id(record.content_type, record.id),
            content_type: record.content_type,
            record_id: record.id,
            fields,
            metadata,
            url,
            category_label: Some(entry.category_label.to_string()),
            category_icon: Some(entry.category_icon.to_string()),
            excerpt,
        })
    }
}

/// Parse a raw tag value into a trimmed, de-duplicated, capped list.
/// De-duplication is case-insensitive and keeps the first casing seen.
pub fn parse_tags(input: &TagInput) -> Vec<String> {
    let raw: Vec<String> = match input {
        TagInput::None => Vec::new(),
        TagInput::Csv(csv) => csv.split(',').map(str::to_string).collect(),
        TagInput::List(list) => list.clone(),
    };

    let mut seen = HashSet::new();
    let mut tags = Vec::new();
    for tag in raw {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            tags.push(trimmed.to_string());
            if tags.len() == MAX_TAGS {
                break;
            }
        }
    }
    tags
}

/// Convert one metadata field. Timestamps become epoch seconds; the author
/// becomes an id plus best-effort display name. Unknown or absent values are
/// omitted rather than failing the build.
fn metadata_value(record: &ContentRecord, name: &str) -> Option<MetaValue> {
    match name {
        "published_at" => record.published_at.map(|t| MetaValue::Int(t.timestamp())),
        "created_at" => Some(MetaValue::Int(record.created_at.timestamp())),
        "updated_at" => Some(MetaValue::Int(record.updated_at.timestamp())),
        "author" => record.author_id.map(|id| MetaValue::Ref {
            id,
            display: record.author_display(),
        }),
        "category" => record.category.clone().map(MetaValue::Text),
        "kind" => record.kind.clone().map(MetaValue::Text),
        "is_visible" => Some(MetaValue::Bool(record.is_visible)),
        "featured" => Some(MetaValue::Bool(record.featured)),
        "views" => Some(MetaValue::Int(record.views)),
        "rating" => record.rating.map(MetaValue::Float),
        _ => None,
    }
}

/// Resolve the document URL per the entry's rule. Unresolvable URLs are
/// logged and become null; the document is still indexed.
fn resolve_url(entry: &RegistryEntry, record: &ContentRecord) -> Option<String> {
    let url = match entry.url_rule {
        UrlRule::Route { route, param, anchor } => {
            let value = record.text_field(param)?;
            let mut resolved = registry::resolve_route(route, value)?;
            if let Some(prefix) = anchor {
                resolved.push('#');
                resolved.push_str(prefix);
                resolved.push('-');
                resolved.push_str(value);
            }
            Some(resolved)
        }
        UrlRule::Field(field) => record.text_field(field).map(str::to_string),
    };

    if url.is_none() {
        warn!(
            content_type = %record.content_type,
            record_id = record.id,
            "could not resolve document URL, indexing with url = null"
        );
    }
    url
}

/// Truncate the first populated description/content field for the preview.
fn derive_excerpt(fields: &BTreeMap<String, FieldValue>) -> String {
    for name in ["description", "content"] {
        if let Some(FieldValue::Text(text)) = fields.get(name) {
            if !text.is_empty() {
                return truncate_chars(text, EXCERPT_LENGTH);
            }
        }
    }
    String::new()
}

/// Character-boundary-safe truncation.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}
