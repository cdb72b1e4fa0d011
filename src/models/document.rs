// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::content::ContentType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value of one indexed field: sanitized text, or an ordered tag list for
/// tag fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Tags(Vec<String>),
    Text(String),
}

/// Auxiliary metadata attribute. Timestamps are epoch seconds; foreign-key
/// style values carry the id plus an optional display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Ref { id: i64, display: Option<String> },
}

/// Normalized, index-ready representation of one content record.
///
/// Ephemeral: rebuilt from the source record on every index operation. The
/// `id` is stable for the record's lifetime, so re-indexing overwrites in
/// Meilisearch rather than duplicating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDocument {
    /// Globally unique id, `{content_type}:{record_id}`.
    pub id: String,
    pub content_type: ContentType,
    pub record_id: i64,
    /// Sanitized field values keyed by registry field name.
    pub fields: BTreeMap<String, FieldValue>,
    /// Auxiliary attributes keyed by registry metadata field name.
    pub metadata: BTreeMap<String, MetaValue>,
    /// Resolved link to the content, `None` when unresolvable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_icon: Option<String>,
    /// Short preview derived from the first populated description/content
    /// field when not explicitly provided.
    pub excerpt: String,
}

impl SearchDocument {
    /// Compose the stable document id used as the index primary key.
    pub fn compose_id(content_type: ContentType, record_id: i64) -> String {
        format!("{}:{}", content_type, record_id)
    }

    /// Convenience accessor for a plain-text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Convenience accessor for a tag-list field.
    pub fn tags(&self, name: &str) -> Option<&[String]> {
        match self.fields.get(name) {
            Some(FieldValue::Tags(tags)) => Some(tags.as_slice()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_id_scheme() {
        assert_eq!(SearchDocument::compose_id(ContentType::Post, 42), "Post:42");
        assert_eq!(
            SearchDocument::compose_id(ContentType::Tool, 7),
            "Tool:7"
        );
    }

    #[test]
    fn test_field_value_serde_round_trip() {
        let text = FieldValue::Text("hello".to_string());
        let json = serde_json::to_string(&text).unwrap();
        assert_eq!(json, "\"hello\"");
        assert_eq!(serde_json::from_str::<FieldValue>(&json).unwrap(), text);

        let tags = FieldValue::Tags(vec!["rust".to_string(), "search".to_string()]);
        let json = serde_json::to_string(&tags).unwrap();
        assert_eq!(json, "[\"rust\",\"search\"]");
        assert_eq!(serde_json::from_str::<FieldValue>(&json).unwrap(), tags);
    }

    #[test]
    fn test_meta_value_serde_shapes() {
        assert_eq!(serde_json::to_string(&MetaValue::Bool(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&MetaValue::Int(1700000000)).unwrap(), "1700000000");

        let author = MetaValue::Ref {
            id: 3,
            display: Some("J. Doe".to_string()),
        };
        let json = serde_json::to_string(&author).unwrap();
        assert_eq!(json, "{\"id\":3,\"display\":\"J. Doe\"}");
        assert_eq!(serde_json::from_str::<MetaValue>(&json).unwrap(), author);
    }

    #[test]
    fn test_meta_value_untagged_ordering() {
        // Integers must not be swallowed by the float variant on the way back in.
        assert_eq!(
            serde_json::from_str::<MetaValue>("5").unwrap(),
            MetaValue::Int(5)
        );
        assert_eq!(
            serde_json::from_str::<MetaValue>("4.5").unwrap(),
            MetaValue::Float(4.5)
        );
        assert_eq!(
            serde_json::from_str::<MetaValue>("false").unwrap(),
            MetaValue::Bool(false)
        );
    }
}
