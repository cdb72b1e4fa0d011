// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content-type variants the indexing pipeline knows about.
///
/// Each variant has an immutable registry entry (field weights, URL rule,
/// visibility predicate) looked up by the document builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    /// Blog article
    Post,
    /// Catalog item on the tools page
    Tool,
    /// External resource listing
    Resource,
}

impl ContentType {
    /// Parse a content-type name as it appears in document ids and API paths.
    /// Returns `None` for unknown names; callers decide whether that is a
    /// 400 or a skipped record.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Post" => Some(ContentType::Post),
            "Tool" => Some(ContentType::Tool),
            "Resource" => Some(ContentType::Resource),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Post => "Post",
            ContentType::Tool => "Tool",
            ContentType::Resource => "Resource",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw tag value as stored by the content store. Listings keep tags as a
/// comma-separated column; some record sources hand over native lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TagInput {
    #[default]
    None,
    Csv(String),
    List(Vec<String>),
}

/// One typed record fetched from the content store.
///
/// This is the union of the attributes the registry references across all
/// content types; fields a type does not use stay `None`/default. The store
/// is external — this struct only models what indexing needs.
#[derive(Debug, Clone)]
pub struct ContentRecord {
    pub id: i64,
    pub content_type: ContentType,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub body: Option<String>,
    pub tags: TagInput,
    pub category: Option<String>,
    pub kind: Option<String>,
    pub author_id: Option<i64>,
    pub author_name: Option<String>,
    pub author_display_name: Option<String>,
    pub external_url: Option<String>,
    pub is_visible: bool,
    pub featured: bool,
    pub views: i64,
    pub rating: Option<f64>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentRecord {
    /// Minimal visible record; tests and fixtures fill in the rest.
    pub fn new(content_type: ContentType, id: i64, title: &str, slug: &str) -> Self {
        let now = Utc::now();
        Self {
            id,
            content_type,
            title: title.to_string(),
            slug: slug.to_string(),
            description: None,
            body: None,
            tags: TagInput::None,
            category: None,
            kind: None,
            author_id: None,
            author_name: None,
            author_display_name: None,
            external_url: None,
            is_visible: true,
            featured: false,
            views: 0,
            rating: None,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up a registered text field by name. Unknown names resolve to
    /// `None`, which the document builder degrades to an empty string.
    pub fn text_field(&self, name: &str) -> Option<&str> {
        match name {
            "title" => Some(self.title.as_str()),
            "slug" => Some(self.slug.as_str()),
            "description" => self.description.as_deref(),
            "content" => self.body.as_deref(),
            "category" => self.category.as_deref(),
            "kind" => self.kind.as_deref(),
            "url" => self.external_url.as_deref(),
            _ => None,
        }
    }

    /// Best-effort author display text: prefer the display name, fall back
    /// to the plain name.
    pub fn author_display(&self) -> Option<String> {
        self.author_display_name
            .clone()
            .or_else(|| self.author_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_parse_known() {
        assert_eq!(ContentType::parse("Post"), Some(ContentType::Post));
        assert_eq!(ContentType::parse("Tool"), Some(ContentType::Tool));
        assert_eq!(ContentType::parse("Resource"), Some(ContentType::Resource));
    }

    #[test]
    fn test_content_type_parse_unknown() {
        assert_eq!(ContentType::parse("post"), None);
        assert_eq!(ContentType::parse(""), None);
    }

    #[test]
    fn test_content_type_display_round_trips() {
        for ct in [ContentType::Post, ContentType::Tool, ContentType::Resource] {
            assert_eq!(ContentType::parse(&ct.to_string()), Some(ct));
        }
    }

    #[test]
    fn test_text_field_lookup() {
        let mut record = ContentRecord::new(ContentType::Post, 1, "Hello", "hello");
        record.description = Some("A greeting".to_string());

        assert_eq!(record.text_field("title"), Some("Hello"));
        assert_eq!(record.text_field("description"), Some("A greeting"));
        assert_eq!(record.text_field("content"), None);
        assert_eq!(record.text_field("nonexistent"), None);
    }

    #[test]
    fn test_author_display_prefers_display_name() {
        let mut record = ContentRecord::new(ContentType::Post, 1, "T", "t");
        record.author_name = Some("jdoe".to_string());
        record.author_display_name = Some("J. Doe".to_string());
        assert_eq!(record.author_display(), Some("J. Doe".to_string()));

        record.author_display_name = None;
        assert_eq!(record.author_display(), Some("jdoe".to_string()));
    }
}
