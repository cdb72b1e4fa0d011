// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Static per-content-type indexing configuration.
//!
//! Loaded once at startup and read-only for the process lifetime; nothing
//! here needs synchronization. Visibility and URL generation are plain named
//! functions so each content type stays a concrete, testable variant.

use crate::models::content::{ContentRecord, ContentType};
use crate::services::sanitize::SanitizeMode;
use chrono::Utc;

/// One registered field: where it comes from, how much it weighs in
/// relevance scoring, and how its raw value is sanitized.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub weight: f32,
    pub mode: SanitizeMode,
    /// Tag fields are parsed into de-duplicated string lists instead of
    /// being sanitized as prose.
    pub tags: bool,
}

/// How a document's URL is produced.
#[derive(Debug, Clone, Copy)]
pub enum UrlRule {
    /// Resolve a named route with the value of `param`; when `anchor` is
    /// set, append `#{anchor}-{value}`.
    Route {
        route: &'static str,
        param: &'static str,
        anchor: Option<&'static str>,
    },
    /// Use a record field verbatim.
    Field(&'static str),
}

pub type VisibilityFn = fn(&ContentRecord) -> bool;

/// Immutable indexing configuration for one content type.
pub struct RegistryEntry {
    pub content_type: ContentType,
    pub fields: &'static [FieldRule],
    pub metadata_fields: &'static [&'static str],
    pub url_rule: UrlRule,
    pub visibility: VisibilityFn,
    pub category_label: &'static str,
    pub category_icon: &'static str,
    /// Overall multiplier applied by the fallback engine to this type's
    /// relevance scores.
    pub type_weight: f32,
}

const POST_FIELDS: &[FieldRule] = &[
    FieldRule { name: "title", weight: 10.0, mode: SanitizeMode::Auto, tags: false },
    FieldRule { name: "description", weight: 5.0, mode: SanitizeMode::Html, tags: false },
    FieldRule { name: "content", weight: 3.0, mode: SanitizeMode::Markdown, tags: false },
    FieldRule { name: "tags", weight: 8.0, mode: SanitizeMode::None, tags: true },
];

const POST_METADATA: &[&str] = &[
    "published_at",
    "created_at",
    "updated_at",
    "author",
    "category",
    "is_visible",
    "featured",
    "views",
    "rating",
];

const TOOL_FIELDS: &[FieldRule] = &[
    FieldRule { name: "title", weight: 10.0, mode: SanitizeMode::Auto, tags: false },
    FieldRule { name: "description", weight: 6.0, mode: SanitizeMode::Html, tags: false },
    FieldRule { name: "tags", weight: 8.0, mode: SanitizeMode::None, tags: true },
];

const TOOL_METADATA: &[&str] = &[
    "category",
    "kind",
    "is_visible",
    "featured",
    "views",
    "rating",
    "created_at",
    "updated_at",
];

const RESOURCE_FIELDS: &[FieldRule] = &[
    FieldRule { name: "title", weight: 9.0, mode: SanitizeMode::Auto, tags: false },
    FieldRule { name: "description", weight: 5.0, mode: SanitizeMode::Html, tags: false },
    FieldRule { name: "tags", weight: 7.0, mode: SanitizeMode::None, tags: true },
];

const RESOURCE_METADATA: &[&str] = &[
    "category",
    "kind",
    "is_visible",
    "created_at",
    "updated_at",
];

/// A post is visible once it is marked visible and its publish date has
/// passed. Unpublishing a post drops it from the index on the next sync.
fn post_visible(record: &ContentRecord) -> bool {
    record.is_visible
        && record
            .published_at
            .is_some_and(|published| published <= Utc::now())
}

/// Tools and resources are listed as soon as they are marked visible.
fn listed_visible(record: &ContentRecord) -> bool {
    record.is_visible
}

/// Lookup table over all registered content types. Registration order is
/// significant: the fallback engine preserves it on score ties.
pub struct ContentRegistry {
    entries: Vec<RegistryEntry>,
}

impl ContentRegistry {
    /// The built-in content-type configuration.
    pub fn with_defaults() -> Self {
        Self {
            entries: vec![
                RegistryEntry {
                    content_type: ContentType::Post,
                    fields: POST_FIELDS,
                    metadata_fields: POST_METADATA,
                    url_rule: UrlRule::Route {
                        route: "post-detail",
                        param: "slug",
                        anchor: None,
                    },
                    visibility: post_visible,
                    category_label: "Articles",
                    category_icon: "article",
                    type_weight: 1.0,
                },
                RegistryEntry {
                    content_type: ContentType::Tool,
                    fields: TOOL_FIELDS,
                    metadata_fields: TOOL_METADATA,
                    url_rule: UrlRule::Route {
                        route: "tool-list",
                        param: "slug",
                        anchor: Some("tool"),
                    },
                    visibility: listed_visible,
                    category_label: "Tools",
                    category_icon: "tool",
                    type_weight: 0.9,
                },
                RegistryEntry {
                    content_type: ContentType::Resource,
                    fields: RESOURCE_FIELDS,
                    metadata_fields: RESOURCE_METADATA,
                    url_rule: UrlRule::Field("url"),
                    visibility: listed_visible,
                    category_label: "Resources",
                    category_icon: "link",
                    type_weight: 0.8,
                },
            ],
        }
    }

    pub fn get(&self, content_type: ContentType) -> Option<&RegistryEntry> {
        self.entries
            .iter()
            .find(|entry| entry.content_type == content_type)
    }

    /// All entries in registration order.
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }
}

/// Resolve a named route to a site-relative path. Unknown routes are
/// unresolvable; the document is still indexed with a null URL.
pub fn resolve_route(route: &str, param_value: &str) -> Option<String> {
    match route {
        "post-detail" => Some(format!("/blog/{}/", param_value)),
        "tool-list" => Some("/tools/".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_registry_has_all_types() {
        let registry = ContentRegistry::with_defaults();
        assert!(registry.get(ContentType::Post).is_some());
        assert!(registry.get(ContentType::Tool).is_some());
        assert!(registry.get(ContentType::Resource).is_some());
        assert_eq!(registry.entries().len(), 3);
    }

    #[test]
    fn test_registration_order_is_stable() {
        let registry = ContentRegistry::with_defaults();
        let order: Vec<ContentType> = registry
            .entries()
            .iter()
            .map(|entry| entry.content_type)
            .collect();
        assert_eq!(
            order,
            vec![ContentType::Post, ContentType::Tool, ContentType::Resource]
        );
    }

    #[test]
    fn test_post_not_visible_before_publish_date() {
        let mut record = ContentRecord::new(ContentType::Post, 1, "Soon", "soon");
        record.published_at = Some(Utc::now() + Duration::hours(1));
        assert!(!post_visible(&record));

        record.published_at = Some(Utc::now() - Duration::hours(1));
        assert!(post_visible(&record));
    }

    #[test]
    fn test_post_not_visible_without_publish_date() {
        let record = ContentRecord::new(ContentType::Post, 1, "Draft", "draft");
        assert!(!post_visible(&record));
    }

    #[test]
    fn test_listed_visibility_follows_flag() {
        let mut record = ContentRecord::new(ContentType::Tool, 1, "Widget", "widget");
        assert!(listed_visible(&record));
        record.is_visible = false;
        assert!(!listed_visible(&record));
    }

    #[test]
    fn test_resolve_known_routes() {
        assert_eq!(
            resolve_route("post-detail", "hello-world"),
            Some("/blog/hello-world/".to_string())
        );
        assert_eq!(resolve_route("tool-list", "widget"), Some("/tools/".to_string()));
    }

    #[test]
    fn test_resolve_unknown_route() {
        assert_eq!(resolve_route("no-such-route", "x"), None);
    }
}
