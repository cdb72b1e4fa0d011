// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Structured query assembly, independent of any specific content type.
//!
//! The builder accumulates filter/sort/pagination clauses and is finalized
//! by `build()` into an immutable `QuerySpec`. Caller mistakes (unknown sort
//! field, out-of-range pagination) surface as validation errors, never as
//! logged system faults.

use crate::error::SearchError;
use crate::models::content::ContentType;
use crate::models::query::{QuerySpec, SortDirection};

const MAX_PER_PAGE: usize = 100;

const DEFAULT_HIGHLIGHT_FIELDS: &[&str] = &["fields.title", "excerpt", "fields.description"];
const DEFAULT_FACET_FIELDS: &[&str] = &["content_type", "metadata.category"];

const HIGHLIGHT_PRE_TAG: &str = "<mark>";
const HIGHLIGHT_POST_TAG: &str = "</mark>";

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    q: String,
    filters: Vec<String>,
    sort: Vec<String>,
    page: usize,
    per_page: usize,
    highlight_fields: Vec<String>,
    facets: Vec<String>,
}

impl QueryBuilder {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            filters: Vec::new(),
            sort: Vec::new(),
            page: 1,
            per_page: 20,
            highlight_fields: to_owned(DEFAULT_HIGHLIGHT_FIELDS),
            facets: to_owned(DEFAULT_FACET_FIELDS),
        }
    }

    /// Equality filter on one content type.
    pub fn filter_by_type(mut self, content_type: ContentType) -> Self {
        self.filters
            .push(format!("content_type = \"{}\"", content_type));
        self
    }

    /// Equality filter over several content types, OR-combined into a single
    /// parenthesized clause, AND-combined with everything else.
    pub fn filter_by_types(mut self, types: &[ContentType]) -> Self {
        match types {
            [] => self,
            [single] => self.filter_by_type(*single),
            many => {
                let clause = many
                    .iter()
                    .map(|t| format!("content_type = \"{}\"", t))
                    .collect::<Vec<_>>()
                    .join(" OR ");
                self.filters.push(format!("({})", clause));
                self
            }
        }
    }

    pub fn filter_by_visibility(mut self, visible: bool) -> Self {
        self.filters
            .push(format!("metadata.is_visible = {}", visible));
        self
    }

    pub fn filter_by_category(mut self, category: &str) -> Self {
        self.filters
            .push(format!("metadata.category = \"{}\"", escape(category)));
        self
    }

    pub fn filter_by_kind(mut self, kind: &str) -> Self {
        self.filters
            .push(format!("metadata.kind = \"{}\"", escape(kind)));
        self
    }

    /// Sort by a logical field from the fixed whitelist. `relevance` is the
    /// implicit default ordering and contributes no explicit clause.
    pub fn sort_by(mut self, field: &str, direction: &str) -> Result<Self, SearchError> {
        let direction = SortDirection::parse(direction).ok_or_else(|| {
            SearchError::validation("order", format!("direction must be asc or desc, got: {}", direction))
        })?;

        let backing = match field {
            "date" => Some("metadata.published_at"),
            "rating" => Some("metadata.rating"),
            "views" => Some("metadata.views"),
            "title" => Some("fields.title"),
            "relevance" => None,
            other => {
                return Err(SearchError::validation(
                    "sort",
                    format!("unknown sort field: {}", other),
                ))
            }
        };

        if let Some(backing) = backing {
            self.sort.push(format!("{}:{}", backing, direction));
        }
        Ok(self)
    }

    /// Override the highlighted fields; `None` keeps the default set.
    pub fn highlight(mut self, fields: Option<Vec<String>>) -> Self {
        self.highlight_fields = fields.unwrap_or_else(|| to_owned(DEFAULT_HIGHLIGHT_FIELDS));
        self
    }

    /// Override the faceted fields; `None` keeps the default set.
    pub fn facets(mut self, fields: Option<Vec<String>>) -> Self {
        self.facets = fields.unwrap_or_else(|| to_owned(DEFAULT_FACET_FIELDS));
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Result<Self, SearchError> {
        if page < 1 {
            return Err(SearchError::validation("page", "page must be >= 1"));
        }
        if per_page < 1 || per_page > MAX_PER_PAGE {
            return Err(SearchError::validation(
                "per_page",
                format!("per_page must be between 1 and {}", MAX_PER_PAGE),
            ));
        }
        // The offset must stay representable; reject pages past that point
        // instead of overflowing in build().
        if (page - 1).checked_mul(per_page).is_none() {
            return Err(SearchError::validation("page", "page is out of range"));
        }
        self.page = page;
        self.per_page = per_page;
        Ok(self)
    }

    pub fn build(self) -> QuerySpec {
        let filter = if self.filters.is_empty() {
            None
        } else {
            Some(self.filters.join(" AND "))
        };

        QuerySpec {
            q: self.q,
            filter,
            sort: self.sort,
            limit: self.per_page,
            offset: self.page.saturating_sub(1).saturating_mul(self.per_page),
            highlight_fields: self.highlight_fields,
            highlight_pre_tag: HIGHLIGHT_PRE_TAG.to_string(),
            highlight_post_tag: HIGHLIGHT_POST_TAG.to_string(),
            facets: self.facets,
        }
    }
}

fn to_owned(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| (*f).to_string()).collect()
}

/// Escape embedded quotes so user-supplied values cannot break out of the
/// filter expression.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
