// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};

/// Sort direction accepted by the query builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse the wire form; anything other than "asc"/"desc" is a caller error.
    pub fn parse(direction: &str) -> Option<Self> {
        match direction {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// Finalized structured query request, built once by the query builder and
/// immutable thereafter. Passed verbatim to Meilisearch; the fallback engine
/// ignores the parts that do not apply to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySpec {
    pub q: String,
    /// AND-combined filter expression; `None` when no clauses were added.
    pub filter: Option<String>,
    /// `field:direction` clauses; empty when only relevance ordering applies.
    pub sort: Vec<String>,
    pub limit: usize,
    pub offset: usize,
    pub highlight_fields: Vec<String>,
    pub highlight_pre_tag: String,
    pub highlight_post_tag: String,
    pub facets: Vec<String>,
}
