// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Crate-wide error taxonomy.
//!
//! Services use `anyhow::Result` for internal plumbing; `SearchError` is the
//! typed surface at the crate seam. Validation errors are caller mistakes and
//! map to 400 responses, never to system-error logs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Bad caller input: invalid sort field/direction, out-of-range
    /// pagination, unknown content type, query too short.
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// External search service unreachable or timed out during an
    /// upsert/delete. Bulk operations never surface this to callers; it is
    /// reflected only in result counts.
    #[error("indexing failed: {0}")]
    Indexing(String),

    /// Missing service endpoint/credentials at startup. Fatal.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Content store failure while the fallback engine was querying one
    /// content type. The type contributes zero results; the search continues.
    #[error("content store query failed for {content_type}: {message}")]
    FallbackQuery {
        content_type: String,
        message: String,
    },
}

impl SearchError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        SearchError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, SearchError::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_names_field() {
        let err = SearchError::validation("sort", "unknown sort field: bogus");
        assert_eq!(err.to_string(), "invalid sort: unknown sort field: bogus");
        assert!(err.is_validation());
    }

    #[test]
    fn test_indexing_is_not_validation() {
        let err = SearchError::Indexing("connection refused".to_string());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_fallback_query_display_names_type() {
        let err = SearchError::FallbackQuery {
            content_type: "Post".to_string(),
            message: "store unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "content store query failed for Post: store unavailable"
        );
    }
}
