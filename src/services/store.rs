// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Content store access.
//!
//! The persistent store itself is an external collaborator; this module only
//! defines the fetch contract the indexing pipeline and fallback engine
//! need, a Postgres implementation over sqlx, and an in-memory fixture used
//! by tests.

use crate::models::content::{ContentRecord, ContentType, TagInput};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Queryable collection of typed content records, per content type.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Every record of the type, visible or not. Used by reindexing so that
    /// skipped (invisible) records can be accounted for.
    async fn fetch_all(&self, content_type: ContentType) -> Result<Vec<ContentRecord>>;

    /// Only records whose visibility flag is set. Used by the fallback
    /// engine's query path.
    async fn fetch_visible(&self, content_type: ContentType) -> Result<Vec<ContentRecord>>;
}

/// Postgres-backed content store.
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn table(content_type: ContentType) -> &'static str {
        match content_type {
            ContentType::Post => "posts",
            ContentType::Tool => "tools",
            ContentType::Resource => "resources",
        }
    }

    async fn fetch(
        &self,
        content_type: ContentType,
        only_visible: bool,
    ) -> Result<Vec<ContentRecord>> {
        let mut sql = format!(
            "SELECT id, title, slug, description, body, tags, category, kind, \
             author_id, author_name, author_display_name, external_url, \
             is_visible, featured, views, rating, published_at, created_at, updated_at \
             FROM {}",
            Self::table(content_type)
        );
        if only_visible {
            sql.push_str(" WHERE is_visible = TRUE");
        }
        sql.push_str(" ORDER BY id");

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| record_from_row(content_type, row))
            .collect()
    }
}

fn record_from_row(content_type: ContentType, row: &PgRow) -> Result<ContentRecord> {
    let tags = row
        .try_get::<Option<String>, _>("tags")?
        .map(TagInput::Csv)
        .unwrap_or_default();

    Ok(ContentRecord {
        id: row.try_get("id")?,
        content_type,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        body: row.try_get("body")?,
        tags,
        category: row.try_get("category")?,
        kind: row.try_get("kind")?,
        author_id: row.try_get("author_id")?,
        author_name: row.try_get("author_name")?,
        author_display_name: row.try_get("author_display_name")?,
        external_url: row.try_get("external_url")?,
        is_visible: row.try_get("is_visible")?,
        featured: row.try_get("featured")?,
        views: row.try_get("views")?,
        rating: row.try_get("rating")?,
        published_at: row.try_get("published_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn fetch_all(&self, content_type: ContentType) -> Result<Vec<ContentRecord>> {
        self.fetch(content_type, false).await
    }

    async fn fetch_visible(&self, content_type: ContentType) -> Result<Vec<ContentRecord>> {
        self.fetch(content_type, true).await
    }
}

/// In-memory content store used by unit and integration tests. Supports
/// per-type failure injection and counts fetches so tests can assert the
/// store was (or was not) touched.
#[derive(Default)]
pub struct MemoryStore {
    records: Vec<ContentRecord>,
    failing: HashSet<ContentType>,
    fetch_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new(records: Vec<ContentRecord>) -> Self {
        Self {
            records,
            failing: HashSet::new(),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    /// Make every fetch for `content_type` fail, simulating a degraded store.
    pub fn failing_for(mut self, content_type: ContentType) -> Self {
        self.failing.insert(content_type);
        self
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::Relaxed)
    }

    fn fetch(&self, content_type: ContentType, only_visible: bool) -> Result<Vec<ContentRecord>> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        if self.failing.contains(&content_type) {
            anyhow::bail!("content store unavailable for {}", content_type);
        }
        Ok(self
            .records
            .iter()
            .filter(|record| record.content_type == content_type)
            .filter(|record| !only_visible || record.is_visible)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn fetch_all(&self, content_type: ContentType) -> Result<Vec<ContentRecord>> {
        self.fetch(content_type, false)
    }

    async fn fetch_visible(&self, content_type: ContentType) -> Result<Vec<ContentRecord>> {
        self.fetch(content_type, true)
    }
}
