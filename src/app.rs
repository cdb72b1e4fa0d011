// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Application state, route handlers, and router construction.
//!
//! This module is `pub` so that integration tests can build a test router directly
//! without starting the full binary.

use crate::error::SearchError;
use crate::models::content::ContentType;
use crate::models::metrics::{DashboardData, HealthStatus};
use crate::models::query::QuerySpec;
use crate::models::search::{
    ConfigureIndexResponse, HealthResponse, PaginationMeta, ReindexResponse, SearchHit,
    SearchQueryParams, SearchResponse,
};
use crate::models::version::VersionResponse;
use crate::services::fallback::FallbackEngine;
use crate::services::index_manager::IndexManager;
use crate::services::monitor::SearchMonitor;
use crate::services::query::QueryBuilder;
use crate::services::registry::ContentRegistry;
use crate::services::search::{BackendSearchResults, SearchBackend};
use crate::services::store::ContentStore;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `PORTAL_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("PORTAL_VERSION");

/// Queries shorter than this (after trimming) are rejected up front.
const MIN_QUERY_LENGTH: usize = 2;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared application state injected into every route handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ContentRegistry>,
    pub backend: Arc<dyn SearchBackend>,
    pub index_manager: Arc<IndexManager>,
    pub fallback: Arc<FallbackEngine>,
    pub monitor: Arc<SearchMonitor>,
}

impl AppState {
    /// Wire up all services around one backend and one content store.
    pub fn build(backend: Arc<dyn SearchBackend>, store: Arc<dyn ContentStore>) -> Self {
        let registry = Arc::new(ContentRegistry::with_defaults());
        Self {
            index_manager: Arc::new(IndexManager::new(
                registry.clone(),
                backend.clone(),
                store.clone(),
            )),
            fallback: Arc::new(FallbackEngine::new(registry.clone(), store)),
            monitor: Arc::new(SearchMonitor::new(backend.clone())),
            registry,
            backend,
        }
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

pub async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        agent: "portal-search".to_string(),
        version: VERSION.to_string(),
    })
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchQueryParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let q = params.q.trim().to_string();
    if q.chars().count() < MIN_QUERY_LENGTH {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Query must be at least {MIN_QUERY_LENGTH} characters"),
        ));
    }

    let types = parse_types(params.types.as_deref())?;
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20);
    let spec = build_query_spec(&q, &params, types.as_deref(), page, per_page)
        .map_err(bad_request)?;

    let backend = state.backend.clone();
    let spec_ref = &spec;
    let outcome = state
        .monitor
        .track_query(&q, || async move { backend.search(spec_ref).await })
        .await;

    match outcome {
        Ok(results) => Ok(Json(format_backend_response(page, per_page, results))),
        Err(e) => {
            warn!(query = %q, error = %e, "Search backend failed, using fallback engine");
            Ok(Json(
                fallback_response(&state, &q, types.as_deref(), page, per_page).await,
            ))
        }
    }
}

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let status = state.monitor.check_health().await;
    let code = if status == HealthStatus::Error {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (code, Json(HealthResponse { status }))
}

pub async fn dashboard_handler(State(state): State<AppState>) -> Json<DashboardData> {
    Json(state.monitor.dashboard_data())
}

pub async fn reindex_all_handler(State(state): State<AppState>) -> Json<ReindexResponse> {
    let reports = state.index_manager.reindex_all().await;
    Json(ReindexResponse { reports })
}

pub async fn reindex_type_handler(
    State(state): State<AppState>,
    Path(content_type): Path<String>,
) -> Result<Json<ReindexResponse>, (StatusCode, String)> {
    let content_type = ContentType::parse(&content_type).ok_or((
        StatusCode::BAD_REQUEST,
        format!("Unknown content type: {content_type}"),
    ))?;

    let report = state
        .index_manager
        .reindex_by_type(content_type)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Reindex failed: {e}"),
            )
        })?;

    let mut reports = std::collections::BTreeMap::new();
    reports.insert(content_type.to_string(), report);
    Ok(Json(ReindexResponse { reports }))
}

pub async fn configure_index_handler(
    State(state): State<AppState>,
) -> Json<ConfigureIndexResponse> {
    let success = state.index_manager.configure_index().await;
    Json(ConfigureIndexResponse { success })
}

// ---------------------------------------------------------------------------
// Search helpers
// ---------------------------------------------------------------------------

fn bad_request(err: SearchError) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, err.to_string())
}

/// Parse the comma-separated `types` parameter; unknown names are a 400.
fn parse_types(raw: Option<&str>) -> Result<Option<Vec<ContentType>>, (StatusCode, String)> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let mut types = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let parsed = ContentType::parse(name).ok_or((
            StatusCode::BAD_REQUEST,
            format!("Unknown content type: {name}"),
        ))?;
        if !types.contains(&parsed) {
            types.push(parsed);
        }
    }
    Ok(if types.is_empty() { None } else { Some(types) })
}

fn build_query_spec(
    q: &str,
    params: &SearchQueryParams,
    types: Option<&[ContentType]>,
    page: usize,
    per_page: usize,
) -> Result<QuerySpec, SearchError> {
    let mut builder = QueryBuilder::new(q).filter_by_visibility(true);
    if let Some(types) = types {
        builder = builder.filter_by_types(types);
    }
    if let Some(category) = params.category.as_deref() {
        builder = builder.filter_by_category(category);
    }
    if let Some(kind) = params.kind.as_deref() {
        builder = builder.filter_by_kind(kind);
    }
    if let Some(sort) = params.sort.as_deref() {
        let order = params.order.as_deref().unwrap_or("desc");
        builder = builder.sort_by(sort, order)?;
    }
    builder = builder.paginate(page, per_page)?;
    Ok(builder.build())
}

fn format_backend_response(
    page: usize,
    per_page: usize,
    results: BackendSearchResults,
) -> SearchResponse {
    SearchResponse {
        hits: results.hits.iter().map(SearchHit::from_document).collect(),
        pagination: PaginationMeta::new(page, per_page, results.estimated_total_hits),
        facets: results.facet_distribution,
        processing_time_ms: results.processing_time_ms,
        engine: "meilisearch".to_string(),
        suggestions: Vec::new(),
    }
}

/// Answer the query in-process. The fallback engine has no offset support,
/// so the page window is cut out of an over-fetched result list.
async fn fallback_response(
    state: &AppState,
    q: &str,
    types: Option<&[ContentType]>,
    page: usize,
    per_page: usize,
) -> SearchResponse {
    let offset = (page - 1) * per_page;
    let started = Instant::now();

    let fallback = state.fallback.clone();
    let results = state
        .monitor
        .track_query(q, || async move {
            Ok(fallback.search(q, types, offset + per_page).await)
        })
        .await
        .unwrap_or_default();

    let hits = results
        .results
        .iter()
        .skip(offset)
        .map(|hit| SearchHit::from_document(&hit.document))
        .collect();

    SearchResponse {
        hits,
        pagination: PaginationMeta::new(page, per_page, results.total_count as u64),
        facets: None,
        processing_time_ms: started.elapsed().as_millis() as u64,
        engine: "fallback".to_string(),
        suggestions: results.suggestions,
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the Axum application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/version", get(version_handler))
        .route("/search", get(search_handler))
        .route("/health", get(health_handler))
        .route("/admin/dashboard", get(dashboard_handler))
        .route("/admin/reindex", post(reindex_all_handler))
        .route("/admin/reindex/{content_type}", post(reindex_type_handler))
        .route("/admin/index-settings", post(configure_index_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_types_dedups_and_trims() {
        let types = parse_types(Some("Post, Tool,Post")).unwrap().unwrap();
        assert_eq!(types, vec![ContentType::Post, ContentType::Tool]);
    }

    #[test]
    fn test_parse_types_unknown_is_bad_request() {
        let err = parse_types(Some("Gadget")).unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_types_empty_means_all() {
        assert!(parse_types(None).unwrap().is_none());
        assert!(parse_types(Some("")).unwrap().is_none());
        assert!(parse_types(Some(" , ")).unwrap().is_none());
    }
}
