// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use portal_search::app::{create_router, AppState, VERSION};
use portal_search::services::search::SearchClient;
use portal_search::services::store::PgContentStore;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Get configuration from environment variables
    let meilisearch_host =
        env::var("MEILISEARCH_HOST").expect("MEILISEARCH_HOST environment variable must be set");
    let meilisearch_api_key = env::var("MEILISEARCH_API_KEY").ok();
    let index_name = env::var("MEILISEARCH_INDEX").unwrap_or_else(|_| "content".to_string());

    let database_url =
        env::var("DATABASE_URL").expect("DATABASE_URL environment variable must be set");

    let port = env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .expect("PORT must be a valid port number");

    let store = PgContentStore::connect(&database_url)
        .await
        .expect("Failed to connect to the content database");
    info!("Connected to content database");

    let backend = SearchClient::new(&meilisearch_host, meilisearch_api_key, index_name)
        .expect("Failed to create Meilisearch client");

    let state = AppState::build(Arc::new(backend), Arc::new(store));

    // Push index settings at startup; a failure here degrades ranking but
    // does not prevent serving.
    if !state.index_manager.configure_index().await {
        warn!("Could not apply index settings at startup");
    }

    let app = create_router(state);

    // Bind to 0.0.0.0 to accept connections from any network interface (required for Docker)
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");

    info!("portal-search v{} listening on {}", VERSION, addr);

    axum::serve(listener, app)
        .await
        .expect("HTTP server terminated");
}
