// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::fetch::DataFetcher;
use crate::application::graph_service::GraphService;
use crate::application::render::RenderSettings;
use crate::domain::time_scale::Timezone;
use crate::infrastructure::config::load_config;
use crate::infrastructure::http_graph_store::HttpGraphStore;
use crate::infrastructure::http_transport::HttpTransport;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    delete_graph, export_graph, get_graph, health_check, list_graphs, rename_graph,
    render_dashboard, render_graph, save_graph, stream_graph,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_config().context("Failed to load config/telegraph")?;
    let sources = Arc::new(config.source_registry());
    tracing::info!("Configured {} data sources", sources.len());

    // Collaborators (infrastructure layer)
    let transport = Arc::new(HttpTransport::new(REQUEST_TIMEOUT)?);
    let store_client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build graph store client")?;
    let store = Arc::new(HttpGraphStore::new(&config.store.url, store_client));

    // Services (application layer)
    let fetcher = Arc::new(DataFetcher::new(
        transport,
        sources,
        config.render.default_period.clone(),
        Timezone::Local,
    ));
    let settings = RenderSettings {
        default_refresh: config.default_refresh(),
        tick_count: config.render.tick_count,
        timezone: Timezone::Local,
    };
    let graph_service = GraphService::new(store, fetcher, settings);

    let state = Arc::new(AppState { graph_service });

    // Build router (presentation layer)
    // Responses are compressed by the handlers, so there is no CompressionLayer.
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/graphs", get(list_graphs))
        .route(
            "/graphs/:id",
            get(get_graph)
                .put(save_graph)
                .patch(rename_graph)
                .delete(delete_graph),
        )
        .route("/graphs/:id/render", get(render_graph))
        .route("/graphs/:id/stream", get(stream_graph))
        .route("/graphs/:id/export/:index", get(export_graph))
        .route("/dashboards", post(render_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.listen))?;
    tracing::info!("Starting telegraph service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
