// HTTP request handlers
use crate::application::session::RenderOutcome;
use crate::domain::dashboard::DashboardEntry;
use crate::domain::graph::GraphConfig;
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::json_response;
use crate::infrastructure::stream_renderer::StreamRenderer;
use crate::presentation::api_error::ApiError;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

const STREAM_BUFFER: usize = 16;

#[derive(Deserialize)]
pub struct SaveGraphRequest {
    #[serde(flatten)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub force: bool,
}

#[derive(Deserialize)]
pub struct RenameRequest {
    pub id: String,
}

fn accepts_brotli(headers: &HeaderMap) -> bool {
    headers
        .get("accept-encoding")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.contains("br"))
        .unwrap_or(false)
}

/// Query parameters become graph overrides. Values that parse as JSON keep
/// their type, anything else is taken as a string.
fn overrides(params: HashMap<String, String>) -> Map<String, Value> {
    params
        .into_iter()
        .map(|(key, raw)| {
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            (key, value)
        })
        .collect()
}

fn into_response(result: Result<Response, StatusCode>) -> Response {
    result.unwrap_or_else(|status| status.into_response())
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_graphs(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let graphs = state.graph_service.list().await?;
    Ok(into_response(json_response(&graphs, accepts_brotli(&headers)).await))
}

pub async fn get_graph(
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let graph = state.graph_service.load(&id, &overrides(params)).await?;
    Ok(into_response(json_response(&graph, accepts_brotli(&headers)).await))
}

pub async fn save_graph(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaveGraphRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut graph = request.graph;
    graph.id = id;

    state.graph_service.save(&mut graph, request.force).await?;
    Ok(Json(json!({ "hash": graph.hash })))
}

pub async fn rename_graph(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<RenameRequest>,
) -> Result<StatusCode, ApiError> {
    state.graph_service.rename(&id, &request.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_graph(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    state.graph_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// One render pass; 204 when the graph has no targets
pub async fn render_graph(
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let graph = state.graph_service.load(&id, &overrides(params)).await?;

    match state.graph_service.render(graph).await? {
        Some(frame) => Ok(into_response(json_response(&frame, accepts_brotli(&headers)).await)),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Draw the graph, then keep streaming refreshed frames for as long as the
/// client stays connected
pub async fn stream_graph(
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let graph = state.graph_service.load(&id, &overrides(params)).await?;

    let (renderer, rx) = StreamRenderer::channel(STREAM_BUFFER);
    let mut session = state.graph_service.open_session(graph, Arc::new(renderer));

    if session.draw().await? == RenderOutcome::Empty {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    // Without a refresh timer the session is done; dropping it closes the
    // channel once the drawn frame has been read.
    let session = session.is_refreshing().then_some(session);
    if session.is_none() {
        tracing::debug!("Graph {} does not refresh, closing stream after draw", id);
    }

    Ok(stream_from_receiver(rx, session, accepts_brotli(&headers)).into_response())
}

pub async fn export_graph(
    Path((id, index)): Path<(String, usize)>,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let graph = state.graph_service.load(&id, &overrides(params)).await?;

    let export = state
        .graph_service
        .export(graph, index)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Export {} of graph {}", index, id)))?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        export.link.file_name.replace('"', "'")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.data,
    )
        .into_response())
}

pub async fn render_dashboard(
    State(state): State<Arc<AppState>>,
    Json(entries): Json<Vec<DashboardEntry>>,
) -> impl IntoResponse {
    Json(state.graph_service.render_dashboard(&entries).await)
}
