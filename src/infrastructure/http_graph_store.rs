// Remote graph store over HTTP
use crate::application::graph_store::{apply_overrides, GraphNotFound, GraphStore};
use crate::domain::graph::{ChartKind, GraphConfig, GraphSummary, Target};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct HttpGraphStore {
    base_url: String,
    client: reqwest::Client,
}

/// Body of a save. Identity travels in the path, display hints are not stored.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveRequest<'a> {
    hash: Option<&'a str>,
    chart: ChartKind,
    from: Option<&'a str>,
    until: Option<&'a str>,
    period: Option<&'a str>,
    align: Option<&'a str>,
    invert: bool,
    sum_cols: bool,
    sum_rows: bool,
    refresh: Option<u64>,
    targets: &'a [Option<Target>],
    variables: Option<&'a str>,
    force: bool,
}

impl<'a> SaveRequest<'a> {
    fn new(graph: &'a GraphConfig, force: bool) -> Self {
        Self {
            hash: graph.hash.as_deref(),
            chart: graph.chart,
            from: graph.from.as_deref(),
            until: graph.until.as_deref(),
            period: graph.period.as_deref(),
            align: graph.align.as_deref(),
            invert: graph.invert,
            sum_cols: graph.sum_cols,
            sum_rows: graph.sum_rows,
            refresh: graph.refresh,
            targets: &graph.targets,
            variables: graph.variables.as_deref(),
            force,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SaveResponse {
    hash: String,
}

#[derive(Debug, Serialize)]
struct RenameRequest<'a> {
    id: &'a str,
}

impl HttpGraphStore {
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn graph_url(&self, id: &str) -> String {
        graph_url(&self.base_url, id)
    }

    /// Send a request; with `id` set, a 404 means that graph does not exist
    async fn send(&self, request: RequestBuilder, what: &str, id: Option<&str>) -> Result<Response> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to graph store", what))?;

        if let (StatusCode::NOT_FOUND, Some(id)) = (response.status(), id) {
            return Err(GraphNotFound(id.to_string()).into());
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Graph store {} failed with status {}: {}", what, status, body);
        }

        Ok(response)
    }
}

fn graph_url(base_url: &str, id: &str) -> String {
    format!("{}/graphs/{}", base_url, urlencoding::encode(id))
}

#[async_trait]
impl GraphStore for HttpGraphStore {
    async fn list(&self) -> Result<Vec<GraphSummary>> {
        let url = format!("{}/graphs", self.base_url);
        let response = self.send(self.client.get(&url), "list", None).await?;

        response
            .json::<Vec<GraphSummary>>()
            .await
            .context("Failed to parse graph list")
    }

    async fn load(&self, id: &str, overrides: &Map<String, Value>) -> Result<GraphConfig> {
        let response = self
            .send(self.client.get(self.graph_url(id)), "load", Some(id))
            .await?;

        let stored = response
            .json::<Value>()
            .await
            .context("Failed to parse stored graph")?;

        if stored.is_null() {
            return Err(GraphNotFound(id.to_string()).into());
        }

        let mut graph: GraphConfig = serde_json::from_value(apply_overrides(stored, overrides))
            .with_context(|| format!("Invalid definition for graph {}", id))?;
        if graph.id.is_empty() {
            graph.id = id.to_string();
        }

        Ok(graph)
    }

    async fn save(&self, graph: &GraphConfig, force: bool) -> Result<String> {
        let request = self
            .client
            .put(self.graph_url(&graph.id))
            .json(&SaveRequest::new(graph, force));
        let response = self.send(request, "save", None).await?;

        let saved = response
            .json::<SaveResponse>()
            .await
            .context("Failed to parse save response")?;

        Ok(saved.hash)
    }

    async fn rename(&self, id: &str, new_id: &str) -> Result<()> {
        let request = self
            .client
            .request(Method::PATCH, self.graph_url(id))
            .json(&RenameRequest { id: new_id });
        self.send(request, "rename", Some(id)).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self
            .send(self.client.delete(self.graph_url(id)), "delete", Some(id))
            .await?;
        Ok(())
    }
}
