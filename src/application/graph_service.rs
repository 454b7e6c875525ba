// Graph service - Use cases over stored graphs and their render passes
use crate::application::fetch::DataFetcher;
use crate::application::graph_store::GraphStore;
use crate::application::render::{RenderFrame, RenderPass, RenderSettings, Renderer};
use crate::application::session::GraphSession;
use crate::domain::dashboard::DashboardEntry;
use crate::domain::error::GraphError;
use crate::domain::export::{csv_data, export_links, ExportLink};
use crate::domain::graph::{GraphConfig, GraphSummary};
use futures::future::join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Outcome of one dashboard graph. A graph with no targets has neither a
/// frame nor an error.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardPanel {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<RenderFrame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// CSV of one variable binding, with the link it is offered under
#[derive(Debug, Clone, PartialEq)]
pub struct CsvExport {
    pub link: ExportLink,
    pub data: String,
}

#[derive(Clone)]
pub struct GraphService {
    store: Arc<dyn GraphStore>,
    fetcher: Arc<DataFetcher>,
    settings: RenderSettings,
}

impl GraphService {
    pub fn new(store: Arc<dyn GraphStore>, fetcher: Arc<DataFetcher>, settings: RenderSettings) -> Self {
        Self {
            store,
            fetcher,
            settings,
        }
    }

    pub async fn list(&self) -> anyhow::Result<Vec<GraphSummary>> {
        self.store.list().await
    }

    pub async fn load(&self, id: &str, overrides: &Map<String, Value>) -> anyhow::Result<GraphConfig> {
        self.store.load(id, overrides).await
    }

    /// Persist the graph and record the hash the store handed back
    pub async fn save(&self, graph: &mut GraphConfig, force: bool) -> anyhow::Result<()> {
        let hash = self.store.save(graph, force).await?;
        tracing::info!("Saved graph {} ({})", graph.id, hash);
        graph.hash = Some(hash);
        Ok(())
    }

    pub async fn rename(&self, id: &str, new_id: &str) -> anyhow::Result<()> {
        self.store.rename(id, new_id).await?;
        tracing::info!("Renamed graph {} to {}", id, new_id);
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> anyhow::Result<()> {
        self.store.delete(id).await?;
        tracing::info!("Deleted graph {}", id);
        Ok(())
    }

    /// Run a single pass. `None` when the graph has no targets.
    pub async fn render(&self, graph: GraphConfig) -> Result<Option<RenderFrame>, GraphError> {
        let pass = RenderPass::new(graph, self.fetcher.clone(), self.settings)?;
        if !pass.graph().has_targets() {
            return Ok(None);
        }

        pass.frame().await.map(Some)
    }

    /// Start a drawing session that hands frames to `renderer`
    pub fn open_session(&self, graph: GraphConfig, renderer: Arc<dyn Renderer>) -> GraphSession {
        GraphSession::new(graph, self.fetcher.clone(), renderer, self.settings)
    }

    /// CSV for the variable binding at `index`, `None` if there is no such binding
    pub async fn export(&self, graph: GraphConfig, index: usize) -> Result<Option<CsvExport>, GraphError> {
        let pass = RenderPass::new(graph, self.fetcher.clone(), self.settings)?;
        let Some(link) = export_links(&pass.graph().id, pass.variables()).into_iter().nth(index) else {
            return Ok(None);
        };

        let dataset = pass.dataset().await?;
        let data = csv_data(&dataset, index).map_err(GraphError::Render)?;
        Ok(Some(CsvExport { data, link }))
    }

    /// Load and render every dashboard graph concurrently. One failing graph
    /// only fails its own panel.
    pub async fn render_dashboard(&self, entries: &[DashboardEntry]) -> Vec<DashboardPanel> {
        tracing::debug!("Rendering dashboard of {} graphs", entries.len());

        join_all(entries.iter().map(|entry| self.render_panel(entry))).await
    }

    async fn render_panel(&self, entry: &DashboardEntry) -> DashboardPanel {
        let result = match self.store.load(&entry.id, &entry.overrides).await {
            Ok(graph) => self.render(graph).await.map_err(|e| e.to_string()),
            Err(e) => Err(format!("{:#}", e)),
        };

        match result {
            Ok(frame) => DashboardPanel {
                id: entry.id.clone(),
                frame,
                error: None,
            },
            Err(error) => {
                tracing::warn!("Dashboard graph {} failed: {}", entry.id, error);
                DashboardPanel {
                    id: entry.id.clone(),
                    frame: None,
                    error: Some(error),
                }
            }
        }
    }
}
