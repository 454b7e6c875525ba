// Render frames and the renderer contract
use crate::application::fetch::DataFetcher;
use crate::domain::dataset::Dataset;
use crate::domain::error::GraphError;
use crate::domain::export::{export_links, ExportLink};
use crate::domain::graph::{ChartKind, GraphConfig, Layout};
use crate::domain::table::{table_cells, TableCell, TableGrid, TableOptions, TableRow};
use crate::domain::time_scale::{TimeScale, Timezone};
use crate::domain::variables::VariableSet;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartFrame {
    pub chart: ChartKind,
    pub dataset: Dataset,
    pub domain: (i64, i64),
    pub ticks: Vec<i64>,
    pub tick_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFrame {
    pub items: Vec<TableRow>,
    pub cells: Vec<Vec<TableCell>>,
    pub exports: Vec<ExportLink>,
    pub invert: bool,
    pub sum_rows: bool,
    pub sum_cols: bool,
}

/// What a renderer receives for one pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layout", rename_all = "camelCase")]
pub enum RenderFrame {
    Chart(ChartFrame),
    Table(TableFrame),
}

#[async_trait]
pub trait Renderer: Send + Sync {
    /// First frame of a session
    async fn draw(&self, frame: RenderFrame) -> anyhow::Result<()>;

    /// Replace the content of a drawn frame after a refresh
    async fn update(&self, frame: RenderFrame) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct RenderSettings {
    pub default_refresh: Option<u64>,
    pub tick_count: usize,
    pub timezone: Timezone,
}

/// A graph with its variables parsed, ready to run fetch passes. Refresh
/// ticks reuse it so the variables are parsed once per draw.
pub struct RenderPass {
    graph: GraphConfig,
    variables: VariableSet,
    fetcher: Arc<DataFetcher>,
    settings: RenderSettings,
}

impl RenderPass {
    pub fn new(
        graph: GraphConfig,
        fetcher: Arc<DataFetcher>,
        settings: RenderSettings,
    ) -> Result<Self, GraphError> {
        let variables = VariableSet::parse(graph.variables.as_deref())?;
        Ok(Self {
            graph,
            variables,
            fetcher,
            settings,
        })
    }

    pub fn graph(&self) -> &GraphConfig {
        &self.graph
    }

    pub fn variables(&self) -> &VariableSet {
        &self.variables
    }

    /// Refresh interval, if the graph (or the default) asks for one
    pub fn refresh_period(&self) -> Option<Duration> {
        self.graph
            .refresh
            .or(self.settings.default_refresh)
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }

    /// Fetch a fresh dataset owned by this call
    pub async fn dataset(&self) -> Result<Dataset, GraphError> {
        self.fetcher.fetch_data(&self.graph, &self.variables).await
    }

    /// Fetch, validate and lay out one frame
    pub async fn frame(&self) -> Result<RenderFrame, GraphError> {
        let dataset = self.dataset().await?;
        self.build_frame(dataset)
    }

    pub fn build_frame(&self, dataset: Dataset) -> Result<RenderFrame, GraphError> {
        dataset.validate(self.graph.chart)?;

        let scale = TimeScale::for_graph(self.graph.scale, &dataset, self.settings.timezone.offset());
        let frame = match self.graph.chart.layout() {
            Layout::Table => RenderFrame::Table(self.table_frame(&dataset, &scale)),
            Layout::Chart => RenderFrame::Chart(self.chart_frame(dataset, &scale)),
        };

        Ok(frame)
    }

    fn table_frame(&self, dataset: &Dataset, scale: &TimeScale) -> TableFrame {
        let options = TableOptions {
            sum_rows: self.graph.sum_rows,
            sum_cols: self.graph.sum_cols,
            invert: self.graph.invert,
        };

        let items = TableGrid::build(dataset, &self.variables, scale, options).into_rows();
        let cells = items
            .iter()
            .enumerate()
            .map(|(i, item)| table_cells(item, i, &self.variables))
            .collect();

        TableFrame {
            items,
            cells,
            exports: export_links(&self.graph.id, &self.variables),
            invert: options.invert,
            sum_rows: options.sum_rows,
            sum_cols: options.sum_cols,
        }
    }

    fn chart_frame(&self, dataset: Dataset, scale: &TimeScale) -> ChartFrame {
        let tick_count = self.graph.tick_count.unwrap_or(self.settings.tick_count);
        ChartFrame {
            chart: self.graph.chart,
            domain: scale.domain(),
            ticks: scale.ticks(tick_count),
            tick_count,
            dataset,
        }
    }
}
