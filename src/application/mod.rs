// Application layer - Render pipeline and collaborator contracts
pub mod fetch;
pub mod graph_service;
pub mod graph_store;
pub mod refresh;
pub mod render;
pub mod session;
pub mod source_registry;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing {
    use super::fetch::DataFetcher;
    use super::graph_store::{apply_overrides, GraphNotFound, GraphStore};
    use super::render::{RenderFrame, Renderer};
    use super::source_registry::SourceRegistry;
    use super::transport::{RawPoint, RawSeries, Transport};
    use crate::domain::graph::{GraphConfig, GraphSummary, Target};
    use crate::domain::time_scale::Timezone;
    use async_trait::async_trait;
    use chrono::FixedOffset;
    use serde_json::{Map, Value};
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::Barrier;

    pub fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    pub fn registry() -> Arc<SourceRegistry> {
        Arc::new(
            [
                ("graphite", "http://graphite/render"),
                ("other", "http://other/render"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        )
    }

    pub fn fetcher(transport: Arc<MockTransport>) -> Arc<DataFetcher> {
        Arc::new(DataFetcher::new(transport, registry(), "15m", Timezone::Fixed(utc())))
    }

    /// Graph with one target per `(query, source)`, labelled by its query
    pub fn graph(targets: &[(&str, &str)]) -> GraphConfig {
        GraphConfig {
            id: "test".to_string(),
            targets: targets
                .iter()
                .map(|(query, source)| {
                    Some(Target {
                        query: query.to_string(),
                        source: source.to_string(),
                        label: query.to_string(),
                        ..Default::default()
                    })
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Serves canned series keyed by query and records every request
    #[derive(Default)]
    pub struct MockTransport {
        series: HashMap<String, Vec<RawPoint>>,
        delays: HashMap<String, u64>,
        failing: HashSet<String>,
        barrier: Option<Arc<Barrier>>,
        requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl MockTransport {
        pub fn series(mut self, query: &str, points: &[(f64, i64)]) -> Self {
            let points = points
                .iter()
                .map(|&(y, x)| RawPoint(Some(y), Some(x as f64)))
                .collect();
            self.series.insert(query.to_string(), points);
            self
        }

        pub fn raw_series(mut self, query: &str, points: Vec<RawPoint>) -> Self {
            self.series.insert(query.to_string(), points);
            self
        }

        /// Hold every request until `n` requests are in flight at once
        pub fn barrier(mut self, n: usize) -> Self {
            self.barrier = Some(Arc::new(Barrier::new(n)));
            self
        }

        pub fn delay(mut self, url: &str, millis: u64) -> Self {
            self.delays.insert(url.to_string(), millis);
            self
        }

        pub fn fail(mut self, url: &str) -> Self {
            self.failing.insert(url.to_string());
            self
        }

        pub fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn fetch(
            &self,
            url: &str,
            params: &[(String, String)],
        ) -> anyhow::Result<Vec<RawSeries>> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), params.to_vec()));

            if let Some(barrier) = &self.barrier {
                barrier.wait().await;
            }

            if let Some(&millis) = self.delays.get(url) {
                tokio::time::sleep(Duration::from_millis(millis)).await;
            }

            if self.failing.contains(url) {
                anyhow::bail!("backend at {} unavailable", url);
            }

            Ok(params
                .iter()
                .filter(|(key, _)| key == "target")
                .map(|(_, query)| RawSeries {
                    target: Some(query.clone()),
                    datapoints: self.series.get(query).cloned().unwrap_or_default(),
                })
                .collect())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum Drawn {
        Draw(RenderFrame),
        Update(RenderFrame),
    }

    /// Keeps every frame it is handed
    #[derive(Default)]
    pub struct MemoryRenderer {
        pub frames: Mutex<Vec<Drawn>>,
    }

    impl MemoryRenderer {
        pub fn frames(&self) -> Vec<Drawn> {
            self.frames.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Renderer for MemoryRenderer {
        async fn draw(&self, frame: RenderFrame) -> anyhow::Result<()> {
            self.frames.lock().unwrap().push(Drawn::Draw(frame));
            Ok(())
        }

        async fn update(&self, frame: RenderFrame) -> anyhow::Result<()> {
            self.frames.lock().unwrap().push(Drawn::Update(frame));
            Ok(())
        }
    }

    /// Graph documents held in memory
    #[derive(Default)]
    pub struct MemoryStore {
        pub graphs: Mutex<HashMap<String, Value>>,
    }

    impl MemoryStore {
        pub fn with(self, graph: &GraphConfig) -> Self {
            self.graphs
                .lock()
                .unwrap()
                .insert(graph.id.clone(), serde_json::to_value(graph).unwrap());
            self
        }
    }

    #[async_trait]
    impl GraphStore for MemoryStore {
        async fn list(&self) -> anyhow::Result<Vec<GraphSummary>> {
            let graphs = self.graphs.lock().unwrap();
            let mut summaries: Vec<GraphSummary> = graphs
                .values()
                .map(|v| serde_json::from_value(v.clone()))
                .collect::<Result<_, _>>()?;
            summaries.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(summaries)
        }

        async fn load(&self, id: &str, overrides: &Map<String, Value>) -> anyhow::Result<GraphConfig> {
            let stored = self
                .graphs
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| GraphNotFound(id.to_string()))?;
            Ok(serde_json::from_value(apply_overrides(stored, overrides))?)
        }

        async fn save(&self, graph: &GraphConfig, _force: bool) -> anyhow::Result<String> {
            let hash = format!("hash-{}", graph.id);
            let mut stored = graph.clone();
            stored.hash = Some(hash.clone());
            self.graphs
                .lock()
                .unwrap()
                .insert(graph.id.clone(), serde_json::to_value(&stored)?);
            Ok(hash)
        }

        async fn rename(&self, id: &str, new_id: &str) -> anyhow::Result<()> {
            let mut graphs = self.graphs.lock().unwrap();
            let mut stored = graphs
                .remove(id)
                .ok_or_else(|| GraphNotFound(id.to_string()))?;
            stored["id"] = Value::String(new_id.to_string());
            graphs.insert(new_id.to_string(), stored);
            Ok(())
        }

        async fn delete(&self, id: &str) -> anyhow::Result<()> {
            self.graphs.lock().unwrap().remove(id);
            Ok(())
        }
    }
}
