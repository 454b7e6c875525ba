// Repository trait for graph definition persistence
use crate::domain::graph::{GraphConfig, GraphSummary};
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// The store holds no graph under this id
#[derive(Debug, Error)]
#[error("Graph {0} not found")]
pub struct GraphNotFound(pub String);

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// List every stored graph
    async fn list(&self) -> anyhow::Result<Vec<GraphSummary>>;

    /// Load a graph, with `overrides` replacing stored fields of the same name
    async fn load(&self, id: &str, overrides: &Map<String, Value>) -> anyhow::Result<GraphConfig>;

    /// Store a graph and return its new version hash. Without `force` the
    /// store may refuse a save whose hash is stale.
    async fn save(&self, graph: &GraphConfig, force: bool) -> anyhow::Result<String>;

    async fn rename(&self, id: &str, new_id: &str) -> anyhow::Result<()>;

    async fn delete(&self, id: &str) -> anyhow::Result<()>;
}

/// Shallow-merge `overrides` over a stored graph document
pub fn apply_overrides(mut stored: Value, overrides: &Map<String, Value>) -> Value {
    if let Value::Object(fields) = &mut stored {
        for (key, value) in overrides {
            fields.insert(key.clone(), value.clone());
        }
    }
    stored
}
