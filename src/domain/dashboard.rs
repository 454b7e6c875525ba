// Dashboard domain model
use serde::Deserialize;
use serde_json::{Map, Value};

/// One graph on a dashboard, with the fields it overrides for this view
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashboardEntry {
    pub id: String,
    #[serde(default)]
    pub overrides: Map<String, Value>,
}
