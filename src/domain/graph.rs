// Graph definition domain models
use serde::{Deserialize, Serialize};

/// How a chart kind is laid out by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Table,
    Chart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChartKind {
    #[default]
    #[serde(rename = "lineChart")]
    Line,
    #[serde(rename = "lineWithFocusChart")]
    LineWithFocus,
    #[serde(rename = "cumulativeLineChart")]
    CumulativeLine,
    #[serde(rename = "linePlusBarChart")]
    LinePlusBar,
    #[serde(rename = "stackedAreaChart")]
    StackedArea,
    #[serde(rename = "multiBarChart")]
    MultiBar,
    #[serde(rename = "multiBarHorizontalChart")]
    MultiBarHorizontal,
    #[serde(rename = "discreteBarChart")]
    DiscreteBar,
    #[serde(rename = "scatterChart")]
    Scatter,
    #[serde(rename = "multiChart")]
    Multi,
    #[serde(rename = "table")]
    Table,
}

impl ChartKind {
    pub fn layout(self) -> Layout {
        match self {
            ChartKind::Table => Layout::Table,
            _ => Layout::Chart,
        }
    }

    /// Kinds that stack or group series by time position need every series
    /// to share the same x-axis.
    pub fn requires_matching_cardinality(self) -> bool {
        matches!(
            self,
            ChartKind::Table | ChartKind::StackedArea | ChartKind::MultiBar
        )
    }
}

/// Fixed time domain in epoch seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleDomain {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<String>,
}

impl Target {
    pub fn is_bar(&self) -> bool {
        self.kind.as_deref() == Some("bar")
    }

    /// Secondary axis is numbered 2, everything else renders on axis 1
    pub fn y_axis(&self) -> u8 {
        if self.axis.as_deref() == Some("right") { 2 } else { 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    #[serde(default)]
    pub chart: ChartKind,
    #[serde(default)]
    pub invert: bool,
    #[serde(default)]
    pub sum_cols: bool,
    #[serde(default)]
    pub sum_rows: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<u64>,
    #[serde(default)]
    pub targets: Vec<Option<Target>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleDomain>,
}

impl GraphConfig {
    /// Targets that take part in a fetch pass. Absent or blank targets are
    /// skipped and do not consume a target number.
    pub fn active_targets(&self) -> impl Iterator<Item = &Target> {
        self.targets
            .iter()
            .flatten()
            .filter(|t| !t.query.trim().is_empty())
    }

    pub fn has_targets(&self) -> bool {
        self.active_targets().next().is_some()
    }

    pub fn has_variables(&self) -> bool {
        self.active_targets().any(|t| query_has_variables(&t.query))
    }
}

pub fn query_has_variables(query: &str) -> bool {
    query.contains('$')
}

/// Listing entry returned by the graph store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSummary {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartKind>,
}
