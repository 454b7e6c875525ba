// Merged fetch results
use super::error::GraphError;
use super::graph::{ChartKind, Target};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Upper bound on points in any one series before a render is refused
pub const MAX_DATA_POINTS: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub x: i64,
    pub y: f64,
}

impl SeriesPoint {
    pub fn new(x: i64, y: f64) -> Self {
        Self { x, y }
    }

    /// Build a point from a raw `[value, timestamp]` pair. Missing or
    /// non-numeric parts become zero, as do timestamps no calendar can hold.
    pub fn from_raw(value: Option<f64>, timestamp: Option<f64>) -> Self {
        let min = DateTime::<Utc>::MIN_UTC.timestamp() as f64;
        let max = DateTime::<Utc>::MAX_UTC.timestamp() as f64;
        let x = timestamp
            .filter(|t| (min..=max).contains(t))
            .unwrap_or(0.0) as i64;
        let y = value.filter(|v| !v.is_nan()).unwrap_or(0.0);
        Self { x, y }
    }
}

/// Everything fetched for one target, one series per variable binding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetResult {
    pub key: String,
    pub values: Vec<SeriesPoint>,
    pub results: Vec<Vec<SeriesPoint>>,
    pub bar: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub y_axis: u8,
}

impl TargetResult {
    pub fn new(target: &Target, bindings: usize) -> Self {
        Self {
            key: String::new(),
            values: Vec::new(),
            results: vec![Vec::new(); bindings],
            bar: target.is_bar(),
            kind: target.kind.clone(),
            y_axis: target.y_axis(),
        }
    }
}

/// Dataset of one fetch pass, indexed by target number
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Dataset {
    targets: Vec<TargetResult>,
}

/// Result of comparing the x-axes of every series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cardinality {
    pub matches: bool,
    pub lengths: Vec<usize>,
}

impl Cardinality {
    pub fn max_len(&self) -> usize {
        self.lengths.iter().copied().max().unwrap_or(0)
    }
}

impl Dataset {
    pub fn new(targets: Vec<TargetResult>) -> Self {
        Self { targets }
    }

    pub fn targets(&self) -> &[TargetResult] {
        &self.targets
    }

    /// Store the series fetched for one expanded target. Only the first
    /// binding names the target and provides its chart values.
    pub fn record(
        &mut self,
        target_num: usize,
        var_num: usize,
        label: &str,
        points: Vec<SeriesPoint>,
    ) {
        let Some(item) = self.targets.get_mut(target_num) else {
            return;
        };

        if var_num == 0 {
            item.key = label.to_string();
            item.values = points.clone();
        }

        if item.results.len() <= var_num {
            item.results.resize(var_num + 1, Vec::new());
        }
        item.results[var_num] = points;
    }

    /// x coordinates of every series, target-major
    pub fn time_vals(&self) -> Vec<Vec<i64>> {
        self.targets
            .iter()
            .flat_map(|t| t.results.iter())
            .map(|series| series.iter().map(|p| p.x).collect())
            .collect()
    }

    pub fn cardinality(&self) -> Cardinality {
        let time_vals = self.time_vals();
        let lengths: Vec<usize> = time_vals.iter().map(Vec::len).collect();
        let longest = lengths.iter().copied().max().unwrap_or(0);

        let matches = (0..longest).all(|i| {
            let first = time_vals.first().and_then(|xs| xs.get(i));
            time_vals.iter().all(|xs| xs.get(i) == first)
        });

        Cardinality { matches, lengths }
    }

    /// Reject datasets the chart kind cannot draw
    pub fn validate(&self, chart: ChartKind) -> Result<(), GraphError> {
        let cardinality = self.cardinality();
        let max_len = cardinality.max_len();

        if !cardinality.matches && chart.requires_matching_cardinality() {
            return Err(GraphError::Cardinality);
        }

        if max_len > MAX_DATA_POINTS {
            return Err(GraphError::DataVolume {
                actual: max_len,
                max: MAX_DATA_POINTS,
            });
        }

        Ok(())
    }
}
