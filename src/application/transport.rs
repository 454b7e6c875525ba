// Transport trait for metrics backend access
use crate::domain::dataset::SeriesPoint;
use async_trait::async_trait;
use serde::Deserialize;

/// A raw `[value, timestamp]` datapoint; either half may be null
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RawPoint(pub Option<f64>, pub Option<f64>);

/// One series of a render response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSeries {
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub datapoints: Vec<RawPoint>,
}

impl RawSeries {
    pub fn points(&self) -> Vec<SeriesPoint> {
        self.datapoints
            .iter()
            .map(|RawPoint(value, timestamp)| SeriesPoint::from_raw(*value, *timestamp))
            .collect()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one render request. The response holds one series per `target`
    /// parameter, in request order.
    async fn fetch(&self, url: &str, params: &[(String, String)]) -> anyhow::Result<Vec<RawSeries>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let json = r#"[{"target": "cpu.load", "datapoints": [[1.5, 60], [null, 120], [2, null]]}]"#;
        let series: Vec<RawSeries> = serde_json::from_str(json).unwrap();

        assert_eq!(series[0].target.as_deref(), Some("cpu.load"));
        assert_eq!(
            series[0].points(),
            vec![
                SeriesPoint::new(60, 1.5),
                SeriesPoint::new(120, 0.0),
                SeriesPoint::new(0, 2.0),
            ]
        );
    }
}
