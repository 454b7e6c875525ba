// Errors that end a render pass
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Error parsing JSON for macro variables; {0}")]
    ConfigParse(String),
    #[error("Cardinality of data sets must match for this type of chart.")]
    Cardinality,
    #[error("Too many data points. Your query returns {actual}, but the maximum is {max}.")]
    DataVolume { actual: usize, max: usize },
    #[error("failed to fetch data: {0:#}")]
    Fetch(#[source] anyhow::Error),
    #[error("renderer rejected frame: {0:#}")]
    Render(#[source] anyhow::Error),
}
