// Fetch batching and dataset assembly
use crate::application::source_registry::SourceRegistry;
use crate::application::transport::{RawSeries, Transport};
use crate::domain::dataset::{Dataset, TargetResult};
use crate::domain::error::GraphError;
use crate::domain::graph::{ChartKind, GraphConfig};
use crate::domain::time_scale::Timezone;
use crate::domain::variables::{expand_targets, ExpandedTarget, VariableSet};
use anyhow::Context;
use chrono::FixedOffset;
use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const DEFAULT_PERIOD: &str = "15m";

/// Expanded targets that share a source and time shift and so can be
/// fetched with a single request
#[derive(Debug, Clone, PartialEq)]
pub struct FetchBatch {
    pub source: String,
    pub shift: Option<String>,
    pub members: Vec<ExpandedTarget>,
}

/// Partition expanded targets by `(source, shift)`. Members keep expansion
/// order so response positions map back to targets.
pub fn group_targets(targets: Vec<ExpandedTarget>) -> Vec<FetchBatch> {
    let mut groups: BTreeMap<(String, Option<String>), Vec<ExpandedTarget>> = BTreeMap::new();
    for target in targets {
        groups
            .entry((target.source.clone(), target.shift.clone()))
            .or_default()
            .push(target);
    }

    groups
        .into_iter()
        .filter(|(_, members)| !members.is_empty())
        .map(|((source, shift), members)| FetchBatch {
            source,
            shift,
            members,
        })
        .collect()
}

/// Timezone parameter: minutes east of UTC
pub fn timezone_param(offset: FixedOffset) -> String {
    format!("{}m", offset.local_minus_utc() / 60)
}

pub struct DataFetcher {
    transport: Arc<dyn Transport>,
    sources: Arc<SourceRegistry>,
    default_period: String,
    timezone: Timezone,
}

impl DataFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        sources: Arc<SourceRegistry>,
        default_period: impl Into<String>,
        timezone: Timezone,
    ) -> Self {
        Self {
            transport,
            sources,
            default_period: default_period.into(),
            timezone,
        }
    }

    /// Run one fetch pass. Every batch is requested concurrently and the pass
    /// completes only when all of them have; any failed batch fails the pass.
    pub async fn fetch_data(
        &self,
        graph: &GraphConfig,
        variables: &VariableSet,
    ) -> Result<Dataset, GraphError> {
        let batches = group_targets(expand_targets(graph, variables));

        tracing::debug!(
            "Fetching graph {}: {} batches",
            graph.id,
            batches.len()
        );

        let responses = try_join_all(batches.iter().map(|batch| self.fetch_batch(graph, batch)))
            .await
            .map_err(GraphError::Fetch)?;

        let mut dataset = Dataset::new(
            graph
                .active_targets()
                .map(|target| TargetResult::new(target, variables.len()))
                .collect(),
        );

        for (batch, series) in batches.iter().zip(responses) {
            if series.len() != batch.members.len() {
                tracing::warn!(
                    "Source {} returned {} series for {} targets",
                    batch.source,
                    series.len(),
                    batch.members.len()
                );
            }

            for (target, raw) in batch.members.iter().zip(series) {
                dataset.record(target.target_num, target.var_num, &target.label, raw.points());
            }
        }

        Ok(dataset)
    }

    async fn fetch_batch(
        &self,
        graph: &GraphConfig,
        batch: &FetchBatch,
    ) -> anyhow::Result<Vec<RawSeries>> {
        let url = self.sources.resolve(&batch.source)?;
        let params = self.request_params(graph, batch);

        tracing::debug!(
            "Requesting {} targets from {} (shift {:?})",
            batch.members.len(),
            batch.source,
            batch.shift
        );

        self.transport
            .fetch(url, &params)
            .await
            .with_context(|| format!("Failed to fetch from source {}", batch.source))
    }

    fn request_params(&self, graph: &GraphConfig, batch: &FetchBatch) -> Vec<(String, String)> {
        let align = if graph.chart == ChartKind::Table {
            Some("start".to_string())
        } else {
            graph.align.clone()
        };

        let period = graph
            .period
            .clone()
            .unwrap_or_else(|| self.default_period.clone());

        let options = [
            ("from", graph.from.clone()),
            ("until", graph.until.clone()),
            ("period", Some(period)),
            ("align", align),
            ("shift", batch.shift.clone()),
            ("timezone", Some(timezone_param(self.timezone.offset()))),
        ];

        options
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
            .chain(
                batch
                    .members
                    .iter()
                    .map(|t| ("target".to_string(), t.query.clone())),
            )
            .collect()
    }
}
