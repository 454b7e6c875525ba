// HTTP transport to graphite-style render endpoints
use crate::application::transport::{RawSeries, Transport};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str, params: &[(String, String)]) -> Result<Vec<RawSeries>> {
        let response = self
            .client
            .get(url)
            .query(params)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Render request to {} failed with status {}: {}", url, status, body);
        }

        let series = response
            .json::<Vec<RawSeries>>()
            .await
            .context("Failed to parse render response")?;

        tracing::debug!("Received {} series from {}", series.len(), url);

        Ok(series)
    }
}
