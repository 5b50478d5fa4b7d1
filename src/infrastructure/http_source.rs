// HTTP telemetry source - GET the latest sample from the ingestion endpoint
use crate::application::telemetry_source::{FetchError, TelemetrySource};
use crate::domain::telemetry::TelemetrySample;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpTelemetrySource {
    client: reqwest::Client,
    url: String,
}

impl HttpTelemetrySource {
    pub fn new(url: String, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self::with_client(url, client))
    }

    pub fn with_client(url: String, client: reqwest::Client) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl TelemetrySource for HttpTelemetrySource {
    async fn fetch_latest(&self) -> Result<TelemetrySample, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        // Read the body first so transport and decode failures stay apart
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
