// Source trait for retrieving the latest telemetry sample
use crate::domain::telemetry::TelemetrySample;
use async_trait::async_trait;
use thiserror::Error;

/// Any reason a fetch did not produce a sample. The poller only keeps the
/// rendered message.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to reach telemetry endpoint: {0}")]
    Transport(String),

    #[error("Failed to fetch data (HTTP {0})")]
    Status(u16),

    #[error("Malformed telemetry payload: {0}")]
    Decode(String),
}

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Retrieve the most recent sample
    async fn fetch_latest(&self) -> Result<TelemetrySample, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_not_empty() {
        assert_eq!(FetchError::Status(500).to_string(), "Failed to fetch data (HTTP 500)");
        assert!(!FetchError::Transport(String::new()).to_string().is_empty());
        assert!(FetchError::Decode("expected value".to_string())
            .to_string()
            .ends_with("expected value"));
    }
}
