// Telemetry data domain models
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One reading reported by the sensor-ingestion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    pub temperature: f64,
    pub humidity: f64,
    #[serde(rename = "ts_device")]
    pub device_timestamp: i64,
    #[serde(rename = "ts_cloud")]
    pub cloud_timestamp: String,
}

impl TelemetrySample {
    pub fn new(
        device_id: String,
        temperature: f64,
        humidity: f64,
        device_timestamp: i64,
        cloud_timestamp: String,
    ) -> Self {
        Self {
            device_id,
            temperature,
            humidity,
            device_timestamp,
            cloud_timestamp,
        }
    }

    /// Server-side receipt time, if the cloud timestamp is valid RFC 3339
    pub fn cloud_time(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.cloud_timestamp).ok()
    }
}
