// Dashboard view model built from a poller state snapshot
use crate::domain::classification::{HumidityBand, TemperatureBand};
use crate::domain::poller_state::{PollerPhase, PollerState};
use crate::domain::telemetry::TelemetrySample;
use chrono::{DateTime, Utc};
use serde::Serialize;

const ERROR_TITLE: &str = "Connection Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    /// No fetch has completed yet
    Connecting,
    Reading,
    NoData,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBanner {
    pub title: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadingView {
    pub value: f64,
    pub display: String,
    pub band: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleView {
    pub device_id: String,
    pub temperature: ReadingView,
    pub humidity: ReadingView,
    pub device_timestamp: i64,
    pub cloud_timestamp: String,
    pub cloud_received: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub phase: PollerPhase,
    pub status: DisplayStatus,
    pub error: Option<ErrorBanner>,
    pub sample: Option<SampleView>,
    pub live_enabled: bool,
    pub can_refresh: bool,
    pub last_success_time: Option<DateTime<Utc>>,
}

impl ReadingView {
    fn new(value: f64, unit: &str, band: &'static str) -> Self {
        Self {
            value,
            display: format!("{:.1}{}", value, unit),
            band,
        }
    }
}

impl SampleView {
    fn new(sample: &TelemetrySample) -> Self {
        Self {
            device_id: sample.device_id.clone(),
            temperature: ReadingView::new(
                sample.temperature,
                "°C",
                TemperatureBand::classify(sample.temperature).label(),
            ),
            humidity: ReadingView::new(
                sample.humidity,
                "%",
                HumidityBand::classify(sample.humidity).label(),
            ),
            device_timestamp: sample.device_timestamp,
            cloud_timestamp: sample.cloud_timestamp.clone(),
            cloud_received: sample
                .cloud_time()
                .map(|t| t.with_timezone(&Utc).format("%H:%M:%S UTC").to_string()),
        }
    }
}

impl DashboardView {
    pub fn from_state(state: &PollerState) -> Self {
        let sample = state.last_sample().map(SampleView::new);
        let status = match (&sample, state.initial_load_done()) {
            (Some(_), _) => DisplayStatus::Reading,
            (None, false) => DisplayStatus::Connecting,
            (None, true) => DisplayStatus::NoData,
        };

        Self {
            phase: state.phase(),
            status,
            error: state.last_error().map(|message| ErrorBanner {
                title: ERROR_TITLE,
                message: message.to_string(),
            }),
            sample,
            live_enabled: state.live_enabled(),
            can_refresh: state.can_refresh(),
            last_success_time: state.last_success_time(),
        }
    }
}
