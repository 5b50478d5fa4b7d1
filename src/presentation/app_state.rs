// Application state for HTTP handlers
use crate::application::poller::TelemetryPoller;

pub struct AppState {
    pub poller: TelemetryPoller,
}
