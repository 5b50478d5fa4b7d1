// Domain layer - Telemetry values, classification bands and poller state
pub mod classification;
pub mod poller_state;
pub mod telemetry;
