// Application layer - Polling use case and the source it depends on
pub mod poller;
pub mod telemetry_source;
