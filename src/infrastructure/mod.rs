// Infrastructure layer - Configuration and the HTTP telemetry source
pub mod config;
pub mod http_source;
