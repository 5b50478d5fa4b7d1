// Viewer configuration - Endpoint, poller and server settings
use anyhow::{ensure, Context};
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

const CONFIG_FILE: &str = "config/viewer";
const ENV_PREFIX: &str = "VIEWER";

#[derive(Debug, Deserialize, Clone)]
pub struct ViewerConfig {
    pub endpoint: EndpointSettings,
    pub poller: PollerSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EndpointSettings {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollerSettings {
    pub interval_secs: u64,
    pub live_on_start: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

impl EndpointSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PollerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        self.bind
            .parse()
            .with_context(|| format!("Invalid server.bind address: {}", self.bind))
    }
}

impl ViewerConfig {
    fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.endpoint.url.trim().is_empty(), "endpoint.url must not be empty");
        reqwest::Url::parse(&self.endpoint.url)
            .with_context(|| format!("Invalid endpoint.url: {}", self.endpoint.url))?;
        ensure!(self.endpoint.timeout_secs > 0, "endpoint.timeout_secs must be positive");
        ensure!(self.poller.interval_secs > 0, "poller.interval_secs must be positive");
        self.server.socket_addr()?;
        Ok(())
    }
}

/// `VIEWER__ENDPOINT__URL=...` overrides `[endpoint] url`
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

pub fn load_viewer_config() -> anyhow::Result<ViewerConfig> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(CONFIG_FILE).required(false))
        .add_source(environment());

    parse_viewer_config(builder)
}

fn parse_viewer_config(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<ViewerConfig> {
    let settings = builder
        .set_default("endpoint.timeout_secs", 10_i64)?
        .set_default("poller.interval_secs", 5_i64)?
        .set_default("poller.live_on_start", false)?
        .set_default("server.bind", "0.0.0.0:8080")?
        .build()?;

    let config: ViewerConfig = settings
        .try_deserialize()
        .context("Failed to read viewer configuration")?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn from_toml(toml: &str) -> anyhow::Result<ViewerConfig> {
        parse_viewer_config(
            config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = from_toml(
            r#"
            [endpoint]
            url = "https://example.net/api/latest"
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint.url, "https://example.net/api/latest");
        assert_eq!(config.endpoint.timeout(), Duration::from_secs(10));
        assert_eq!(config.poller.interval(), Duration::from_secs(5));
        assert!(!config.poller.live_on_start);
        assert_eq!(config.server.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_file_values_override_defaults() {
        let config = from_toml(
            r#"
            [endpoint]
            url = "http://127.0.0.1:7071/api/latest"
            timeout_secs = 3

            [poller]
            interval_secs = 2
            live_on_start = true

            [server]
            bind = "127.0.0.1:9000"
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint.timeout_secs, 3);
        assert_eq!(config.poller.interval_secs, 2);
        assert!(config.poller.live_on_start);
        assert_eq!(config.server.bind, "127.0.0.1:9000");
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut vars = config::Map::new();
        vars.insert("VIEWER__POLLER__INTERVAL_SECS".to_string(), "7".to_string());
        vars.insert("VIEWER__POLLER__LIVE_ON_START".to_string(), "true".to_string());

        let builder = config::Config::builder()
            .add_source(File::from_str(
                "[endpoint]\nurl = \"http://localhost/api/latest\"\n",
                FileFormat::Toml,
            ))
            .add_source(environment().source(Some(vars)));
        let config = parse_viewer_config(builder).unwrap();

        assert_eq!(config.poller.interval_secs, 7);
        assert!(config.poller.live_on_start);
    }

    #[test]
    fn test_missing_url_is_rejected() {
        assert!(from_toml("[poller]\ninterval_secs = 5\n").is_err());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(from_toml("[endpoint]\nurl = \"not a url\"\n").is_err());
        assert!(from_toml("[endpoint]\nurl = \"http://localhost\"\n[poller]\ninterval_secs = 0\n").is_err());
        assert!(from_toml("[endpoint]\nurl = \"http://localhost\"\n[server]\nbind = \"nowhere\"\n").is_err());
    }
}
