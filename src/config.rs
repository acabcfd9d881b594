use anyhow::Context;

use serde::{Deserialize, Serialize};

use tokio::sync::OnceCell;

use tracing::info;

use std::time::Duration;

pub const ROUTE_PATH_ENV_VAR: &str = "VERSION_RESPONDER_ROUTE_PATH";

pub const VERSION_ENV_VAR: &str = "VERSION_RESPONDER_VERSION";

#[derive(Debug, Deserialize, Serialize)]
pub struct ConnectionConfiguration {
    #[serde(with = "humantime_serde")]
    pub max_lifetime: Duration,
    #[serde(with = "humantime_serde")]
    pub graceful_shutdown_timeout: Duration,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerConfiguration {
    pub bind_address: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub connection: ConnectionConfiguration,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct VersionConfiguration {
    pub route_path: String,
    pub version: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Configuration {
    pub server_configuration: ServerConfiguration,
    pub version_configuration: VersionConfiguration,
}

impl Configuration {
    /// Replaces route path and version with values found by `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(route_path) = lookup(ROUTE_PATH_ENV_VAR) {
            info!("{} overrides route_path = {:?}", ROUTE_PATH_ENV_VAR, route_path);
            self.version_configuration.route_path = route_path;
        }

        if let Some(version) = lookup(VERSION_ENV_VAR) {
            info!("{} overrides version = {:?}", VERSION_ENV_VAR, version);
            self.version_configuration.version = version;
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.server_configuration.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than zero");
        }

        if self.version_configuration.version.is_empty() {
            anyhow::bail!("version must not be empty");
        }

        Ok(())
    }
}

static CONFIGURATION_INSTANCE: OnceCell<Configuration> = OnceCell::const_new();

fn parse_configuration(file_contents: &str) -> anyhow::Result<Configuration> {
    let configuration: Configuration =
        toml::from_str(file_contents).context("error unmarshalling config file")?;

    Ok(configuration)
}

pub async fn read_configuration(config_file: String) -> anyhow::Result<&'static Configuration> {
    info!("reading '{}'", config_file);

    let file_contents = tokio::fs::read_to_string(&config_file)
        .await
        .with_context(|| format!("error reading config file '{}'", config_file))?;

    let mut configuration = parse_configuration(&file_contents)
        .with_context(|| format!("error parsing config file '{}'", config_file))?;

    configuration.apply_overrides(|key| std::env::var(key).ok());

    configuration
        .validate()
        .with_context(|| format!("invalid configuration in '{}'", config_file))?;

    info!("configuration\n{:#?}", configuration);

    CONFIGURATION_INSTANCE
        .set(configuration)
        .context("CONFIGURATION_INSTANCE.set error")?;

    instance()
}

pub fn instance() -> anyhow::Result<&'static Configuration> {
    CONFIGURATION_INSTANCE
        .get()
        .context("configuration has not been read")
}
