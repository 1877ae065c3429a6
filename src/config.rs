use std::time::Duration;

use serde::Deserialize;

use crate::client::{TerneoClient, TerneoClientBuilder};
use crate::{Error, Result};

fn default_timeout() -> u64 {
    5
}

/// Per-device settings as handed over by the host.
///
/// ```
/// let config: terneo_ax::ThermostatConfig =
///     serde_json::from_str(r#"{"host": "192.168.1.40", "name": "Hall"}"#).unwrap();
/// assert_eq!(config.timeout, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ThermostatConfig {
    pub host: String,
    /// Request timeout in seconds, at least 1.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub name: Option<String>,
}

impl ThermostatConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            timeout: default_timeout(),
            name: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("host must not be empty".to_string()));
        }
        if self.timeout < 1 {
            return Err(Error::Config(format!(
                "timeout must be at least 1 second, got {}",
                self.timeout
            )));
        }
        Ok(())
    }

    pub fn client_builder(&self) -> Result<TerneoClientBuilder> {
        self.validate()?;
        let mut builder =
            TerneoClient::builder(self.host.trim()).timeout(Duration::from_secs(self.timeout));
        if let Some(ref name) = self.name {
            builder = builder.name(name);
        }
        Ok(builder)
    }
}
