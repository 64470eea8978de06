use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Environment variable prefix for configuration overrides.
const ENV_PREFIX: &str = "CONVERGE_";

#[derive(Clone, Default, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub kubernetes: KubeConfiguration,
    pub health: ConnectionHealthConfig,
    pub log_level: Option<String>,
}

/// Get configuration from 1. an optional .yaml file and 2. environment
/// variables (later sources take precedence over earlier ones).
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(path) = path {
        figment = figment.merge(Yaml::file(path));
    }
    let config: Config = figment.merge(Env::prefixed(ENV_PREFIX)).extract()?;
    Ok(config)
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Hash, Default)]
pub enum KubeConfiguration {
    #[serde(rename = "incluster")]
    #[default]
    InCluster,
    #[serde(rename = "external")]
    External(KubeConfigurationExternal),
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Hash)]
pub struct KubeConfigurationExternal {
    pub kube_context: Option<String>,
}

/// Time budget for remote connection health probes. A connection whose last
/// probe is older than period + timeout is considered stale.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Hash)]
pub struct ConnectionHealthConfig {
    pub period_seconds: u64,
    pub timeout_seconds: u64,
}

impl Default for ConnectionHealthConfig {
    fn default() -> Self {
        Self {
            period_seconds: 10,
            timeout_seconds: 3,
        }
    }
}

impl ConnectionHealthConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
