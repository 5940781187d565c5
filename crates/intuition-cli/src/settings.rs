//! Host configuration file.
//!
//! ```toml
//! [host]
//! node = "new-atoms"
//! endpoint = "https://testnet.intuition.sh/v1/graphql"
//! timeout_secs = 30
//! interval_secs = 60
//!
//! [trigger]
//! resource = "atoms"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use intuition_core::TriggerConfig;
use intuition_graphql::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};

pub const DEFAULT_NODE: &str = "default";
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostSettings {
    /// Name under which poll state is stored.
    pub node: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub interval_secs: u64,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            node: DEFAULT_NODE.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }
}

impl HostSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub host: HostSettings,
    pub trigger: TriggerConfig,
}

impl Settings {
    pub fn parse(raw: &str) -> Result<Self> {
        let settings: Self = toml::from_str(raw).context("Invalid configuration file")?;
        settings.trigger.validate()?;
        Ok(settings)
    }

    /// Load from `path`, or defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                Self::parse(&raw)
            }
            None => Ok(Self::default()),
        }
    }
}

/// Default location of the file store: the user data dir, or `.intuition/`
/// in the working directory when there is none.
pub fn default_state_file() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("intuition"))
        .unwrap_or_else(|| PathBuf::from(".intuition"))
        .join("state.json")
}
