//! Connection settings for the Personalizer service.
//!
//! Read from an `appsettings.json`-style file and overridden by environment
//! variables. Empty strings count as missing.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const ENV_ENDPOINT_KEY: &str = "PERSONALIZER_ENDPOINT_KEY";
pub const ENV_RESOURCE_NAME: &str = "PERSONALIZER_RESOURCE_NAME";
pub const ENV_ENDPOINT: &str = "PERSONALIZER_ENDPOINT";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppSettings {
    pub personalizer_endpoint_key: Option<String>,
    pub personalizer_resource_name: Option<String>,
    /// Full endpoint URL; takes precedence over the resource name.
    pub personalizer_endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Resolved settings needed to talk to the service.
#[derive(Debug, Clone)]
pub struct PersonalizerConfig {
    pub endpoint: String,
    pub key: String,
    pub timeout: Duration,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AppSettings {
    /// Loads the settings file. A missing file yields empty settings unless
    /// `required` is set.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        if !path.exists() {
            if required {
                anyhow::bail!("Config file {:?} does not exist", path);
            }
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid config {:?}", path))
    }

    /// Applies environment overrides, looked up through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = non_empty(lookup(ENV_ENDPOINT_KEY)) {
            self.personalizer_endpoint_key = Some(v);
        }
        if let Some(v) = non_empty(lookup(ENV_RESOURCE_NAME)) {
            self.personalizer_resource_name = Some(v);
        }
        if let Some(v) = non_empty(lookup(ENV_ENDPOINT)) {
            self.personalizer_endpoint = Some(v);
        }
        self
    }

    pub fn resolve(self) -> Result<PersonalizerConfig> {
        let key = non_empty(self.personalizer_endpoint_key).with_context(|| {
            format!("PersonalizerEndpointKey (or {ENV_ENDPOINT_KEY}) is required")
        })?;
        let endpoint = match (
            non_empty(self.personalizer_endpoint),
            non_empty(self.personalizer_resource_name),
        ) {
            (Some(endpoint), _) => endpoint,
            (None, Some(resource)) => format!("https://{resource}.cognitiveservices.azure.com/"),
            (None, None) => anyhow::bail!(
                "PersonalizerResourceName or PersonalizerEndpoint (or {ENV_RESOURCE_NAME} / {ENV_ENDPOINT}) is required"
            ),
        };
        Ok(PersonalizerConfig {
            endpoint,
            key,
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        })
    }
}
