use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub acl: AclConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the console backend, e.g. `http://127.0.0.1:8080`
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            request_timeout_ms: 30_000,
            user_agent: format!("RustMQ Console/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AclConfig {
    /// Resource name cluster ACLs are stored under
    pub cluster_resource_name: String,
    /// Upper bound on in-flight create/delete calls while saving a group
    pub max_concurrent_requests: usize,
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            cluster_resource_name: crate::acl::CLUSTER_RESOURCE_NAME.to_string(),
            max_concurrent_requests: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// One of table, json, yaml, csv
    pub format: String,
    pub no_color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "table".to_string(),
            no_color: false,
        }
    }
}

impl ConsoleConfig {
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ConsoleConfig = toml::from_str(&content)
            .map_err(|e| crate::error::ConsoleError::Config(e.to_string()))?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if !self.api.base_url.starts_with("http://") {
            return Err(crate::error::ConsoleError::InvalidConfig(format!(
                "api.base_url must be an http:// URL, got '{}'",
                self.api.base_url
            )));
        }

        if self.api.request_timeout_ms == 0 {
            return Err(crate::error::ConsoleError::InvalidConfig(
                "api.request_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.acl.cluster_resource_name.is_empty() {
            return Err(crate::error::ConsoleError::InvalidConfig(
                "acl.cluster_resource_name cannot be empty".to_string(),
            ));
        }

        if self.acl.max_concurrent_requests == 0 {
            return Err(crate::error::ConsoleError::InvalidConfig(
                "acl.max_concurrent_requests must be greater than 0".to_string(),
            ));
        }

        if !matches!(self.output.format.as_str(), "table" | "json" | "yaml" | "csv") {
            return Err(crate::error::ConsoleError::InvalidConfig(format!(
                "output.format must be one of table, json, yaml, csv, got '{}'",
                self.output.format
            )));
        }

        Ok(())
    }
}
