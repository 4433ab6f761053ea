//! Dashboard configuration from `.agentguard/dashboard.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use ag_audit::{FilterPipeline, ToolNamespace, DEFAULT_PAGE_SIZE, DEFAULT_TOOL_PREFIX};
use ag_client::{ApiClient, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

/// Config file location relative to the project root.
pub const CONFIG_FILE: &str = ".agentguard/dashboard.toml";

/// Top-level dashboard configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub audit: AuditConfig,

    #[serde(default)]
    pub refresh: RefreshConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// Where the enforcement backend lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout. There are no retries.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Audit table settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Rows added per "load more"
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Namespace prefix tools may be addressed with (e.g. "mcp:")
    #[serde(default = "default_tool_prefix")]
    pub tool_prefix: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            tool_prefix: default_tool_prefix(),
        }
    }
}

/// Auto-refresh for `watch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

/// AI policy generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_model")]
    pub default_model: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
        }
    }
}

// Serde default functions
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_tool_prefix() -> String {
    DEFAULT_TOOL_PREFIX.to_string()
}

fn default_interval_secs() -> u64 {
    5
}

fn default_model() -> String {
    "models/gemini-2.5-pro".to_string()
}

impl DashboardConfig {
    /// Default config path under a project root.
    pub fn path_in(project_root: &Path) -> PathBuf {
        project_root.join(CONFIG_FILE)
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, DashboardError> {
        let content = std::fs::read_to_string(path).map_err(|source| DashboardError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| DashboardError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, defaults otherwise. A file that exists
    /// but does not parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self, DashboardError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no dashboard config, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Override the backend URL (from `--base-url` or `AGENTGUARD_URL`).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.backend.base_url = base_url.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.interval_secs)
    }

    pub fn namespace(&self) -> ToolNamespace {
        ToolNamespace::new(self.audit.tool_prefix.clone())
    }

    pub fn pipeline(&self) -> FilterPipeline {
        FilterPipeline::new(self.audit.page_size, self.namespace())
    }

    pub fn client(&self) -> Result<ApiClient, DashboardError> {
        Ok(ApiClient::new(&self.backend.base_url, self.timeout())?)
    }

    fn validate(&self) -> Result<(), DashboardError> {
        if self.audit.page_size == 0 {
            return Err(DashboardError::InvalidValue {
                key: "audit.page_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.backend.timeout_secs == 0 {
            return Err(DashboardError::InvalidValue {
                key: "backend.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.refresh.interval_secs == 0 {
            return Err(DashboardError::InvalidValue {
                key: "refresh.interval_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
