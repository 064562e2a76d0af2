//! Service configuration and factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use loganalyst_core::traits::ClassificationService;

use crate::remote::{RemoteService, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

/// Environment variable that overrides `service.base_url`.
pub const API_URL_ENV: &str = "LOGANALYST_API_URL";

/// Where the classification service lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Top-level loganalyst configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalystConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    /// Start every session in degraded mode.
    #[serde(default)]
    pub offline: bool,
}

impl AnalystConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.service.timeout_secs.max(1))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `loganalyst.toml` in the current directory
/// 2. `~/.config/loganalyst/config.toml`
///
/// `LOGANALYST_API_URL` overrides the service URL from any source.
pub fn load_config_from(path: Option<&Path>) -> Result<AnalystConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("loganalyst.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<AnalystConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => AnalystConfig::default(),
    };

    if let Ok(url) = std::env::var(API_URL_ENV) {
        if !url.is_empty() {
            config.service.base_url = url;
        }
    }
    config.service.base_url = resolve_env_vars(&config.service.base_url);
    if config.service.base_url.is_empty() {
        config.service.base_url = default_base_url();
    }

    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("loganalyst"))
}

/// Create the remote classification service from its configuration.
pub fn create_service(config: &ServiceConfig) -> Result<Arc<dyn ClassificationService>> {
    let timeout = Duration::from_secs(config.timeout_secs.max(1));
    Ok(Arc::new(RemoteService::new(&config.base_url, timeout)?))
}
