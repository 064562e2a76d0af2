pub mod difficulty;
pub mod init;
pub mod leaderboard;
pub mod play;
pub mod status;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use loganalyst_providers::{load_config_from, AnalystConfig, RemoteService};

/// Flags shared by the commands that talk to the classification service.
#[derive(Debug, Default)]
pub struct ServiceArgs {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub config: Option<PathBuf>,
    pub offline: bool,
}

impl ServiceArgs {
    pub fn remote(api_url: Option<String>, config: Option<PathBuf>) -> Self {
        Self {
            api_url,
            config,
            ..Self::default()
        }
    }

    /// Load the config file and apply the command-line overrides on top.
    pub fn resolve(&self) -> Result<AnalystConfig> {
        let mut config = load_config_from(self.config.as_deref())?;
        if let Some(url) = &self.api_url {
            config.service.base_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            anyhow::ensure!(secs >= 1, "timeout must be at least 1 second");
            config.service.timeout_secs = secs;
        }
        config.offline |= self.offline;
        Ok(config)
    }
}

fn remote_service(config: &AnalystConfig) -> Result<RemoteService> {
    RemoteService::new(
        &config.service.base_url,
        Duration::from_secs(config.service.timeout_secs.max(1)),
    )
}
