use std::path::PathBuf;

use serde::Deserialize;

/// Top-level ztool configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ZtoolConfig {
    /// Base URL of the member backend (`/apis/*`).
    pub member_api_base: String,
    /// Base URL of the Zalo automation service.
    pub zalo_api_base: String,
    /// Where local records (auth token, linked accounts) live.
    /// Defaults to the platform data dir.
    pub data_dir: Option<PathBuf>,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for ZtoolConfig {
    fn default() -> Self {
        Self {
            member_api_base: "https://app.ztool.vn".into(),
            zalo_api_base: "http://127.0.0.1:3456".into(),
            data_dir: None,
            log: LogConfig::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl ZtoolConfig {
    /// Resolve the data directory: explicit config value, or the platform
    /// default (`~/.local/share/ztool` on Linux).
    #[must_use]
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        directories::ProjectDirs::from("", "", "ztool")
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".ztool"))
    }
}
