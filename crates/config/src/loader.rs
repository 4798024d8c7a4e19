use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::schema::ZtoolConfig;

const CONFIG_FILENAME: &str = "ztool.toml";

/// Load config from the given path.
pub fn load_config(path: &Path) -> anyhow::Result<ZtoolConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let mut cfg: ZtoolConfig = toml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./ztool.toml` (project-local)
/// 2. `~/.config/ztool/ztool.toml` (user-global)
///
/// Returns defaults (plus env overrides) if no config file is found or the
/// file fails to load.
pub fn discover_and_load() -> ZtoolConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    let mut cfg = ZtoolConfig::default();
    apply_env_overrides(&mut cfg);
    cfg
}

/// `ZTOOL_MEMBER_API` / `ZTOOL_ZALO_API` override whatever the file says.
fn apply_env_overrides(cfg: &mut ZtoolConfig) {
    if let Ok(base) = std::env::var("ZTOOL_MEMBER_API")
        && !base.is_empty()
    {
        cfg.member_api_base = base;
    }
    if let Ok(base) = std::env::var("ZTOOL_ZALO_API")
        && !base.is_empty()
    {
        cfg.zalo_api_base = base;
    }
}

fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }
    if let Some(dirs) = directories::ProjectDirs::from("", "", "ztool") {
        let p = dirs.config_dir().join(CONFIG_FILENAME);
        if p.exists() {
            return Some(p);
        }
    }
    None
}
