//! Uploader configuration management.
//!
//! Settings live in `~/.config/sitereport/config.json`. A missing file
//! means defaults; environment variables override what the file says.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sitereport_storage::StorageConfig;
use sitereport_upload::UploadConfig;

/// Overrides [`StorageConfig::base_url`].
pub const STORAGE_URL_ENV: &str = "SITEREPORT_STORAGE_URL";

/// Everything the uploader reads from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub upload: UploadConfig,
}

impl AppConfig {
    /// Loads `path`, or the default location when `None`, then applies
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(std::env::var(STORAGE_URL_ENV).ok());
        Ok(config)
    }

    /// Reads the file at `path`. Missing or unparsable files yield defaults.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    fn apply_overrides(&mut self, storage_url: Option<String>) {
        if let Some(url) = storage_url.filter(|u| !u.trim().is_empty()) {
            self.storage.base_url = url.trim().to_string();
        }
    }

    /// Writes the config as pretty JSON, readable only by the owner.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, &json)?;
        set_permissions_0600(path);
        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

fn set_permissions_0600(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(config_base_dir()?.join("sitereport").join("config.json"))
}

fn config_base_dir() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata))
    }

    #[cfg(not(target_os = "windows"))]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            if !xdg.is_empty() {
                return Ok(PathBuf::from(xdg));
            }
        }
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config"))
    }
}
