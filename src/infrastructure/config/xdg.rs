//! TOML config file under the user's config directory

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

const APP_DIR: &str = "pastegrab";
const FILE_NAME: &str = "config.toml";

/// Written above the values on every save; `toml` drops comments on load.
const HEADER: &str = "\
# pastegrab configuration
# Durations take ms, s or m units, e.g. \"500ms\" or \"1s500ms\".
# capture_timeout is unbounded unless set; \"none\" also means unbounded.
# paste_modifier is \"control\" or \"meta\".
";

/// Config store at `$XDG_CONFIG_HOME/pastegrab/config.toml`
pub struct XdgConfigStore {
    path: PathBuf,
}

impl XdgConfigStore {
    pub fn new() -> Self {
        Self {
            path: default_path(),
        }
    }

    /// Store backed by an explicit file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn staging_path(&self) -> PathBuf {
        self.path.with_extension("toml.tmp")
    }
}

impl Default for XdgConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

/// `dirs::config_dir()`, else `~/.config`, else the working directory
fn default_path() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_default()
        .join(APP_DIR)
        .join(FILE_NAME)
}

fn render(config: &AppConfig) -> Result<String, ConfigError> {
    let body =
        toml::to_string_pretty(config).map_err(|e| ConfigError::WriteError(e.to_string()))?;
    Ok(format!("{HEADER}\n{body}"))
}

async fn ensure_parent(path: &Path) -> Result<(), ConfigError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .await
            .map_err(|e| ConfigError::WriteError(format!("{}: {e}", parent.display()))),
        _ => Ok(()),
    }
}

#[async_trait]
impl ConfigStore for XdgConfigStore {
    async fn load(&self) -> Result<AppConfig, ConfigError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(AppConfig::empty()),
            Err(e) => {
                return Err(ConfigError::ReadError(format!(
                    "{}: {e}",
                    self.path.display()
                )))
            }
        };

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Writes a sibling file and renames it over the old one, so a failed
    /// write leaves the previous config intact.
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        ensure_parent(&self.path).await?;

        let staging = self.staging_path();
        fs::write(&staging, render(config)?)
            .await
            .map_err(|e| ConfigError::WriteError(format!("{}: {e}", staging.display())))?;

        if let Err(e) = fs::rename(&staging, &self.path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(ConfigError::WriteError(format!(
                "{}: {e}",
                self.path.display()
            )));
        }

        tracing::debug!(path = %self.path.display(), "config saved");
        Ok(())
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    async fn init(&self) -> Result<(), ConfigError> {
        if self.exists() {
            return Err(ConfigError::AlreadyExists(
                self.path.display().to_string(),
            ));
        }
        self.save(&AppConfig::defaults()).await
    }
}
