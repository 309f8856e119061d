//! Application configuration.
//!
//! Values are layered: built-in defaults, then `config.toml` under the user's
//! config directory, then `BAZAAR_*` environment variables.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    catalog::Catalog,
    save::{FileStore, PersistenceGateway, DEFAULT_KEY_PREFIX},
};

/// Directory name used under the platform config and data directories.
pub const APP_DIR: &str = "bazaar";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "BAZAAR";

const DEFAULT_CONFIG: &str = r#"# Bazaar configuration.
#
# Directory holding save data and logs.
# data_dir = "/home/me/.local/share/bazaar"

# Namespace prepended to every storage key.
key_prefix = "Bazaar_"

# JSON file listing the shop's items. The built-in stock is used when unset.
# catalog_path = "/home/me/.config/bazaar/catalog.json"
"#;

/// Runtime settings for the service and its frontends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding save data and logs.
    pub data_dir: PathBuf,
    /// Namespace prepended to storage keys.
    pub key_prefix: String,
    /// Optional catalog definition file.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            catalog_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file and the process environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path(), None)
    }

    /// Load configuration from `path` and the environment.
    ///
    /// When `env` is provided it replaces the process environment, which keeps
    /// tests independent of the host.
    pub fn load_from(path: &Path, env: Option<HashMap<String, String>>) -> Result<Self> {
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())?
            .set_default("key_prefix", defaults.key_prefix)?
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).source(env))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let config: Self = settings
            .try_deserialize()
            .context("failed to parse configuration")?;
        Ok(config)
    }

    /// Directory the file store writes into.
    pub fn save_dir(&self) -> PathBuf {
        self.data_dir.join("saves")
    }

    /// Directory for log files.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// File-backed store rooted at [`AppConfig::save_dir`].
    pub fn store(&self) -> FileStore {
        FileStore::new(self.save_dir())
    }

    /// Persistence gateway using the configured namespace.
    pub fn gateway(&self) -> PersistenceGateway {
        PersistenceGateway::with_prefix(self.store(), self.key_prefix.clone())
    }

    /// Shop catalog from the configured file, or the built-in stock.
    pub fn catalog(&self) -> Catalog {
        let Some(path) = self.catalog_path.as_ref() else {
            return Catalog::builtin();
        };
        match Catalog::from_path(path) {
            Ok(catalog) => {
                info!(path = %path.display(), entries = catalog.len(), "catalog loaded");
                catalog
            }
            Err(err) => {
                warn!(?err, "failed to load catalog, using built-in stock");
                Catalog::builtin()
            }
        }
    }
}

/// Location of the user's configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

/// Default data directory under the platform data dir.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Write the commented default configuration if no file exists yet.
pub fn ensure_default_config() -> Result<()> {
    write_default_config(&config_path()).map(|_| ())
}

/// Write the default configuration to `path` unless it exists. Returns
/// whether a file was written.
pub fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote default configuration");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemType;
    use tempfile::tempdir;

    #[test]
    fn defaults_apply_without_file() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(&dir.path().join("missing.toml"), Some(HashMap::new()))?;
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.key_prefix, "Bazaar_");
        assert!(config.catalog_path.is_none());
        Ok(())
    }

    #[test]
    fn default_file_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bazaar").join("config.toml");

        assert!(write_default_config(&path)?);
        assert!(!write_default_config(&path)?);

        let config = AppConfig::load_from(&path, Some(HashMap::new()))?;
        assert_eq!(config.key_prefix, DEFAULT_KEY_PREFIX);
        Ok(())
    }

    #[test]
    fn file_and_environment_layers_override() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        let data_dir = dir.path().join("data");
        fs::write(
            &path,
            format!(
                "data_dir = {:?}\nkey_prefix = \"File_\"\n",
                data_dir.to_string_lossy()
            ),
        )?;

        let config = AppConfig::load_from(&path, Some(HashMap::new()))?;
        assert_eq!(config.key_prefix, "File_");
        assert_eq!(config.data_dir, data_dir);
        assert_eq!(config.save_dir(), data_dir.join("saves"));
        assert_eq!(config.log_dir(), data_dir.join("logs"));

        let env = HashMap::from([("BAZAAR_KEY_PREFIX".to_string(), "Env_".to_string())]);
        let config = AppConfig::load_from(&path, Some(env))?;
        assert_eq!(config.key_prefix, "Env_");
        assert_eq!(config.gateway().prefix(), "Env_");
        Ok(())
    }

    #[test]
    fn catalog_falls_back_to_builtin() -> Result<()> {
        let dir = tempdir()?;
        let mut config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        assert_eq!(config.catalog().len(), Catalog::builtin().len());

        config.catalog_path = Some(dir.path().join("absent.json"));
        assert_eq!(config.catalog().len(), Catalog::builtin().len());

        let path = dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"[{"id": "lute", "itemName": "Lute", "price": 25, "itemType": "Valuable"}]"#,
        )?;
        config.catalog_path = Some(path);
        let catalog = config.catalog();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.entries()[0].record().item_type, ItemType::Valuable);
        Ok(())
    }

    #[test]
    fn gateway_writes_into_save_dir() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let gateway = config.gateway();
        assert!(gateway.save("Probe", &serde_json::json!({"ok": true})));
        assert!(config.save_dir().join("Bazaar_Probe.json").is_file());
        Ok(())
    }
}
