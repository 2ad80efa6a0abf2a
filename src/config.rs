use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::seed::SeedFile;
use crate::storage::{Store, DEFAULT_SCHEMA_VERSION};

/// Seed file read on first open when no other path is configured
pub const DEFAULT_SEED_FILE: &str = "UDBuildingPositions";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    pub database: Option<String>,
    pub seed_file: Option<String>,
    pub schema_version: Option<u32>,
}

impl StoreConfig {
    pub fn database_path(&self) -> PathBuf {
        self.database
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| default_database_path_in(Path::new(".")))
    }

    pub fn seed_path(&self) -> PathBuf {
        PathBuf::from(self.seed_file.as_deref().unwrap_or(DEFAULT_SEED_FILE))
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version.unwrap_or(DEFAULT_SCHEMA_VERSION)
    }

    /// Open the configured database, seeding it from the configured file if empty
    pub fn open_store(&self) -> crate::Result<Store> {
        Store::open(
            &self.database_path(),
            self.schema_version(),
            SeedFile::new(self.seed_path()),
        )
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("udbuildings.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".udbuildings").join("udpositions.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<StoreConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: StoreConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &StoreConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
