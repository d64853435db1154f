use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::layout::LayoutOptions;
use crate::workflow::NodeDefaults;

const APP_NAME: &str = "atlas";
const CONFIG_FILE: &str = "config.json";
const CACHE_FILE: &str = "atlas.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Port for the HTTP API (overridden by ATLAS_PORT)
    pub port: u16,
    /// Location of the workflow cache (overridden by ATLAS_DB_PATH).
    /// Defaults to the platform data directory.
    pub database_path: Option<PathBuf>,
    pub layout: LayoutOptions,
    pub node_defaults: NodeDefaults,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            database_path: None,
            layout: LayoutOptions::default(),
            node_defaults: NodeDefaults::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the user's config directory, then apply
    /// environment overrides. Falls back to defaults if the file is missing or
    /// fails to parse.
    pub fn load() -> Self {
        let config = match get_config_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config = serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    fn with_env_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(port) = var("ATLAS_PORT").and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        if let Some(path) = var("ATLAS_DB_PATH") {
            self.database_path = Some(PathBuf::from(path));
        }
        self
    }

    /// Save the current configuration to disk.
    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// The configured cache path, or `<data dir>/atlas/atlas.db`.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }
        let dirs = directories::ProjectDirs::from("", "", APP_NAME)
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join(CACHE_FILE))
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}
