use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::id::IdStrategy;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into(), format: "pretty".into(), file: None }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ConfigFile {
    pub id_strategy: IdStrategy,
    pub heartbeat_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_message: Option<String>,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub path: PathBuf,
    pub id_strategy: IdStrategy,
    pub heartbeat_secs: u64,
    pub welcome_message: Option<String>,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load `path`, writing a default file there first if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let toml = toml::to_string_pretty(&ConfigFile::default())?;
            if let Some(parent) = path.parent() { fs::create_dir_all(parent)?; }
            fs::write(path, toml).with_context(|| format!("Writing default config {:?}", path))?;
        }
        let content = fs::read_to_string(path).with_context(|| format!("Reading {:?}", path))?;
        let cfg: ConfigFile = toml::from_str(&content).with_context(|| "Parsing config TOML")?;
        Ok(Self {
            path: path.to_path_buf(),
            id_strategy: cfg.id_strategy,
            heartbeat_secs: cfg.heartbeat_secs,
            welcome_message: cfg.welcome_message,
            logging: cfg.logging,
        })
    }

    /// Log file location: the configured one, else next to the config file.
    pub fn log_path(&self) -> PathBuf {
        match &self.logging.file {
            Some(file) => file.clone(),
            None => self.path.with_file_name("inboxr.log"),
        }
    }
}

fn config_path() -> Result<PathBuf> {
    let base = config_dir().context("Could not determine config directory")?;
    Ok(base.join("inboxr").join("config.toml"))
}
