use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::client::DEFAULT_ENDPOINT;

/// Environment variable that overrides the configured endpoint
pub const ENDPOINT_ENV: &str = "ASKPANEL_ENDPOINT";

/// Default number of text rows the terminal input may grow to
pub const DEFAULT_INPUT_MAX_ROWS: u16 = 4;

/// Upper bound on the configured input rows
pub const MAX_INPUT_MAX_ROWS: u16 = 20;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub endpoint: Option<String>,
    pub input_max_rows: Option<u16>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Pick the endpoint: explicit override, then `ASKPANEL_ENDPOINT`, then
    /// the config file, then the built-in default.
    pub fn resolve_endpoint(&self, cli_override: Option<&str>) -> String {
        match cli_override {
            Some(endpoint) => endpoint.to_string(),
            None => self.resolve_endpoint_with(None, std::env::var(ENDPOINT_ENV).ok()),
        }
    }

    fn resolve_endpoint_with(&self, cli_override: Option<&str>, env_value: Option<String>) -> String {
        cli_override
            .map(str::to_string)
            .or_else(|| env_value.filter(|v| !v.trim().is_empty()))
            .or_else(|| self.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    pub fn input_max_rows(&self) -> u16 {
        self.input_max_rows
            .unwrap_or(DEFAULT_INPUT_MAX_ROWS)
            .clamp(1, MAX_INPUT_MAX_ROWS)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("askpanel").join("config.json"))
    }
}
