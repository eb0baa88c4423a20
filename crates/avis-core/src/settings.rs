// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::flatten::ExpansionMode;
use crate::schedule::RetryPolicy;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// User settings persisted as `settings.json` in the config root.
/// Every field has a default, so partial files are fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// OurAirports `airports.csv` export.
    pub airports_path: PathBuf,
    pub token_url: String,
    pub schedule_url: String,
    pub retry_delay_secs: u64,
    pub max_retries: u32,
    pub expansion: ExpansionMode,
    /// Client id for the OAuth client-credentials grant. The secret is
    /// only taken from the command line or environment.
    pub client_id: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            airports_path: PathBuf::from("resources/airports_ourairports.csv"),
            token_url: crate::auth::TOKEN_URL.to_string(),
            schedule_url: crate::schedule::SCHEDULE_URL.to_string(),
            retry_delay_secs: 5,
            max_retries: 5,
            expansion: ExpansionMode::Legacy,
            client_id: None,
        }
    }
}

impl Settings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            delay: Duration::from_secs(self.retry_delay_secs),
            max_retries: self.max_retries,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettingsManager {
    path: PathBuf,
}

impl Default for SettingsManager {
    fn default() -> Self {
        Self::new(crate::get_config_root().join("settings.json"))
    }
}

impl SettingsManager {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads settings, falling back to defaults when the file does not exist.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let manager = SettingsManager::new(dir.path().join("settings.json"));
        assert_eq!(manager.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"max_retries": 2, "expansion": "hop_by_hop"}"#).unwrap();

        let settings = SettingsManager::new(&path).load().unwrap();
        assert_eq!(settings.max_retries, 2);
        assert_eq!(settings.expansion, ExpansionMode::HopByHop);
        assert_eq!(settings.retry_delay_secs, 5);
        assert_eq!(settings.retry_policy().max_retries, 2);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let manager = SettingsManager::new(dir.path().join("nested").join("settings.json"));
        let settings = Settings {
            client_id: Some("my-client".to_string()),
            retry_delay_secs: 1,
            ..Settings::default()
        };
        manager.save(&settings).unwrap();
        assert_eq!(manager.load().unwrap(), settings);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(SettingsManager::new(&path).load().is_err());
    }
}
