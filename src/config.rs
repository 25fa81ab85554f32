//! Configuration management for Dialer.
//!
//! This module handles loading and saving application configuration to/from
//! a JSON file. The config directory can be customized.
//!
//! Settings:
//! - data_dir: where the file-backed key/value store keeps its documents
//! - contacts_key / call_history_key: storage keys of the two collections
//! - recent_calls_limit: default size of the recent calls list
//! - date_format: strftime pattern for calls older than a week

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::call_history::{
    is_valid_date_format, DEFAULT_CALL_HISTORY_KEY, DEFAULT_DATE_FORMAT, DEFAULT_RECENT_LIMIT,
};
use crate::contacts::DEFAULT_CONTACTS_KEY;
use crate::persistence::file_stem_for;
use crate::error::{DialerError, DialerResult};

const CONFIG_FILE_NAME: &str = "config.json";

fn default_contacts_key() -> String {
    DEFAULT_CONTACTS_KEY.to_string()
}

fn default_call_history_key() -> String {
    DEFAULT_CALL_HISTORY_KEY.to_string()
}

fn default_recent_calls_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigData {
    /// Directory holding the stored collections
    #[serde(default)]
    pub data_dir: String,
    #[serde(default = "default_contacts_key")]
    pub contacts_key: String,
    #[serde(default = "default_call_history_key")]
    pub call_history_key: String,
    #[serde(default = "default_recent_calls_limit")]
    pub recent_calls_limit: usize,
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for ConfigData {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            contacts_key: default_contacts_key(),
            call_history_key: default_call_history_key(),
            recent_calls_limit: default_recent_calls_limit(),
            date_format: default_date_format(),
        }
    }
}

impl ConfigData {
    fn defaults_for(config_dir: &Path) -> Self {
        Self {
            data_dir: config_dir.join("data").to_string_lossy().to_string(),
            ..Self::default()
        }
    }
}

/// Configuration manager
pub struct Config {
    config_dir: PathBuf,
    config_file: PathBuf,
    data: ConfigData,
}

impl Config {
    /// Create a new configuration manager
    ///
    /// Without the `desktop` feature, `config_dir` is required.
    pub fn new(config_dir: Option<PathBuf>) -> DialerResult<Self> {
        let config_dir = match config_dir {
            Some(dir) => dir,
            None => {
                #[cfg(feature = "desktop")]
                {
                    dirs::config_dir()
                        .unwrap_or_else(|| PathBuf::from("."))
                        .join("dialer")
                }
                #[cfg(not(feature = "desktop"))]
                {
                    return Err(DialerError::Config(
                        "config_dir is required on mobile platforms".to_string(),
                    ));
                }
            }
        };

        fs::create_dir_all(&config_dir)?;
        let config_file = config_dir.join(CONFIG_FILE_NAME);

        let data = match fs::read_to_string(&config_file) {
            Ok(content) => match serde_json::from_str::<ConfigData>(&content) {
                Ok(mut data) => {
                    if data.data_dir.is_empty() {
                        data.data_dir = ConfigData::defaults_for(&config_dir).data_dir;
                    }
                    data
                }
                Err(e) => {
                    tracing::warn!(path = %config_file.display(), error = %e, "Config file unparsable, using defaults");
                    ConfigData::defaults_for(&config_dir)
                }
            },
            Err(_) => ConfigData::defaults_for(&config_dir),
        };

        let config = Self {
            config_dir,
            config_file,
            data,
        };

        // Save default config if it doesn't exist
        if !config.config_file.exists() {
            config.save()?;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> DialerResult<()> {
        let content = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.config_file, content)?;
        Ok(())
    }

    /// Get the configuration directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data(&self) -> &ConfigData {
        &self.data
    }

    /// Directory used by the file-backed store
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data.data_dir)
    }

    pub fn contacts_key(&self) -> &str {
        &self.data.contacts_key
    }

    pub fn call_history_key(&self) -> &str {
        &self.data.call_history_key
    }

    pub fn recent_calls_limit(&self) -> usize {
        self.data.recent_calls_limit
    }

    pub fn set_recent_calls_limit(&mut self, limit: usize) -> DialerResult<()> {
        if limit == 0 {
            return Err(DialerError::validation(
                "recent_calls_limit",
                "must be at least 1",
            ));
        }
        self.data.recent_calls_limit = limit;
        self.save()
    }

    pub fn date_format(&self) -> &str {
        &self.data.date_format
    }

    pub fn set_date_format(&mut self, format: &str) -> DialerResult<()> {
        if !is_valid_date_format(format) {
            return Err(DialerError::validation(
                "date_format",
                format!("'{}' is not a valid date format", format),
            ));
        }
        self.data.date_format = format.to_string();
        self.save()
    }

    /// Get a configuration value
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "data_dir" => Some(self.data.data_dir.clone()),
            "contacts_key" => Some(self.data.contacts_key.clone()),
            "call_history_key" => Some(self.data.call_history_key.clone()),
            "recent_calls_limit" => Some(self.data.recent_calls_limit.to_string()),
            "date_format" => Some(self.data.date_format.clone()),
            _ => None,
        }
    }

    /// Set a configuration value
    pub fn set(&mut self, key: &str, value: &str) -> DialerResult<()> {
        match key {
            "data_dir" => self.data.data_dir = value.to_string(),
            "contacts_key" | "call_history_key" if value.trim().is_empty() => {
                return Err(DialerError::validation(key, "cannot be empty"));
            }
            "contacts_key" => {
                check_distinct_keys(value, &self.data.call_history_key)?;
                self.data.contacts_key = value.to_string();
            }
            "call_history_key" => {
                check_distinct_keys(&self.data.contacts_key, value)?;
                self.data.call_history_key = value.to_string();
            }
            "recent_calls_limit" => {
                let limit = value.parse::<usize>().map_err(|e| {
                    DialerError::validation("recent_calls_limit", format!("invalid number: {}", e))
                })?;
                return self.set_recent_calls_limit(limit);
            }
            "date_format" => return self.set_date_format(value),
            _ => return Err(DialerError::Config(format!("Unknown config key: {}", key))),
        }
        self.save()
    }
}

/// The two collections must never resolve to the same stored document,
/// either as equal keys or as keys that map to the same data file.
pub fn check_distinct_keys(contacts_key: &str, call_history_key: &str) -> DialerResult<()> {
    if contacts_key == call_history_key || file_stem_for(contacts_key) == file_stem_for(call_history_key) {
        return Err(DialerError::Config(format!(
            "contacts_key '{}' and call_history_key '{}' share one storage document",
            contacts_key, call_history_key
        )));
    }
    Ok(())
}
