// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/ghostwatch-rs

//! Configuration module

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,

    /// Data directory
    pub data_dir: PathBuf,

    /// Log level
    pub log_level: String,

    /// Generator configuration
    pub generator: GeneratorConfig,

    /// Analysis configuration
    pub analysis: AnalysisConfig,

    /// Alarm configuration
    pub alarm: AlarmConfig,

    /// History configuration
    pub history: HistoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "GhostWatch".to_string(),
            data_dir: PathBuf::from("./data"),
            log_level: "info".to_string(),
            generator: GeneratorConfig::default(),
            analysis: AnalysisConfig::default(),
            alarm: AlarmConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("ghostwatch"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Backing file for the history store.
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.history.log_file)
    }
}

/// Signal generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Generation cadence in milliseconds
    pub update_interval_ms: u64,

    /// Optional RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 500,
            seed: None,
        }
    }
}

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Optional RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { seed: None }
    }
}

/// Alarm configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    /// Probability above which analysis results reach the alarm system
    pub trigger_threshold: f64,

    /// Emit audible patterns on escalation
    pub sound_enabled: bool,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            trigger_threshold: 70.0,
            sound_enabled: true,
        }
    }
}

/// History configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Log file name inside the data directory
    pub log_file: String,

    /// Retention period in days for purge operations
    pub retention_days: i64,

    /// Autosave interval in seconds
    pub autosave_interval_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            log_file: "ghostwatch_logs.json".to_string(),
            retention_days: 7,
            autosave_interval_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.generator.update_interval_ms, 500);
        assert_eq!(parsed.alarm.trigger_threshold, 70.0);
        assert_eq!(parsed.history.retention_days, 7);
    }
}
