// Configuration Storage Service
// JSON config file holding detector endpoint overrides, the stored API key,
// and the default analysis policy. Writes keep timestamped backups.

use crate::models::NormalizerPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const BACKUPS_TO_KEEP: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub detector: DetectorSettings,
    #[serde(default)]
    pub analysis: NormalizerPolicy,
    /// Stored provider credential; environment variables take precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Endpoint overrides. Unset fields fall through to the built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DetectorSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_report_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_report_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_status_url: Option<String>,
}

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self {
            config_dir,
            config_file,
        }
    }

    /// Store rooted at the platform config directory, when one exists.
    pub fn from_default_dir() -> Option<Self> {
        default_config_dir().map(Self::new)
    }

    /// Load configuration; a missing file reads as defaults.
    pub fn load(&self) -> Result<AppConfig, String> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)
            .map_err(|e| format!("Failed to read config: {}", e))?;

        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))
    }

    pub fn save(&self, config: &AppConfig) -> Result<(), String> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| format!("Failed to create config dir: {}", e))?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&self.config_file, content).map_err(|e| format!("Failed to write config: {}", e))
    }

    pub fn get_api_key(&self) -> Result<Option<String>, String> {
        Ok(self.load()?.api_key)
    }

    pub fn set_api_key(&self, key: &str) -> Result<(), String> {
        let mut config = self.load()?;
        config.api_key = Some(key.to_string());
        self.save(&config)
    }

    pub fn delete_api_key(&self) -> Result<(), String> {
        let mut config = self.load()?;
        config.api_key = None;
        self.save(&config)
    }

    /// Default analysis policy for callers that do not pass one explicitly.
    pub fn analysis_policy(&self) -> NormalizerPolicy {
        self.load().map(|c| c.analysis).unwrap_or_default()
    }

    fn create_backup(&self) -> Result<(), String> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)
            .map_err(|e| format!("Failed to create backup dir: {}", e))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file)
            .map_err(|e| format!("Failed to create backup: {}", e))?;

        self.prune_backups(&backup_dir)
    }

    fn prune_backups(&self, backup_dir: &Path) -> Result<(), String> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)
            .map_err(|e| format!("Failed to read backup dir: {}", e))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= BACKUPS_TO_KEEP {
            return Ok(());
        }

        // Timestamped names sort oldest first.
        entries.sort_by_key(|e| e.file_name());
        for entry in entries.iter().take(entries.len() - BACKUPS_TO_KEEP) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }
}

pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("veriscan"))
}

/// Resolve the provider credential: environment first, then the config file.
pub fn get_api_key() -> Option<String> {
    for key in ["VERISCAN_API_KEY", "AIORNOT_API_KEY"] {
        if let Ok(val) = env::var(key) {
            let v = val.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }

    ConfigStore::from_default_dir()
        .and_then(|store| store.get_api_key().ok())
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatusPolicy;

    fn temp_store() -> ConfigStore {
        let dir = env::temp_dir().join(format!("veriscan-test-{}", uuid::Uuid::new_v4()));
        ConfigStore::new(dir)
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let store = temp_store();
        let config = store.load().unwrap();
        assert!(config.api_key.is_none());
        assert!(config.analysis.infer_complement);
        assert!(config.detector.image_report_url.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let store = temp_store();
        let config = AppConfig {
            version: "1".to_string(),
            detector: DetectorSettings {
                image_report_url: Some("http://localhost:9000/image".to_string()),
                ..DetectorSettings::default()
            },
            analysis: NormalizerPolicy {
                infer_complement: false,
                status_policy: StatusPolicy::Banded {
                    fake_min: 70.0,
                    authentic_max: 30.0,
                },
            },
            api_key: None,
        };
        store.save(&config).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(
            loaded.detector.image_report_url.as_deref(),
            Some("http://localhost:9000/image")
        );
        assert!(!loaded.analysis.infer_complement);
        let _ = fs::remove_dir_all(&store.config_dir);
    }

    #[test]
    fn test_api_key_round_trip() {
        let store = temp_store();
        assert!(store.get_api_key().unwrap().is_none());
        store.set_api_key("secret").unwrap();
        assert_eq!(store.get_api_key().unwrap().as_deref(), Some("secret"));
        store.delete_api_key().unwrap();
        assert!(store.get_api_key().unwrap().is_none());
        let _ = fs::remove_dir_all(&store.config_dir);
    }
}
