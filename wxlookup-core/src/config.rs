use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Overrides `[openweather].api_key` when set to a non-blank value.
pub const OPENWEATHER_KEY_ENV: &str = "WXLOOKUP_OPENWEATHER_API_KEY";

pub const DEFAULT_SEARCH_COLLECTION: &str = "searches";

/// Which backend answers lookups. Decided once at startup, never per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// Keyed provider, chosen whenever a key is configured.
    OpenWeather { api_key: String },
    /// Keyless provider.
    OpenMeteo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenWeatherSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Hosted search history (Cloud Firestore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLogSettings {
    pub project_id: String,

    /// Web API key, appended as `?key=`. Optional for open security rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_collection() -> String {
    DEFAULT_SEARCH_COLLECTION.to_string()
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// request_timeout_secs = 10
///
/// [openweather]
/// api_key = "..."
///
/// [search_log]
/// project_id = "weather-forecast"
/// collection = "searches"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub openweather: OpenWeatherSettings,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_log: Option<SearchLogSettings>,
}

impl Config {
    /// The backend selected by this configuration.
    pub fn provider_config(&self) -> ProviderConfig {
        match self.openweather_api_key() {
            Some(key) => ProviderConfig::OpenWeather { api_key: key.to_string() },
            None => ProviderConfig::OpenMeteo,
        }
    }

    /// OpenWeather key, if one is set and not blank.
    pub fn openweather_api_key(&self) -> Option<&str> {
        self.openweather
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Set or clear the OpenWeather key. Blank keys are stored as absent.
    pub fn set_openweather_api_key(&mut self, api_key: Option<String>) {
        self.openweather.api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
    }

    /// Load config from the default path, or an empty default if it doesn't
    /// exist yet, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wxlookup", "wxlookup")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(OPENWEATHER_KEY_ENV) {
            if !key.trim().is_empty() {
                tracing::debug!("using OpenWeather key from {OPENWEATHER_KEY_ENV}");
                self.set_openweather_api_key(Some(key));
            }
        }
    }
}
