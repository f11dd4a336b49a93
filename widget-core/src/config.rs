use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::host::WidgetType;
use crate::prefs::DEFAULT_NAMESPACE;

/// Icon fetching options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    /// Upper bound on one icon request, connect through body.
    pub timeout_secs: u64,

    /// Scheme used for scheme-relative URLs such as `//cdn.example/icon.png`.
    pub default_scheme: String,

    /// Largest icon body accepted, in bytes.
    pub max_bytes: u64,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            default_scheme: "https".to_string(),
            max_bytes: 512 * 1024,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// prefs_path = "/home/me/.local/share/proj_weather/shared_preferences.json"
/// namespace = "flutter."
///
/// [icon]
/// timeout_secs = 5
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Preference file written by the host app. Falls back to the platform data dir.
    pub prefs_path: Option<PathBuf>,

    /// Prefix the host app puts in front of every preference key.
    pub namespace: String,

    pub widget_type: String,

    /// View opened when the widget is tapped.
    pub entry_target: String,

    pub icon: IconConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefs_path: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            widget_type: "WeatherWidget".to_string(),
            entry_target: "MainActivity".to_string(),
            icon: IconConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return the defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

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
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// The configured preference file, or `shared_preferences.json` in the data dir.
    pub fn resolved_prefs_path(&self) -> Result<PathBuf> {
        match &self.prefs_path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("shared_preferences.json")),
        }
    }

    pub fn widget_type(&self) -> WidgetType {
        WidgetType::new(self.widget_type.as_str())
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "example", "proj_weather")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
