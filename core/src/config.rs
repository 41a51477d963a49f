/// Configuration for the sync engine
use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_API_HOST: &str = "https://api.bitbucket.org";
const SETTINGS_DIR_NAME: &str = "strings-sync";
const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to access settings file: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Mobile platform whose strings file is being edited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Ios,
    Android,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ios" => Some(Platform::Ios),
            "android" => Some(Platform::Android),
            _ => None,
        }
    }

    /// Location of the strings file inside the repository. Doubles as the push form key.
    pub fn file_location(&self) -> &'static str {
        match self {
            Platform::Ios => "/ios/strings/v1/ios-strings-base.json",
            Platform::Android => "/android/strings/strings.json",
        }
    }

    pub fn platform_path(&self, hash: &str) -> String {
        format!("src/{hash}{}", self.file_location())
    }
}

/// Repository target. `Dev` points at the scratch repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Prod,
}

impl Environment {
    pub fn repository_path(&self) -> &'static str {
        match self {
            Environment::Dev => "/2.0/repositories/pillboxer/henry-test-repo",
            Environment::Prod => "/2.0/repositories/touchnote-team/mobile-cms",
        }
    }

    pub fn branch_name(&self) -> &'static str {
        match self {
            Environment::Dev => "develop",
            Environment::Prod => "master",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    #[serde(default, deserialize_with = "lenient_platform")]
    pub platform: Platform,
    #[serde(default)]
    pub environment: Environment,
    /// Overrides [`DEFAULT_API_HOST`], e.g. for a local mirror.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

/// Unknown or missing platform values fall back to iOS instead of failing the whole file.
fn lenient_platform<'de, D>(deserializer: D) -> Result<Platform, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Platform::parse).unwrap_or_default())
}

impl SyncSettings {
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Repository root, e.g. `https://api.bitbucket.org/2.0/repositories/<owner>/<repo>`.
    pub fn base_url(&self) -> String {
        let host = self
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_HOST)
            .trim_end_matches('/');
        format!("{host}{}", self.environment.repository_path())
    }

    pub fn branch_name(&self) -> &'static str {
        self.environment.branch_name()
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads settings from disk; a missing file yields the defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_json(&content),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), SettingsError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// `<config dir>/strings-sync/settings.json`, when the OS exposes a config dir.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
}

/// Owns the active settings and writes changes through to the backing file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    settings: SyncSettings,
    path: Option<PathBuf>,
}

impl SettingsStore {
    /// Settings that live only for this process.
    pub fn in_memory(settings: SyncSettings) -> Self {
        Self {
            settings,
            path: None,
        }
    }

    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, SettingsError> {
        let path = path.into();
        let settings = SyncSettings::load_from(&path)?;
        Ok(Self {
            settings,
            path: Some(path),
        })
    }

    pub fn open_default() -> Result<Self, SettingsError> {
        match default_settings_path() {
            Some(path) => Self::open(path),
            None => Ok(Self::in_memory(SyncSettings::default())),
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn platform(&self) -> Platform {
        self.settings.platform
    }

    pub fn set_platform(&mut self, platform: Platform) {
        self.settings.platform = platform;
        self.persist();
    }

    pub fn environment(&self) -> Environment {
        self.settings.environment
    }

    pub fn set_environment(&mut self, environment: Environment) {
        self.settings.environment = environment;
        self.persist();
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        match self.settings.save_to(path) {
            Ok(()) => info!("saved sync settings to {}", path.display()),
            Err(err) => warn!("failed to save sync settings to {}: {}", path.display(), err),
        }
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::in_memory(SyncSettings::default())
    }
}
