use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use dadscape_core::rank;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

/// Remote diary service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Sync is off unless explicitly enabled
    #[serde(default)]
    pub enabled: bool,
    /// Service URL (e.g., "https://dadscape.example.com")
    pub endpoint: Option<String>,
    /// Bearer token for the service
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// Returns true if sync is enabled and has a non-empty endpoint and key
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        self.enabled && present(&self.endpoint) && present(&self.api_key)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the local store and exported diaries
    pub data_dir: ConfigValue<PathBuf>,
    /// The player this CLI acts as
    pub rsn: ConfigValue<String>,
    /// Lowest rank allowed to edit diaries
    pub min_edit_rank: ConfigValue<i32>,
    pub enable_diaries: bool,
    /// Clan members and their ranks
    pub members: HashMap<String, i32>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub api: ApiConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    rsn: Option<String>,
    min_edit_rank: Option<i32>,
    enable_diaries: Option<bool>,
    members: HashMap<String, i32>,
    api: Option<ApiConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut rsn = ConfigValue::new(String::new(), ConfigSource::Default);
        let mut min_edit_rank = ConfigValue::new(rank::FRIEND, ConfigSource::Default);
        let mut enable_diaries = true;
        let mut members = HashMap::new();
        let mut config_file = None;
        let mut api = ApiConfig::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(name) = file_config.rsn {
                rsn = ConfigValue::new(name, ConfigSource::File);
            }
            if let Some(min) = file_config.min_edit_rank {
                min_edit_rank = ConfigValue::new(min, ConfigSource::File);
            }
            if let Some(enabled) = file_config.enable_diaries {
                enable_diaries = enabled;
            }
            members = file_config.members;
            if let Some(api_config) = file_config.api {
                api = api_config;
            }
        }

        if let Ok(dir) = std::env::var("DADSCAPE_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(name) = std::env::var("DADSCAPE_RSN") {
            rsn = ConfigValue::new(name, ConfigSource::Environment);
        }
        if let Ok(raw) = std::env::var("DADSCAPE_MIN_EDIT_RANK") {
            let min = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DADSCAPE_MIN_EDIT_RANK".into(), raw))?;
            min_edit_rank = ConfigValue::new(min, ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("DADSCAPE_API_ENDPOINT") {
            api.endpoint = Some(url);
        }
        if let Ok(key) = std::env::var("DADSCAPE_API_KEY") {
            api.api_key = Some(key);
        }

        if !(rank::GUEST..=rank::OWNER).contains(&min_edit_rank.value) {
            return Err(ConfigError::InvalidValue(
                "min_edit_rank".into(),
                min_edit_rank.value.to_string(),
            ));
        }

        Ok(Self {
            data_dir,
            rsn,
            min_edit_rank,
            enable_diaries,
            members,
            config_file,
            api,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/dadscape/
    /// - macOS: ~/Library/Application Support/dadscape/
    /// - Windows: %APPDATA%/dadscape/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dadscape")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/dadscape/
    /// - macOS: ~/Library/Application Support/dadscape/
    /// - Windows: %APPDATA%/dadscape/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dadscape")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }

    /// Where `diary export` writes by default
    pub fn export_dir(&self) -> PathBuf {
        self.data_dir.value.join("diaries")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(key, value) => {
                write!(f, "Invalid value for {}: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert!(config.data_dir.value.ends_with("dadscape"));
        assert_eq!(config.data_dir.source, ConfigSource::Default);
        assert_eq!(config.rsn.value, "");
        assert_eq!(config.min_edit_rank.value, 0);
        assert_eq!(config.min_edit_rank.source, ConfigSource::Default);
        assert!(config.enable_diaries);
        assert!(!config.api.is_configured());
        assert_eq!(config.api.timeout_secs, 10);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "data_dir: /custom/dadscape").unwrap();
        writeln!(file, "rsn: Bob").unwrap();
        writeln!(file, "min_edit_rank: 50").unwrap();
        writeln!(file, "members:").unwrap();
        writeln!(file, "  Bob: 127").unwrap();
        writeln!(file, "  Alice: 20").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(config.data_dir.value, PathBuf::from("/custom/dadscape"));
        assert_eq!(config.data_dir.source, ConfigSource::File);
        assert_eq!(config.rsn.value, "Bob");
        assert_eq!(config.min_edit_rank.value, 50);
        assert_eq!(config.members.get("Alice"), Some(&20));
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_relative_data_dir_resolved_against_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "data_dir: data\n").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.data_dir.value, temp_dir.path().join("data"));
    }

    #[test]
    fn test_api_section() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "api:").unwrap();
        writeln!(file, "  enabled: true").unwrap();
        writeln!(file, "  endpoint: https://dadscape.example.com").unwrap();
        writeln!(file, "  api_key: secret").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert!(config.api.is_configured());
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_api_needs_enabled_and_values() {
        let mut api = ApiConfig {
            enabled: true,
            endpoint: Some("https://dadscape.example.com".to_string()),
            api_key: Some(String::new()),
            timeout_secs: 10,
        };
        assert!(!api.is_configured());

        api.api_key = Some("secret".to_string());
        assert!(api.is_configured());

        api.enabled = false;
        assert!(!api.is_configured());
    }

    #[test]
    fn test_rank_out_of_range_rejected() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "min_edit_rank: 500\n").unwrap();

        let err = Config::load(Some(config_path)).unwrap_err();
        assert!(err.to_string().contains("min_edit_rank"));
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "rsn: fromfile\n").unwrap();

        std::env::set_var("DADSCAPE_RSN", "fromenv");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.rsn.value, "fromenv");
        assert_eq!(config.rsn.source, ConfigSource::Environment);

        std::env::remove_var("DADSCAPE_RSN");
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
