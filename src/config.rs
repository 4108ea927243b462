use dailyfit_core::GoalRanges;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_SERVER_URL: &str = "http://localhost:3000";
const DEFAULT_USER_ID: &str = "default";

const APP_DIR: &str = "dailyfit";

const ENV_DATA_DIR: &str = "DAILYFIT_DATA_DIR";
const ENV_USER_ID: &str = "DAILYFIT_USER_ID";
const ENV_SERVER_URL: &str = "DAILYFIT_SERVER_URL";
const ENV_API_TOKEN: &str = "DAILYFIT_API_TOKEN";

/// Which layer a setting was last taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl ConfigSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigSource::Default => "default",
            ConfigSource::File => "file",
            ConfigSource::Environment => "environment",
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    fn default(value: T) -> Self {
        Self {
            value,
            source: ConfigSource::Default,
        }
    }

    /// Lets a later layer replace the value, if that layer sets one.
    fn overlay(&mut self, value: Option<T>, source: ConfigSource) {
        if let Some(value) = value {
            self.value = value;
            self.source = source;
        }
    }
}

/// Reads an override from the environment. Empty values count as unset.
fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackendConfig {
    /// Server URL (e.g., "http://localhost:3000")
    pub server_url: Option<String>,
    /// Bearer token sent with every request
    #[serde(skip_serializing)]
    pub api_token: Option<String>,
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the persisted ledger
    pub data_dir: ConfigValue<PathBuf>,
    /// Backend user id the day is submitted for
    pub user_id: ConfigValue<String>,
    /// Backend server URL
    pub server_url: ConfigValue<String>,
    #[serde(skip)]
    pub api_token: Option<String>,
    /// Allowed goal ranges
    pub goal_ranges: GoalRanges,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    user_id: Option<String>,
    backend: Option<BackendConfig>,
    goal_ranges: Option<GoalRanges>,
}

impl Config {
    /// Layers defaults, then the YAML file, then `DAILYFIT_*` variables.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::default(Self::default_data_dir());
        let mut user_id = ConfigValue::default(DEFAULT_USER_ID.to_string());
        let mut server_url = ConfigValue::default(DEFAULT_SERVER_URL.to_string());
        let mut api_token = None;
        let mut goal_ranges = GoalRanges::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        let config_file = if path.exists() {
            let file = ConfigFile::read(&path)?;
            let base = path.parent().unwrap_or_else(|| Path::new("."));

            // Relative data dirs are taken relative to the config file.
            data_dir.overlay(file.data_dir.map(|d| base.join(d)), ConfigSource::File);
            user_id.overlay(file.user_id, ConfigSource::File);
            if let Some(backend) = file.backend {
                server_url.overlay(backend.server_url, ConfigSource::File);
                api_token = backend.api_token;
            }
            if let Some(ranges) = file.goal_ranges {
                goal_ranges = ranges;
            }
            Some(path)
        } else {
            None
        };

        let env = ConfigSource::Environment;
        data_dir.overlay(env_override(ENV_DATA_DIR).map(PathBuf::from), env);
        user_id.overlay(env_override(ENV_USER_ID), env);
        server_url.overlay(env_override(ENV_SERVER_URL), env);
        api_token = env_override(ENV_API_TOKEN).or(api_token);

        Ok(Self {
            data_dir,
            user_id,
            server_url,
            api_token,
            goal_ranges,
            config_file,
        })
    }

    /// `config.yaml` under the platform config dir, e.g. `~/.config/dailyfit/`.
    pub fn default_config_path() -> PathBuf {
        app_dir(dirs::config_dir()).join("config.yaml")
    }

    /// The platform data dir, e.g. `~/.local/share/dailyfit/` on Linux.
    fn default_data_dir() -> PathBuf {
        app_dir(dirs::data_dir())
    }
}

impl ConfigFile {
    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
}

#[derive(Debug)]
pub enum ConfigError {
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    Invalid {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Unreadable { path, source } => {
                write!(f, "Cannot read {}: {}", path.display(), source)
            }
            ConfigError::Invalid { path, source } => {
                write!(f, "Invalid config in {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Unreadable { source, .. } => Some(source),
            ConfigError::Invalid { source, .. } => Some(source),
        }
    }
}
