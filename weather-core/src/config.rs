use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

pub const ENV_API_KEY: &str = "OPENWEATHER_API_KEY";
pub const ENV_BASE_URL: &str = "WEATHER_API_BASE_URL";
pub const ENV_TIMEOUT: &str = "WEATHER_API_TIMEOUT";
pub const ENV_MAX_RETRIES: &str = "WEATHER_API_MAX_RETRIES";
pub const ENV_CORS_ORIGINS: &str = "CORS_ORIGINS";
pub const ENV_BIND: &str = "WEATHER_BIND_ADDR";

/// Upstream provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenWeatherConfig {
    /// Left empty on purpose when unknown; checked at call time, not at startup.
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Inbound HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
        }
    }
}

/// Top-level configuration.
///
/// Example TOML:
/// ```toml
/// [openweather]
/// api_key = "..."
/// max_retries = 3
///
/// [server]
/// bind = "127.0.0.1:8000"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub openweather: OpenWeatherConfig,
    pub server: ServerConfig,
}

/// Per-attempt timeout and attempt budget for upstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl Config {
    /// Load the file at `path` (or the platform default), overlay the process
    /// environment, and validate.
    ///
    /// The file layer is optional: if no platform config directory can be
    /// determined, only defaults and the environment apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::config_file_path()
                .inspect_err(|err| warn!("Skipping config file: {err}"))
                .ok(),
        };

        Self::load_from(path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Like [`Config::load`], with an explicit (possibly absent) file and
    /// variable lookup.
    pub fn load_from<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match path {
            Some(path) => Self::load_file(path)?,
            None => Self::default(),
        };
        cfg.apply_overrides(lookup)?;
        cfg.validate()?;

        Ok(cfg)
    }

    /// Read a TOML config file, or return defaults if it doesn't exist yet.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Overlay values from a variable lookup. Empty values count as unset.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(key) = get(ENV_API_KEY) {
            self.openweather.api_key = Some(key);
        }
        if let Some(url) = get(ENV_BASE_URL) {
            self.openweather.base_url = url;
        }
        if let Some(raw) = get(ENV_TIMEOUT) {
            self.openweather.timeout_secs = parse_var(ENV_TIMEOUT, &raw)?;
        }
        if let Some(raw) = get(ENV_MAX_RETRIES) {
            self.openweather.max_retries = parse_var(ENV_MAX_RETRIES, &raw)?;
        }
        if let Some(raw) = get(ENV_CORS_ORIGINS) {
            self.server.cors_origins = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(bind) = get(ENV_BIND) {
            self.server.bind = bind;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.openweather.max_retries == 0 {
            bail!("max_retries must be at least 1");
        }
        if self.openweather.timeout_secs == 0 {
            bail!("timeout_secs must be at least 1");
        }
        if normalize_base_url(&self.openweather.base_url).is_empty() {
            bail!("base_url must not be empty");
        }

        Ok(())
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
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

    /// Path to the default config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-proxy", "weather-proxy")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// API key, if present and non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.openweather
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.openweather.api_key = Some(api_key);
    }

    /// API root with any trailing `/weather` removed.
    pub fn base_url(&self) -> String {
        normalize_base_url(&self.openweather.base_url)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            timeout: Duration::from_secs(self.openweather.timeout_secs),
            max_retries: self.openweather.max_retries,
        }
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("Invalid value for {key}: '{raw}'"))
}

/// Strips trailing slashes and a trailing `/weather` segment.
pub fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    url.strip_suffix("/weather")
        .unwrap_or(url)
        .trim_end_matches('/')
        .to_string()
}
