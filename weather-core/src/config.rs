use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{i18n, model::ResourceKind};

pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org/data/2.5";

/// Upstream provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub api_key: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout_secs: 5,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// TTL and version tag for one kind of cached resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    pub ttl_secs: u64,
    /// Bumping this invalidates every entry written under the previous value.
    pub version: u32,
}

impl CachePolicy {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub weather: CachePolicy,
    pub cities: CachePolicy,
    /// Upper bound on entries held by the in-process store.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            weather: CachePolicy {
                ttl_secs: 600,
                version: 1,
            },
            cities: CachePolicy {
                ttl_secs: 86_400,
                version: 1,
            },
            max_entries: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    pub supported: Vec<String>,
    pub default: String,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            supported: i18n::DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect(),
            default: "en".to_string(),
        }
    }
}

impl LanguageConfig {
    pub fn is_supported(&self, language: &str) -> bool {
        self.supported.iter().any(|l| l == language)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Top-level configuration, built once at startup and handed to the service.
///
/// Example TOML:
/// ```toml
/// [upstream]
/// api_key = "..."
///
/// [cache.weather]
/// ttl_secs = 600
/// version = 2
///
/// [cities]
/// 1 = 2950159
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub languages: LanguageConfig,
    pub server: ServerConfig,

    /// Internal city id -> provider city id. Empty means the ids coincide.
    pub cities: BTreeMap<String, i64>,
}

impl Config {
    /// Load config from the default location, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load config from an explicit file. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the default location.
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
        let dirs = ProjectDirs::from("dev", "weather-finder", "weather-api")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_overrides<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = var("OPENWEATHER_API_KEY") {
            self.upstream.api_key = key;
        }
        if let Some(url) = var("OPENWEATHER_BASE_URL") {
            self.upstream.base_url = url;
        }
        if let Some(secs) = var("OPENWEATHER_TIMEOUT_SECS") {
            self.upstream.timeout_secs = secs
                .parse()
                .with_context(|| format!("OPENWEATHER_TIMEOUT_SECS is not a number: {secs}"))?;
        }
        if let Some(lang) = var("WEATHER_DEFAULT_LANGUAGE") {
            self.languages.default = lang;
        }
        if let Some(host) = var("WEATHER_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("WEATHER_SERVER_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("WEATHER_SERVER_PORT is not a valid port: {port}"))?;
        }

        Ok(())
    }

    /// Check the settings the request pipeline depends on.
    pub fn validate(&self) -> Result<()> {
        if self.upstream.api_key.trim().is_empty() {
            bail!(
                "No API key configured for the upstream provider.\n\
                 Hint: run `weather-api configure` or set OPENWEATHER_API_KEY."
            );
        }
        if self.upstream.timeout_secs == 0 {
            bail!("upstream.timeout_secs must be greater than zero");
        }
        if self.cache.max_entries == 0 {
            bail!("cache.max_entries must be greater than zero");
        }
        if self.languages.supported.is_empty() {
            bail!("languages.supported must list at least one language");
        }
        if !self.languages.is_supported(&self.languages.default) {
            bail!(
                "Default language '{}' is not in the supported list: {}",
                self.languages.default,
                self.languages.supported.join(", ")
            );
        }

        Ok(())
    }

    pub fn cache_policy(&self, kind: ResourceKind) -> CachePolicy {
        match kind {
            ResourceKind::Weather => self.cache.weather,
            ResourceKind::Cities => self.cache.cities,
        }
    }

    /// Parsed `[cities]` table. Keys that aren't integers are skipped with a warning.
    pub fn city_table(&self) -> BTreeMap<i64, i64> {
        self.cities
            .iter()
            .filter_map(|(internal, external)| match internal.parse::<i64>() {
                Ok(id) => Some((id, *external)),
                Err(_) => {
                    tracing::warn!(key = %internal, "ignoring non-numeric city id in config");
                    None
                }
            })
            .collect()
    }
}
