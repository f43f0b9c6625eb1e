use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::jikan::DEFAULT_BASE_URL;
use crate::types::{FilterSet, GenreId};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 15,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Genre ids applied on startup
    pub genres: Vec<GenreId>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Re-request a failed page on the next advance instead of skipping it.
    pub rollback_on_failure: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            rollback_on_failure: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
}

fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("anigrid").join("config.toml"))
}

impl Config {
    pub fn load() -> Self {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Config::default(),
        }
    }

    /// Read `path`, falling back to defaults when it is missing or invalid.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Config::default();
        };

        Self::parse(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config");
            Config::default()
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn initial_filters(&self) -> FilterSet {
        self.general.genres.iter().copied().collect()
    }
}
