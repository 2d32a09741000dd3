// Host configuration, read from TOML:
//
//   primary_language = "en_US"
//   provider_dirs = ["/opt/patronus/providers"]
//   disabled = ["Language Tool"]
//   parallel = true

use std::path::{Path, PathBuf};

use patronus_core::Properties;
use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "PATRONUS_CONFIG";

/// Environment variable naming an extra provider directory.
pub const PROVIDER_DIR_ENV: &str = "PATRONUS_PROVIDER_DIR";

const CONFIG_FILE: &str = "config.toml";

/// Host configuration. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directories searched for provider libraries, before the defaults.
    pub provider_dirs: Vec<PathBuf>,

    /// Language used when the caller does not pass one.
    pub primary_language: String,

    /// Provider names that are loaded but never registered.
    pub disabled: Vec<String>,

    /// Dispatch to providers on separate threads.
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider_dirs: Vec::new(),
            primary_language: Properties::default().primary_language,
            disabled: Vec::new(),
            parallel: false,
        }
    }
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Read configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Find and read the configuration.
    ///
    /// An explicit path must exist. Otherwise the first existing file among
    /// [`config_candidates`] is used, and defaults apply when there is none.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match config_candidates(env_var).into_iter().find(|p| p.is_file()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using config file");
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Directories to scan for providers, in priority order.
    pub fn provider_search_paths(&self) -> Vec<PathBuf> {
        provider_search_paths(&self.provider_dirs, env_var)
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|d| d == name)
    }

    /// Properties for a check that uses the configured language.
    pub fn properties(&self) -> Properties {
        Properties::new(&self.primary_language)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Config file locations, in priority order.
///
/// 1. `PATRONUS_CONFIG`
/// 2. `$XDG_CONFIG_HOME/patronus/config.toml`
/// 3. `~/.config/patronus/config.toml`
pub fn config_candidates(env: impl Fn(&str) -> Option<String>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(path) = env(CONFIG_ENV) {
        paths.push(PathBuf::from(path));
    }
    if let Some(xdg) = env("XDG_CONFIG_HOME") {
        paths.push(PathBuf::from(xdg).join("patronus").join(CONFIG_FILE));
    }
    if let Some(home) = env("HOME") {
        paths.push(
            PathBuf::from(home)
                .join(".config")
                .join("patronus")
                .join(CONFIG_FILE),
        );
    }
    paths
}

/// Provider directories, in priority order.
///
/// 1. `configured` entries
/// 2. `PATRONUS_PROVIDER_DIR`
/// 3. `~/.local/lib/patronus`
/// 4. `/usr/local/lib/patronus`, `/usr/lib/patronus`
pub fn provider_search_paths(
    configured: &[PathBuf],
    env: impl Fn(&str) -> Option<String>,
) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = configured.to_vec();
    if let Some(dir) = env(PROVIDER_DIR_ENV) {
        paths.push(PathBuf::from(dir));
    }
    if let Some(home) = env("HOME") {
        paths.push(PathBuf::from(home).join(".local").join("lib").join("patronus"));
    }
    paths.push(PathBuf::from("/usr/local/lib/patronus"));
    paths.push(PathBuf::from("/usr/lib/patronus"));

    let mut seen = hashbrown::HashSet::new();
    paths.retain(|p| seen.insert(p.clone()));
    paths
}
