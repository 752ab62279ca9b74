//! Configuration file support for apimap.
//!
//! apimap supports two configuration file locations:
//! - Global: `~/.apimap/config.toml` - User-wide defaults
//! - Project: `.apimap/config.toml` under the workspace root
//!
//! Project config takes precedence over global config.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::resolver::InstallPathStrategy;

/// Default marker for opaque higher-order calls.
pub const DEFAULT_API_OF_API_MARKER: &str = "\u{2026}";

/// Default suffix identifying default-export calls.
pub const DEFAULT_EXPORT_SUFFIX: &str = ".default()";

/// Default environment variable holding the ranking service token.
pub const DEFAULT_API_KEY_ENV: &str = "APIMAP_API_KEY";

/// apimap configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Exclusion policy
    pub policy: PolicyConfig,

    /// Resolver settings
    pub resolver: ResolverConfig,

    /// Ranking service settings
    pub ranker: RankerConfig,
}

/// Call expressions that are never resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Expressions known not to exist in any catalog
    pub nonexistent: BTreeSet<String>,

    /// Expressions known to be unresolvable (anonymous or aliased exports)
    pub hard_to_resolve: BTreeSet<String>,

    /// Substring marking a call on the result of another call
    pub api_of_api_marker: String,

    /// Suffix marking a default-export call
    pub default_export_suffix: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            nonexistent: BTreeSet::new(),
            hard_to_resolve: BTreeSet::new(),
            api_of_api_marker: DEFAULT_API_OF_API_MARKER.to_string(),
            default_export_suffix: DEFAULT_EXPORT_SUFFIX.to_string(),
        }
    }
}

/// Resolver settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Install path tie-break (first, all, nearest)
    pub install_path: Option<InstallPathStrategy>,
}

/// Ranking service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    /// Base URL of an OpenAI-compatible API
    pub base_url: Option<String>,

    /// Model identifier
    pub model: Option<String>,

    /// Environment variable holding the bearer token
    pub api_key_env: String,

    /// Attempts per request before giving up
    pub max_attempts: u32,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Backoff before the second attempt; doubles after each failure
    pub backoff_base_ms: u64,

    /// Text file prepended to every prompt
    pub knowledge_base: Option<PathBuf>,
}

impl Default for RankerConfig {
    fn default() -> Self {
        RankerConfig {
            base_url: None,
            model: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            max_attempts: 3,
            timeout_secs: 60,
            backoff_base_ms: 1000,
            knowledge_base: None,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        let defaults = Config::default();

        // Policy lists are replaced, not merged
        if !other.policy.nonexistent.is_empty() {
            self.policy.nonexistent = other.policy.nonexistent;
        }
        if !other.policy.hard_to_resolve.is_empty() {
            self.policy.hard_to_resolve = other.policy.hard_to_resolve;
        }
        if other.policy.api_of_api_marker != defaults.policy.api_of_api_marker {
            self.policy.api_of_api_marker = other.policy.api_of_api_marker;
        }
        if other.policy.default_export_suffix != defaults.policy.default_export_suffix {
            self.policy.default_export_suffix = other.policy.default_export_suffix;
        }

        if other.resolver.install_path.is_some() {
            self.resolver.install_path = other.resolver.install_path;
        }

        // Ranker settings
        if other.ranker.base_url.is_some() {
            self.ranker.base_url = other.ranker.base_url;
        }
        if other.ranker.model.is_some() {
            self.ranker.model = other.ranker.model;
        }
        if other.ranker.api_key_env != defaults.ranker.api_key_env {
            self.ranker.api_key_env = other.ranker.api_key_env;
        }
        if other.ranker.max_attempts != defaults.ranker.max_attempts {
            self.ranker.max_attempts = other.ranker.max_attempts;
        }
        if other.ranker.timeout_secs != defaults.ranker.timeout_secs {
            self.ranker.timeout_secs = other.ranker.timeout_secs;
        }
        if other.ranker.backoff_base_ms != defaults.ranker.backoff_base_ms {
            self.ranker.backoff_base_ms = other.ranker.backoff_base_ms;
        }
        if other.ranker.knowledge_base.is_some() {
            self.ranker.knowledge_base = other.ranker.knowledge_base;
        }
    }

    /// The configured install path strategy, or the default.
    pub fn install_path_strategy(&self) -> InstallPathStrategy {
        self.resolver.install_path.unwrap_or_default()
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.apimap/config.toml)
/// 2. Global config (~/.apimap/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    // Project config overrides global
    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global apimap config directory (~/.apimap).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".apimap"))
}

/// Get the global config path (~/.apimap/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.apimap/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".apimap").join("config.toml")
}
