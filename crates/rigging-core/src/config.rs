use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration loaded from `~/.rigging/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub resolution: ResolutionConfig,

    #[serde(default)]
    pub repository: RepositoryConfig,
}

/// How competing versions of one module are arbitrated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    /// Highest requested version wins.
    #[default]
    Latest,
    /// Any module requested at more than one version fails resolution.
    Fail,
}

/// Resolution settings from `[resolution]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    #[serde(default, rename = "conflict-strategy")]
    pub conflict_strategy: ConflictStrategy,
    #[serde(default = "default_timeout_secs", rename = "timeout-secs")]
    pub timeout_secs: u64,
    #[serde(
        default = "default_max_concurrent_fetches",
        rename = "max-concurrent-fetches"
    )]
    pub max_concurrent_fetches: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            conflict_strategy: ConflictStrategy::default(),
            timeout_secs: default_timeout_secs(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_max_concurrent_fetches() -> usize {
    8
}

/// Module repository settings from `[repository]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default = "default_repository_dir")]
    pub dir: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            dir: default_repository_dir(),
        }
    }
}

fn default_repository_dir() -> String {
    "~/.rigging/repository".to_string()
}

impl GlobalConfig {
    /// Load the global configuration from `~/.rigging/config.toml`, or return
    /// defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load from an explicit path, returning defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            tracing::debug!("no global config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            rigging_util::errors::RiggingError::Config {
                message: format!("Failed to read {}: {e}", path.display()),
            }
        })?;
        toml::from_str(&content).map_err(|e| {
            rigging_util::errors::RiggingError::Config {
                message: format!("Failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// The repository directory with `~` expanded.
    pub fn repository_dir(&self) -> PathBuf {
        rigging_util::fs::expand_home(&self.repository.dir)
    }
}

/// Returns the path to the Rigging data directory (`~/.rigging/`).
pub fn dirs_path() -> PathBuf {
    rigging_util::fs::expand_home("~/.rigging")
}
