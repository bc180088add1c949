//! Configuration system for runway.
//!
//! Supports layered configuration from multiple sources (highest priority
//! first):
//! 1. Local override: `.git/runway/config.toml` (per-repo, per-user)
//! 2. User global: `~/.config/runway/config.toml` (personal defaults)
//! 3. Repo shared: `.runway.toml` at the repository root (committed)
//!
//! Persisted values sit between explicit flags and tracking-branch inference
//! when the land engine resolves its targets.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::engine::Strategy;
use crate::repo::Repository;

/// Land operation configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LandConfig {
    /// Refs to land onto when no `--onto` flag is given
    #[serde(default)]
    pub onto: Vec<String>,

    /// Remote to land onto when no `--onto-remote` flag is given
    #[serde(default, rename = "onto-remote")]
    pub onto_remote: Option<String>,

    /// Default integration strategy
    #[serde(default)]
    pub strategy: Option<Strategy>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub land: LandConfig,
}

impl Config {
    /// Load configuration for a repository, merging layers field by field.
    pub fn load(repo: &Repository) -> Result<Self> {
        let layers = [
            repo.git_dir().join("runway").join("config.toml"),
            user_config_path(),
            repo.workdir().join(".runway.toml"),
        ];

        let mut merged = Config::default();
        for path in layers {
            let Some(layer) = Self::load_file(&path)? else {
                continue;
            };
            if merged.land.onto.is_empty() {
                merged.land.onto = layer.land.onto;
            }
            if merged.land.onto_remote.is_none() {
                merged.land.onto_remote = layer.land.onto_remote;
            }
            if merged.land.strategy.is_none() {
                merged.land.strategy = layer.land.strategy;
            }
        }
        Ok(merged)
    }

    fn load_file(path: &std::path::Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("Invalid config at {}", path.display()))?;
        Ok(Some(config))
    }
}

/// Path of the user-global config file.
fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("runway")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_land_table() {
        let config: Config = toml::from_str(
            r#"
            [land]
            onto = ["master", "stable"]
            onto-remote = "upstream"
            strategy = "merge"
            "#,
        )
        .unwrap();
        assert_eq!(config.land.onto, vec!["master", "stable"]);
        assert_eq!(config.land.onto_remote.as_deref(), Some("upstream"));
        assert_eq!(config.land.strategy, Some(Strategy::Merge));
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.land.onto.is_empty());
        assert!(config.land.onto_remote.is_none());
        assert!(config.land.strategy.is_none());
    }
}
