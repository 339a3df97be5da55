// Runtime configuration
// Loaded from a TOML file (--config, or ./fidelis.toml when present)

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::RewardPolicy;

/// Config file picked up from the working directory when no --config is given
pub const DEFAULT_CONFIG_FILE: &str = "fidelis.toml";

pub const DEFAULT_DATABASE: &str = "fidelis.db";

/// Example:
///
/// ```toml
/// database = "store.db"
///
/// [rewards]
/// award_cutoff = "250.00"
/// base_rate = 18
/// premium_rate = 17
/// point_value = "1.00"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file
    pub database: String,
    pub rewards: RewardPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            rewards: RewardPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Invalid config file")?;
        config
            .rewards
            .validate()
            .context("Invalid [rewards] section")?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("In {}", path.display()))
    }

    /// Load an explicit config file, or fall back to `fidelis.toml` in the
    /// working directory, or to defaults when neither exists.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            debug!(path = %fallback.display(), "using config from working directory");
            return Self::load(fallback);
        }

        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.database, "fidelis.db");
        assert_eq!(config.rewards.base_rate, 18);
    }

    #[test]
    fn test_partial_rewards_section() {
        let config = Config::from_toml(
            r#"
            database = "store.db"

            [rewards]
            award_cutoff = "300.00"
            premium_rate = 15
            "#,
        )
        .unwrap();

        assert_eq!(config.database, "store.db");
        assert_eq!(config.rewards.award_cutoff, 30000);
        assert_eq!(config.rewards.premium_rate, 15);
        assert_eq!(config.rewards.base_rate, 18);
        assert_eq!(config.rewards.point_value, 100);
    }

    #[test]
    fn test_amounts_accept_integer_cents() {
        let config = Config::from_toml("[rewards]\npoint_value = 50").unwrap();
        assert_eq!(config.rewards.point_value, 50);
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        assert!(Config::from_toml("[rewards]\nbase_rate = 0").is_err());
        assert!(Config::from_toml("[rewards]\naward_cutoff = \"abc\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("fidelis.toml");
        fs::write(&path, "database = \"day.db\"\n").unwrap();

        let config = Config::resolve(Some(&path)).unwrap();
        assert_eq!(config.database, "day.db");

        assert!(Config::load(&dir.path().join("missing.toml")).is_err());
    }
}
