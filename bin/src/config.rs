//! `ronda.toml` configuration with environment overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ronda::NormalizeConfig;
use ronda::PipelineConfig;
use ronda::WeightConfig;
use ronda::store::StoreConfig;
use serde::{Deserialize, Serialize};

/// Overrides `database.path`.
pub(crate) const DATABASE_PATH_VAR: &str = "RONDA_DATABASE_PATH";
/// Overrides `database.batch_size`.
pub(crate) const BATCH_SIZE_VAR: &str = "RONDA_BATCH_SIZE";

/// Whole-application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub(crate) database: StoreConfig,
    pub(crate) pipeline: PipelineConfig,
    pub(crate) normalize: NormalizeConfig,
    pub(crate) weights: WeightConfig,
}

impl AppConfig {
    /// Read `path`; a missing file yields the defaults.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Apply environment overrides through `lookup`.
    pub(crate) fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(path) = lookup(DATABASE_PATH_VAR) {
            self.database.path = PathBuf::from(path);
        }
        if let Some(batch) = lookup(BATCH_SIZE_VAR) {
            self.database.batch_size = batch
                .parse()
                .with_context(|| format!("{BATCH_SIZE_VAR} must be a positive integer, got {batch}"))?;
        }
        Ok(())
    }

    /// Validate every section before any work starts.
    pub(crate) fn validate(&self) -> Result<()> {
        self.database.validate().context("[database]")?;
        self.normalize.validate().context("[normalize]")?;
        self.weights.validate().context("[weights]")?;
        self.pipeline.range().context("[pipeline]")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ronda::weights::{SelectionSize, Strategy};

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_parse_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ronda.toml");
        std::fs::write(
            &path,
            r#"
[database]
path = "warehouse.db"
batch_size = 100

[pipeline]
factors = ["momentum_12m_skip_1m", "earnings_yield"]
persist = false

[normalize]
winsorize_limits = [0.05, 0.05]
sector_neutral = false

[weights]
weighting = "score"
frequency = "weekly"

[weights.strategy]
kind = "long_short"
size = { fraction = 0.1 }
"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.database.path, PathBuf::from("warehouse.db"));
        assert_eq!(config.database.batch_size, 100);
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.pipeline.factors.len(), 2);
        assert!(!config.pipeline.persist);
        assert_eq!(config.normalize.winsorize_limits, (0.05, 0.05));
        assert!(config.normalize.winsorize);
        assert_eq!(
            config.weights.strategy,
            Strategy::LongShort {
                size: SelectionSize::Fraction(0.1)
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(|key| match key {
                DATABASE_PATH_VAR => Some("/tmp/other.db".to_string()),
                BATCH_SIZE_VAR => Some("250".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.database.batch_size, 250);

        assert!(
            config
                .apply_env(|key| (key == BATCH_SIZE_VAR).then(|| "lots".to_string()))
                .is_err()
        );
    }

    #[test]
    fn test_invalid_section_fails_validation() {
        let mut config = AppConfig::default();
        config.normalize.winsorize_limits = (0.6, 0.0);
        assert!(config.validate().is_err());
    }
}
