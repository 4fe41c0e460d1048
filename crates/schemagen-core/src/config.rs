use crate::error::{Result, SchemaError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ArtisanConfig
// ---------------------------------------------------------------------------

/// Controls the optional `php artisan route:list --json` call used by the
/// Laravel API schema. Disabled by default; static route scanning always runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtisanConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_php")]
    pub php: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_php() -> String {
    "php".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

impl Default for ArtisanConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            php: default_php(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,
    #[serde(default = "default_max_age_minutes")]
    pub max_age_minutes: i64,
    #[serde(default)]
    pub artisan: ArtisanConfig,
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from(paths::DEFAULT_SCHEMA_DIR)
}

fn default_max_age_minutes() -> i64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_dir: default_schema_dir(),
            max_age_minutes: default_max_age_minutes(),
            artisan: ArtisanConfig::default(),
        }
    }
}

impl Config {
    /// Load `<project>/.schemagen.yaml`. Returns defaults if the file is absent.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = paths::config_path(project_root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_age_minutes < 0 {
            return Err(SchemaError::Config(format!(
                "max_age_minutes must be non-negative, got {}",
                self.max_age_minutes
            )));
        }
        if self.artisan.timeout_secs == 0 {
            return Err(SchemaError::Config(
                "artisan.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Absolute schema root for `project_root`. Absolute `schema_dir` values
    /// are used as-is.
    pub fn schema_root(&self, project_root: &Path) -> PathBuf {
        if self.schema_dir.is_absolute() {
            self.schema_dir.clone()
        } else {
            project_root.join(&self.schema_dir)
        }
    }
}
