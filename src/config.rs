//! TOML configuration: Materials Project access and screening limits

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub materials_project: MaterialsProjectConfig,
    pub screening: ScreeningConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MaterialsProjectConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for MaterialsProjectConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.materialsproject.org".to_string(),
            timeout_secs: 10,
        }
    }
}

impl MaterialsProjectConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ScreeningConfig {
    /// Candidates screened per query; larger universes are sampled
    pub max_screened: usize,
    /// Candidates kept in the ranked result
    pub top_n: usize,
    /// Concurrent materials-database calls
    pub concurrency: usize,
    /// Records requested per candidate from each source
    pub per_candidate_limit: usize,
    /// Energy above hull (eV/atom) below which a phase counts as stable
    pub stable_hull_threshold: f64,
    pub deadline_secs: u64,
    /// Fixed sampling seed, random when absent
    pub seed: Option<u64>,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            max_screened: 30,
            top_n: 15,
            concurrency: 5,
            per_candidate_limit: 5,
            stable_hull_threshold: 0.05,
            deadline_secs: 60,
            seed: None,
        }
    }
}

impl ScreeningConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl Config {
    pub fn from_toml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.screening.concurrency == 0 {
            return Err(ConfigError::Invalid("screening.concurrency must be at least 1".into()));
        }
        if self.screening.max_screened == 0 {
            return Err(ConfigError::Invalid("screening.max_screened must be at least 1".into()));
        }
        if self.screening.deadline_secs == 0 {
            return Err(ConfigError::Invalid("screening.deadline_secs must be at least 1".into()));
        }
        if self.materials_project.timeout_secs == 0 {
            return Err(ConfigError::Invalid("materials_project.timeout_secs must be at least 1".into()));
        }
        if self.materials_project.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("materials_project.base_url is empty".into()));
        }
        Ok(())
    }
}

/// Load the config file, or the defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Config::from_toml(&contents, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.screening.max_screened, 30);
        assert_eq!(config.screening.top_n, 15);
        assert_eq!(config.screening.concurrency, 5);
        assert_eq!(config.screening.stable_hull_threshold, 0.05);
        assert_eq!(config.materials_project.base_url, "https://api.materialsproject.org");
        assert_eq!(config.materials_project.timeout(), Duration::from_secs(10));
        assert!(config.materials_project.api_key.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            "[screening]\nmax_screened = 10\nseed = 7\n\n[materials_project]\napi_key = \"abc\"\n",
            Path::new("test.toml"),
        )
        .unwrap();
        assert_eq!(config.screening.max_screened, 10);
        assert_eq!(config.screening.seed, Some(7));
        assert_eq!(config.screening.top_n, 15);
        assert_eq!(config.materials_project.api_key.as_deref(), Some("abc"));
        assert_eq!(config.materials_project.timeout_secs, 10);
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_toml("[screening]\nconcurrency = 0\n", Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = Config::from_toml("[screening]\ndeadline_secs = 0\n", Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("deadline_secs")));

        let err =
            Config::from_toml("[materials_project]\ntimeout_secs = 0\n", Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("timeout_secs")));

        let err = Config::from_toml("[screening\n", Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/planner.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
