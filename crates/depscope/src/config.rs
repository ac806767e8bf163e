//! Configuration file for the depscope CLI.
//!
//! ```yaml
//! fixture: neighborhoods.yaml
//! max_depth: 2
//! ```
//!
//! Relative fixture paths are resolved against the directory holding the
//! configuration file.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default configuration file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "depscope.yaml";

/// Default number of levels expanded before scripted steps run.
pub const DEFAULT_MAX_DEPTH: usize = 1;

/// Configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepscopeConfig {
    /// Neighborhood fixture the CLI expands against
    #[serde(default)]
    pub fixture: Option<PathBuf>,

    /// Levels expanded from the seed before scripted steps
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for DepscopeConfig {
    fn default() -> Self {
        Self {
            fixture: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DepscopeConfig {
    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// - `Error::Io` if the file cannot be read
    /// - `Error::Config` if it is not valid YAML for this structure
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let mut config: Self =
            serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;

        if let (Some(fixture), Some(base)) = (config.fixture.as_ref(), path.parent()) {
            if fixture.is_relative() {
                config.fixture = Some(base.join(fixture));
            }
        }
        Ok(config)
    }

    /// Load `path` if given, otherwise `depscope.yaml` in the working
    /// directory if it exists, otherwise defaults.
    ///
    /// # Errors
    ///
    /// Same as [`DepscopeConfig::load`]. An explicitly named file that does
    /// not exist is an error; a missing default file is not.
    pub async fn discover(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path).await;
        }

        let default_path = Path::new(CONFIG_FILE_NAME);
        if fs::try_exists(default_path).await? {
            tracing::debug!(path = CONFIG_FILE_NAME, "Using configuration from working directory");
            Self::load(default_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_relative_fixture_resolved_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, "fixture: data/neighborhoods.yaml\nmax_depth: 3\n")
            .await
            .unwrap();

        let config = DepscopeConfig::load(&path).await.unwrap();
        assert_eq!(
            config.fixture,
            Some(dir.path().join("data/neighborhoods.yaml"))
        );
        assert_eq!(config.max_depth, 3);
    }

    #[tokio::test]
    async fn test_defaults_applied() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, "{}\n").await.unwrap();

        let config = DepscopeConfig::load(&path).await.unwrap();
        assert_eq!(config, DepscopeConfig::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = DepscopeConfig {
            fixture: Some(PathBuf::from("/abs/fixture.yaml")),
            max_depth: 2,
        };

        config.save(&path).await.unwrap();
        assert_eq!(DepscopeConfig::load(&path).await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, "max_depth: many\n").await.unwrap();

        let err = DepscopeConfig::load(&path).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_explicit_missing_file_is_error() {
        let err = DepscopeConfig::discover(Some(Path::new("/nonexistent/depscope.yaml")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
