//! Config file discovery

use super::InserterConfig;
use crate::utils::ConfigError;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "text-inserter.yaml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./text-inserter.yaml
    /// 2. ~/.text-inserter/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<InserterConfig, ConfigError> {
        let local_config = PathBuf::from(".").join(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home_config) = Self::home_config_path() {
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(InserterConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<InserterConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: InserterConfig = serde_yaml::from_str(&content)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// `~/.text-inserter/config.yaml`, when a home directory is known
    pub fn home_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".text-inserter").join("config.yaml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "notification_ms: 500\nblocked_schemes: [file]\n").unwrap();

        let config = ConfigLoader::load_from(&path).await.unwrap();
        assert_eq!(config.notification_duration(), Duration::from_millis(500));
        assert_eq!(config.status_reset_duration(), Duration::from_millis(2000));
        assert_eq!(config.blocked_schemes, vec!["file".to_string()]);
    }

    #[tokio::test]
    async fn test_bad_yaml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "notification_ms: [not a number").unwrap();

        let err = ConfigLoader::load_from(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = ConfigLoader::load_from(Path::new("/nonexistent/text-inserter.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
