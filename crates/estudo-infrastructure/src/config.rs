//! Application configuration stored as TOML.

use crate::paths::EstudoPaths;
use estudo_core::artifact::DEFAULT_MAX_FILENAME_LEN;
use estudo_core::error::{EstudoError, Result};
use estudo_core::generation::DEFAULT_DIAGNOSTIC_PREFIX;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_LOG_FILTER: &str = "info";

/// Root configuration structure.
///
/// Every section is optional in the file; anything missing takes its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EstudoConfig {
    /// Root directory of the note tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_root: Option<PathBuf>,
    pub generation: GenerationConfig,
    pub artifacts: ArtifactsConfig,
    pub logging: LoggingConfig,
}

/// Generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Cancel a generation after this many seconds without a fragment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout_secs: Option<u64>,
    pub diagnostic_prefix: String,
}

impl GenerationConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: None,
            diagnostic_prefix: DEFAULT_DIAGNOSTIC_PREFIX.to_string(),
        }
    }
}

/// Artifact persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub max_filename_len: usize,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            max_filename_len: DEFAULT_MAX_FILENAME_LEN,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl EstudoConfig {
    /// Loads the configuration from the default location.
    ///
    /// A platform without a config directory yields defaults.
    pub fn load_default() -> Result<Self> {
        match EstudoPaths::config_file() {
            Ok(path) => Self::load(&path),
            Err(e) => {
                tracing::warn!("[EstudoConfig] {}, using defaults", e);
                Ok(Self::default())
            }
        }
    }

    /// Loads the configuration from `path`.
    ///
    /// # Returns
    ///
    /// - `Ok(config)`: parsed file, or defaults if the file is missing or empty
    /// - `Err(EstudoError::Serialization)`: the file is not valid TOML for this schema
    /// - `Err(EstudoError::Io)`: the file exists but cannot be read
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(
                "[EstudoConfig] No config at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Writes the configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| EstudoError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = EstudoConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, EstudoConfig::default());
        assert_eq!(config.artifacts.max_filename_len, 50);
        assert_eq!(config.logging.filter, "info");
        assert_eq!(config.generation.idle_timeout(), None);
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(EstudoConfig::load(&path).unwrap(), EstudoConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "vault_root = \"/notes\"\n\n[generation]\nidle_timeout_secs = 120\n",
        )
        .unwrap();

        let config = EstudoConfig::load(&path).unwrap();
        assert_eq!(config.vault_root, Some(PathBuf::from("/notes")));
        assert_eq!(
            config.generation.idle_timeout(),
            Some(Duration::from_secs(120))
        );
        assert_eq!(config.generation.diagnostic_prefix, DEFAULT_DIAGNOSTIC_PREFIX);
        assert_eq!(config.artifacts.max_filename_len, 50);
    }

    #[test]
    fn test_zero_timeout_disables_watchdog() {
        let config = GenerationConfig {
            idle_timeout_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(config.idle_timeout(), None);
    }

    #[test]
    fn test_malformed_file_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[artifacts]\nmax_filename_len = \"long\"\n").unwrap();

        let err = EstudoConfig::load(&path).unwrap_err();
        assert!(matches!(err, EstudoError::Serialization { .. }));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = EstudoConfig::default();
        config.artifacts.max_filename_len = 30;
        config.logging.filter = "estudo=debug".into();

        config.save(&path).unwrap();
        assert_eq!(EstudoConfig::load(&path).unwrap(), config);
    }
}
