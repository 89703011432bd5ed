//! Engine Configuration
//!
//! Tunables for the dispatch engine, loadable from TOML:
//!
//! ```toml
//! log_ambiguity = true
//!
//! [cache]
//! enabled = true
//! capacity = 65536
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for an [`crate::Engine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Resolution cache settings.
    pub cache: CacheConfig,

    /// Emit a warning for each freshly computed ambiguous resolution.
    pub log_ambiguity: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            log_ambiguity: true,
        }
    }
}

/// Resolution cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Memoize outcomes per resolution key.
    pub enabled: bool,

    /// Maximum number of stored outcomes. Once reached, new outcomes are
    /// still computed but no longer stored.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 65_536,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Configuration with the resolution cache turned off.
    pub fn uncached() -> Self {
        Self {
            cache: CacheConfig {
                enabled: false,
                ..CacheConfig::default()
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_from_empty_toml() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let cfg = EngineConfig::from_toml_str("[cache]\ncapacity = 8\n").unwrap();
        assert!(cfg.cache.enabled);
        assert_eq!(cfg.cache.capacity, 8);
        assert!(cfg.log_ambiguity);
    }

    #[test]
    fn test_invalid_toml() {
        let err = EngineConfig::from_toml_str("[cache]\nenabled = \"yes\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("polycall.toml");
        fs::write(&path, "log_ambiguity = false\n[cache]\nenabled = false\n").unwrap();

        let cfg = EngineConfig::load(&path).unwrap();
        assert!(!cfg.log_ambiguity);
        assert!(!cfg.cache.enabled);

        let missing = EngineConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
