//! Engine configuration, loaded from JSON.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{DecodeLimits, PageCount};
use crate::logging::LogLevel;

/// Errors that can occur while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Decode defaults applied by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeDefaults {
    pub autorotate: bool,
    pub pages: PageCount,
}

impl Default for DecodeDefaults {
    fn default() -> Self {
        Self {
            autorotate: true,
            pages: PageCount::Single,
        }
    }
}

/// Settings for an [`Engine`](crate::Engine). Every field has a default, so
/// `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Worker threads for per-frame transforms, 0 runs frames on the
    /// calling thread.
    pub concurrency: usize,
    pub log_level: LogLevel,
    /// Upper bounds applied to every decode, on top of the caller's own.
    pub limits: DecodeLimits,
    pub decode: DecodeDefaults,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decode.pages == PageCount::Count(0) {
            return Err(ConfigError::Invalid(
                "decode.pages must be at least 1".to_string(),
            ));
        }
        let limits = &self.limits;
        for (name, value) in [
            ("max_width", limits.max_width.map(u64::from)),
            ("max_height", limits.max_height.map(u64::from)),
            ("max_alloc", limits.max_alloc),
            ("max_pages", limits.max_pages.map(u64::from)),
        ] {
            if value == Some(0) {
                return Err(ConfigError::Invalid(format!("limits.{name} must be non-zero")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_json_is_default() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.concurrency, 0);
        assert_eq!(config.log_level, LogLevel::Warning);
        assert!(config.decode.autorotate);
    }

    #[test]
    fn test_full_json() {
        let json = r#"{
            "concurrency": 4,
            "log_level": "debug",
            "limits": { "max_width": 8000, "max_pages": 64 },
            "decode": { "autorotate": false, "pages": { "count": 3 } }
        }"#;
        let config = EngineConfig::from_json_str(json).unwrap();

        assert_eq!(config.concurrency, 4);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.limits.max_width, Some(8000));
        assert_eq!(config.limits.max_height, None);
        assert_eq!(config.limits.max_pages, Some(64));
        assert!(!config.decode.autorotate);
        assert_eq!(config.decode.pages, PageCount::Count(3));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            EngineConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"threads": 2}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"log_level": "loud"}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let err = EngineConfig::from_json_str(r#"{"limits": {"max_alloc": 0}}"#).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("max_alloc")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"decode": {"pages": {"count": 0}}}"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let path = std::env::temp_dir().join(format!("pagewise-config-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(br#"{"concurrency": 2}"#).unwrap();
        drop(file);

        let config = EngineConfig::from_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.concurrency, 2);

        assert!(matches!(
            EngineConfig::from_path(&path),
            Err(ConfigError::Io(_))
        ));
    }
}
