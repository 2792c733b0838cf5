//! Configuration sources.

use super::config::{ConfigError, SignalConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where the controller configuration comes from.
pub trait ConfigProvider: Send + Sync {
    fn load(&self) -> Result<SignalConfig, ConfigError>;
}

// ============================================================================
// StaticConfigProvider - In-memory config for tests and development
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    config: SignalConfig,
}

impl StaticConfigProvider {
    #[must_use]
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn load(&self) -> Result<SignalConfig, ConfigError> {
        Ok(self.config.clone())
    }
}

// ============================================================================
// TomlConfigProvider - Production config file
// ============================================================================

/// Reads a TOML file on every `load`; missing sections take defaults.
#[derive(Debug, Clone)]
pub struct TomlConfigProvider {
    path: PathBuf,
}

impl TomlConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<SignalConfig, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

impl ConfigProvider for TomlConfigProvider {
    fn load(&self) -> Result<SignalConfig, ConfigError> {
        let content = fs::read_to_string(&self.path).map_err(|e| ConfigError::Io {
            path: self.path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }
}

/// Load, override and validate.
///
/// `LG_CONFIG` names a TOML file; without it the defaults apply.
pub fn load_config() -> Result<SignalConfig, ConfigError> {
    let provider: Box<dyn ConfigProvider> = match std::env::var("LG_CONFIG") {
        Ok(path) => {
            info!(%path, "Loading configuration file");
            Box::new(TomlConfigProvider::new(path))
        }
        Err(_) => Box::new(StaticConfigProvider::default()),
    };

    let mut config = provider.load()?;
    config.apply_overrides(|var| std::env::var(var).ok())?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::config::LaneBinding;

    #[test]
    fn test_parse_partial_file() {
        let config = TomlConfigProvider::parse(
            r#"
            [detector]
            listen_addr = "127.0.0.1:6001"

            [topology]
            segment_count = 2
            lanes = [
                { lane = 1, segment = 1 },
                { lane = 2, segment = 2 },
            ]

            [segment_timing]
            min_green_secs = 20

            [plates]
            placeholders = ["NOPLATE"]
            "#,
        )
        .unwrap();

        assert_eq!(config.detector.listen_addr, "127.0.0.1:6001");
        assert_eq!(config.detector.read_timeout_secs, 30);
        assert_eq!(config.topology.segment_count, 2);
        assert_eq!(config.topology.lanes[1], LaneBinding { lane: 2, segment: 2 });
        assert_eq!(config.segment_timing.min_green_secs, 20);
        assert_eq!(config.segment_timing.max_green_secs, 60);
        assert_eq!(config.plates.placeholders, vec!["NOPLATE".to_string()]);
        assert_eq!(config.plates.max_len, 16);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            TomlConfigProvider::parse("[topology]\nsegment_count = \"two\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let provider = TomlConfigProvider::new("/nonexistent/laneguard.toml");
        assert!(matches!(provider.load(), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_static_provider() {
        let mut config = SignalConfig::default();
        config.topology.segment_count = 4;
        let loaded = StaticConfigProvider::new(config.clone()).load().unwrap();
        assert_eq!(loaded, config);
    }
}
