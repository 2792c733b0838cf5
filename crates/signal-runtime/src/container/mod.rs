//! # Controller Container
//!
//! Configuration loading and construction of the shared components.

pub mod config;
pub mod provider;
pub mod subsystems;

pub use config::{
    ConfigError, DetectorConfig, LaneBinding, SchedulerConfig, SegmentTimingConfig, SignalConfig,
    SystemTimingConfig, TopologyConfig,
};
pub use provider::{load_config, ConfigProvider, StaticConfigProvider, TomlConfigProvider};
pub use subsystems::SignalContainer;
