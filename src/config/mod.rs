//! Public API for configuration

pub mod loader;
pub mod model;

// Re-export the main entrypoints:
pub use loader::{load, load_missions};
pub use model::{
    Config, ConfigError, DatabaseConfig, InsertMode, ListenerConfig, LoggingConfig, MetricsConfig, MissionSpec,
    MissionsConfig, OverflowPolicy, PipelineConfig,
};
