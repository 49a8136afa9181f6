// src/config/model.rs

use serde::Deserialize;
use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};
use thiserror::Error;

use crate::schema::TableSpec;

/// Top-level runtime config, built once at startup and passed down.
#[derive(Debug, Clone)]
pub struct Config {
    pub listener: ListenerConfig,
    pub pipeline: PipelineConfig,
    pub database: DatabaseConfig,
    pub missions: MissionsConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// Fully-typed `[listener]` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub separator: char,
    pub max_datagram: usize,
}

impl ListenerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// Fully-typed `[pipeline]` section; the defaults of every mission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub ring_buffer_size: usize,
    pub flush_interval: Duration,
    pub max_batch_size: usize,
    pub overflow: OverflowPolicy,
    pub insert_mode: InsertMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ring_buffer_size: default_ring_buffer_size(),
            flush_interval: Duration::from_millis(5_000),
            max_batch_size: default_max_batch_size(),
            overflow: OverflowPolicy::OverwriteOldest,
            insert_mode: InsertMode::Literal,
        }
    }
}

/// What a full ring buffer does with a new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Drop the oldest buffered record to make room.
    OverwriteOldest,
    /// Drop the new record.
    RejectNewest,
}

/// How a flushed batch reaches the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// One INSERT per record with values inlined.
    Literal,
    /// One prepared INSERT, executed once per record.
    Prepared,
}

/// Mirror of the `[database]` table; **no defaults**, must be present in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Mirror of the `[missions]` table
#[derive(Debug, Clone, Deserialize)]
pub struct MissionsConfig {
    #[serde(default = "default_missions_path")]
    pub path: PathBuf,
}

impl Default for MissionsConfig {
    fn default() -> Self {
        Self { path: default_missions_path() }
    }
}

/// Mirror of the `[logging]` table
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]            pub enable: bool,
    #[serde(default)]            pub file:   Option<String>,
    #[serde(default = "default_level")] pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { enable: false, file: None, level: default_level() }
    }
}

/// Mirror of the `[metrics]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub prometheus_listen: Option<SocketAddr>,
}

/// Raw `[listener]` entries from TOML
#[derive(Debug, Deserialize)]
pub struct ListenerStub {
    #[serde(default = "default_bind")]      pub bind: String,
    #[serde(default = "default_port")]      pub port: u16,
    #[serde(default = "default_separator")] pub separator: String,
    #[serde(default = "default_max_datagram")] pub max_datagram: usize,
}

impl Default for ListenerStub {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            separator: default_separator(),
            max_datagram: default_max_datagram(),
        }
    }
}

/// Raw `[pipeline]` entries from TOML
#[derive(Debug, Deserialize)]
pub struct PipelineStub {
    #[serde(default = "default_ring_buffer_size")] pub ring_buffer_size: usize,
    #[serde(default = "default_flush_interval")]   pub flush_interval: String,
    #[serde(default = "default_max_batch_size")]   pub max_batch_size: usize,
    #[serde(default = "default_overflow")]         pub overflow: String,
    #[serde(default = "default_insert_mode")]      pub insert_mode: String,
}

impl Default for PipelineStub {
    fn default() -> Self {
        Self {
            ring_buffer_size: default_ring_buffer_size(),
            flush_interval: default_flush_interval(),
            max_batch_size: default_max_batch_size(),
            overflow: default_overflow(),
            insert_mode: default_insert_mode(),
        }
    }
}

/// Whole config file as deserialized from TOML.
#[derive(Debug, Deserialize)]
pub struct ConfigStub {
    #[serde(default)] pub listener: ListenerStub,
    #[serde(default)] pub pipeline: PipelineStub,
    pub database: DatabaseConfig,
    #[serde(default)] pub missions: MissionsConfig,
    #[serde(default)] pub logging: LoggingConfig,
    #[serde(default)] pub metrics: MetricsConfig,
}

/// One `[[mission]]` entry: a table declaration plus optional pipeline
/// overrides.
#[derive(Debug, Deserialize)]
pub struct MissionStub {
    #[serde(flatten)]
    pub table: TableSpec,
    #[serde(default)] pub ring_buffer_size: Option<usize>,
    #[serde(default)] pub batch_size: Option<usize>,
    #[serde(default)] pub flush_interval: Option<String>,
}

/// Decoded mission definition handed to the registry.
#[derive(Debug, Clone, Default)]
pub struct MissionSpec {
    pub table: TableSpec,
    pub ring_buffer_size: Option<usize>,
    pub batch_size: Option<usize>,
    pub flush_interval: Option<Duration>,
}

impl From<TableSpec> for MissionSpec {
    fn from(table: TableSpec) -> Self {
        Self { table, ..Self::default() }
    }
}

/// All the ways config loading can go wrong
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid duration '{0}': {1}")]
    InvalidDuration(String, #[source] humantime::DurationError),

    #[error("separator must be a single character, got '{0}'")]
    InvalidSeparator(String),

    #[error("invalid bind address '{0}'")]
    InvalidBind(String),

    #[error("invalid overflow policy '{0}'")]
    InvalidOverflow(String),

    #[error("invalid insert mode '{0}'")]
    InvalidInsertMode(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Allow `"overwrite_oldest"` → `OverflowPolicy::OverwriteOldest`
impl FromStr for OverflowPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overwrite_oldest" => Ok(OverflowPolicy::OverwriteOldest),
            "reject_newest"    => Ok(OverflowPolicy::RejectNewest),
            other              => Err(ConfigError::InvalidOverflow(other.into())),
        }
    }
}

impl FromStr for InsertMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "literal"  => Ok(InsertMode::Literal),
            "prepared" => Ok(InsertMode::Prepared),
            other      => Err(ConfigError::InvalidInsertMode(other.into())),
        }
    }
}

impl TryFrom<ListenerStub> for ListenerConfig {
    type Error = ConfigError;

    fn try_from(stub: ListenerStub) -> Result<Self, Self::Error> {
        let mut chars = stub.separator.chars();
        let separator = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => return Err(ConfigError::InvalidSeparator(stub.separator)),
        };
        let bind = stub.bind.parse().map_err(|_| ConfigError::InvalidBind(stub.bind.clone()))?;
        Ok(Self {
            bind,
            port: stub.port,
            separator,
            max_datagram: positive("max_datagram", stub.max_datagram)?,
        })
    }
}

impl TryFrom<PipelineStub> for PipelineConfig {
    type Error = ConfigError;

    fn try_from(stub: PipelineStub) -> Result<Self, Self::Error> {
        Ok(Self {
            ring_buffer_size: positive("ring_buffer_size", stub.ring_buffer_size)?,
            flush_interval: parse_interval(&stub.flush_interval)?,
            max_batch_size: positive("max_batch_size", stub.max_batch_size)?,
            overflow: stub.overflow.parse()?,
            insert_mode: stub.insert_mode.parse()?,
        })
    }
}

impl TryFrom<ConfigStub> for Config {
    type Error = ConfigError;

    fn try_from(stub: ConfigStub) -> Result<Self, Self::Error> {
        Ok(Self {
            listener: stub.listener.try_into()?,
            pipeline: stub.pipeline.try_into()?,
            database: stub.database,
            missions: stub.missions,
            logging: stub.logging,
            metrics: stub.metrics,
        })
    }
}

impl TryFrom<MissionStub> for MissionSpec {
    type Error = ConfigError;

    fn try_from(stub: MissionStub) -> Result<Self, Self::Error> {
        Ok(Self {
            table: stub.table,
            ring_buffer_size: stub.ring_buffer_size.map(|n| positive("ring_buffer_size", n)).transpose()?,
            batch_size: stub.batch_size.map(|n| positive("batch_size", n)).transpose()?,
            flush_interval: stub.flush_interval.as_deref().map(parse_interval).transpose()?,
        })
    }
}

/// Parse a humantime duration such as `"5000ms"` or `"5s"`; zero is rejected.
pub fn parse_interval(text: &str) -> Result<Duration, ConfigError> {
    let interval =
        humantime::parse_duration(text).map_err(|e| ConfigError::InvalidDuration(text.into(), e))?;
    if interval.is_zero() {
        return Err(ConfigError::Zero("flush_interval"));
    }
    Ok(interval)
}

fn positive(name: &'static str, value: usize) -> Result<usize, ConfigError> {
    if value == 0 { Err(ConfigError::Zero(name)) } else { Ok(value) }
}

fn default_level() -> String { "INFO".into() }
fn default_bind() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 9005 }
fn default_separator() -> String { "|".into() }
fn default_max_datagram() -> usize { 65_507 }
fn default_ring_buffer_size() -> usize { 16 }
fn default_flush_interval() -> String { "5000ms".into() }
fn default_max_batch_size() -> usize { 100 }
fn default_overflow() -> String { "overwrite_oldest".into() }
fn default_insert_mode() -> String { "literal".into() }
fn default_missions_path() -> PathBuf { PathBuf::from("./config/missions.toml") }
