// src/config/loader.rs

//! # Configuration Loader
//!
//! Reads the daemon config and the mission definitions from TOML and turns
//! the raw stubs into validated runtime values.

use log::Level;
use serde::Deserialize;
use std::{fs, path::Path};

use super::model::{Config, ConfigError, ConfigStub, MissionSpec, MissionStub};

/// Load and validate the daemon configuration from `path`.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    okra_log!(Level::Debug, "config", "Reading config from {:?}", path);
    let txt = fs::read_to_string(path)?;
    let cfg = parse(&txt)?;
    okra_log!(Level::Info, "config", "Loaded config from {:?}", path);
    Ok(cfg)
}

pub fn parse(txt: &str) -> Result<Config, ConfigError> {
    let stub: ConfigStub = toml::from_str(txt)?;
    stub.try_into()
}

#[derive(Debug, Deserialize)]
struct MissionsFile {
    #[serde(default)]
    mission: Vec<MissionStub>,
}

/// Load the `[[mission]]` definitions from `path`.
pub fn load_missions(path: &Path) -> Result<Vec<MissionSpec>, ConfigError> {
    okra_log!(Level::Debug, "config", "Reading missions from {:?}", path);
    let txt = fs::read_to_string(path)?;
    let missions = parse_missions(&txt)?;
    okra_log!(Level::Info, "config", "Loaded {} mission definition(s) from {:?}", missions.len(), path);
    Ok(missions)
}

pub fn parse_missions(txt: &str) -> Result<Vec<MissionSpec>, ConfigError> {
    let file: MissionsFile = toml::from_str(txt)?;
    file.mission.into_iter().map(MissionSpec::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{InsertMode, OverflowPolicy};
    use crate::schema::IndexKind;
    use std::time::Duration;

    #[test]
    fn minimal_config_takes_defaults() {
        let cfg = parse("[database]\nurl = \"mysql://localhost/okra\"\n").unwrap();
        assert_eq!(cfg.listener.port, 9005);
        assert_eq!(cfg.listener.separator, '|');
        assert_eq!(cfg.listener.addr().to_string(), "0.0.0.0:9005");
        assert_eq!(cfg.pipeline.ring_buffer_size, 16);
        assert_eq!(cfg.pipeline.flush_interval, Duration::from_millis(5000));
        assert_eq!(cfg.pipeline.max_batch_size, 100);
        assert_eq!(cfg.pipeline.overflow, OverflowPolicy::OverwriteOldest);
        assert_eq!(cfg.pipeline.insert_mode, InsertMode::Literal);
        assert_eq!(cfg.logging.level, "INFO");
        assert!(cfg.metrics.prometheus_listen.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = parse(
            r#"
            [listener]
            port = 9100
            separator = ","

            [pipeline]
            ring_buffer_size = 64
            flush_interval = "250ms"
            overflow = "reject_newest"
            insert_mode = "prepared"

            [database]
            url = "mysql://localhost/okra"
            username = "okra"

            [metrics]
            prometheus_listen = "127.0.0.1:9200"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.listener.separator, ',');
        assert_eq!(cfg.pipeline.ring_buffer_size, 64);
        assert_eq!(cfg.pipeline.flush_interval, Duration::from_millis(250));
        assert_eq!(cfg.pipeline.overflow, OverflowPolicy::RejectNewest);
        assert_eq!(cfg.pipeline.insert_mode, InsertMode::Prepared);
        assert_eq!(cfg.database.username.as_deref(), Some("okra"));
        assert_eq!(cfg.metrics.prometheus_listen.map(|a| a.port()), Some(9200));
    }

    #[test]
    fn rejects_invalid_values() {
        let with = |section: &str| parse(&format!("{section}\n[database]\nurl = \"x\"\n"));
        assert!(matches!(with("[listener]\nseparator = \"||\""), Err(ConfigError::InvalidSeparator(_))));
        assert!(matches!(with("[listener]\nbind = \"nowhere\""), Err(ConfigError::InvalidBind(_))));
        assert!(matches!(with("[pipeline]\nring_buffer_size = 0"), Err(ConfigError::Zero("ring_buffer_size"))));
        assert!(matches!(with("[pipeline]\nflush_interval = \"soon\""), Err(ConfigError::InvalidDuration(..))));
        assert!(matches!(with("[pipeline]\noverflow = \"block\""), Err(ConfigError::InvalidOverflow(_))));
        assert!(matches!(with("[pipeline]\ninsert_mode = \"bulk\""), Err(ConfigError::InvalidInsertMode(_))));
        assert!(matches!(parse("[listener]\nport = 1\n"), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn decodes_mission_definitions() {
        let missions = parse_missions(
            r#"
            [[mission]]
            name = "login"
            database = "okra"
            desc = "login log"
            batch_size = 200
            flush_interval = "1s"

              [[mission.field]]
              name = "id"
              type = "bigint"
              length = "20"
              primary_key = true
              auto_increment = true

              [[mission.field]]
              name = "name"
              type = "varchar"
              length = "20"
              default = "''"

              [[mission.index]]
              kind = "primary"
              columns = ["id"]

            [[mission]]
            name = "logout"

              [[mission.field]]
              name = "uid"
              type = "int"
            "#,
        )
        .unwrap();

        assert_eq!(missions.len(), 2);
        let login = &missions[0];
        assert_eq!(login.table.name, "login");
        assert_eq!(login.table.database.as_deref(), Some("okra"));
        assert_eq!(login.batch_size, Some(200));
        assert_eq!(login.flush_interval, Some(Duration::from_secs(1)));
        assert_eq!(login.ring_buffer_size, None);
        assert_eq!(login.table.fields.len(), 2);
        assert!(login.table.fields[0].auto_increment);
        assert_eq!(login.table.fields[1].default.as_deref(), Some("''"));
        assert_eq!(login.table.indexes[0].kind, IndexKind::Primary);
        assert_eq!(missions[1].table.fields[0].data_type, "int");
    }

    #[test]
    fn rejects_bad_mission_override() {
        let err = parse_missions("[[mission]]\nname = \"a\"\nbatch_size = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Zero("batch_size")));
    }
}
