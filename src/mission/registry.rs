// src/mission/registry.rs

//! Mission registry.
//!
//! Built once at startup from the mission definitions, then shared
//! read-only through an `Arc` by the listener and the flush tasks. The only
//! mutable part of a mission after load is its sync state, an atomic.

use log::Level;
use metrics::counter;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
    time::Duration,
};
use thiserror::Error;

use super::ring::{Offer, RingBuffer};
use crate::comms::record::RawRecord;
use crate::config::{MissionSpec, OverflowPolicy, PipelineConfig};
use crate::db::{sync, Database, SyncReport};
use crate::schema::Table;
use crate::sql::dml;

/// Fatal problems with the mission definitions as a whole.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no mission definitions")]
    Empty,

    #[error("none of the mission definitions is valid")]
    NoValidMissions,

    #[error("mission '{0}' is defined more than once")]
    Duplicate(String),
}

/// Why a single record was not buffered.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("no mission named '{0}'")]
    UnknownMission(String),

    #[error("mission '{mission}' expects {expected} value(s) ({compact} without the auto-increment column), got {got}")]
    FieldCount { mission: String, expected: usize, compact: usize, got: usize },

    #[error("mission '{0}' is disabled")]
    Disabled(String),
}

impl IngestError {
    /// Label used on the dropped-records counter.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::UnknownMission(_) => "unknown_mission",
            Self::FieldCount { .. } => "field_count",
            Self::Disabled(_) => "disabled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SyncState {
    Pending = 0,
    Synced = 1,
    Failed = 2,
}

impl SyncState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Synced,
            2 => Self::Failed,
            _ => Self::Pending,
        }
    }
}

/// Pipeline settings of one mission after per-mission overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissionSettings {
    pub ring_buffer_size: usize,
    pub overflow: OverflowPolicy,
    pub batch_size: usize,
    pub flush_interval: Duration,
}

impl MissionSettings {
    pub fn resolve(pipeline: &PipelineConfig, spec: &MissionSpec) -> Self {
        Self {
            ring_buffer_size: spec.ring_buffer_size.unwrap_or(pipeline.ring_buffer_size),
            overflow: pipeline.overflow,
            batch_size: spec.batch_size.unwrap_or(pipeline.max_batch_size),
            flush_interval: spec.flush_interval.unwrap_or(pipeline.flush_interval),
        }
    }
}

impl From<&PipelineConfig> for MissionSettings {
    fn from(pipeline: &PipelineConfig) -> Self {
        Self::resolve(pipeline, &MissionSpec::default())
    }
}

/// One log category: its table, its buffer and its flush settings.
pub struct Mission {
    table: Table,
    ring: RingBuffer<RawRecord>,
    batch_size: usize,
    flush_interval: Duration,
    insert_sql: String,
    state: AtomicU8,
}

impl Mission {
    pub fn new(table: Table, settings: MissionSettings) -> Self {
        let insert_sql = dml::insert_prepared(&table);
        Self {
            ring: RingBuffer::new(settings.ring_buffer_size, settings.overflow),
            batch_size: settings.batch_size.max(1),
            flush_interval: settings.flush_interval,
            insert_sql,
            table,
            state: AtomicU8::new(SyncState::Pending as u8),
        }
    }

    pub fn name(&self) -> &str {
        self.table.name()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn ring(&self) -> &RingBuffer<RawRecord> {
        &self.ring
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    /// Parameterized INSERT for this mission, rendered once.
    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }

    pub fn state(&self) -> SyncState {
        SyncState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, state: SyncState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.state() == SyncState::Synced
    }

    /// Validate `record` against this mission and buffer it.
    pub fn offer(&self, record: RawRecord) -> Result<Offer, IngestError> {
        let got = record.values().len();
        if !dml::accepts_value_count(&self.table, got) {
            return Err(IngestError::FieldCount {
                mission: self.name().to_owned(),
                expected: self.table.fields().len(),
                compact: self.table.insert_fields().count(),
                got,
            });
        }
        if !self.is_enabled() {
            return Err(IngestError::Disabled(self.name().to_owned()));
        }
        Ok(self.ring.offer(record))
    }
}

pub struct MissionRegistry {
    missions: Vec<Arc<Mission>>,
    index: HashMap<String, Arc<Mission>>,
}

impl MissionRegistry {
    /// Build every valid mission. Invalid definitions are logged and left
    /// out; the registry itself fails only when nothing usable remains or a
    /// name is defined twice.
    pub fn load(specs: Vec<MissionSpec>, pipeline: &PipelineConfig) -> Result<Self, RegistryError> {
        if specs.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut missions = Vec::with_capacity(specs.len());
        let mut index = HashMap::with_capacity(specs.len());
        for spec in specs {
            let settings = MissionSettings::resolve(pipeline, &spec);
            let name = spec.table.name.trim().to_owned();
            if index.contains_key(&name) {
                return Err(RegistryError::Duplicate(name));
            }
            let table = match Table::new(spec.table) {
                Ok(table) => table,
                Err(e) => {
                    okra_log!(Level::Error, "registry", "mission '{}' is invalid and stays disabled: {}", name, e);
                    counter!("okra_missions_invalid_total").increment(1);
                    continue;
                }
            };
            okra_log!(
                Level::Debug,
                "registry",
                "mission '{}': {} field(s), ring {}, batch {}, every {}",
                name,
                table.fields().len(),
                settings.ring_buffer_size,
                settings.batch_size,
                humantime::format_duration(settings.flush_interval)
            );
            let mission = Arc::new(Mission::new(table, settings));
            index.insert(name, mission.clone());
            missions.push(mission);
        }

        if missions.is_empty() {
            return Err(RegistryError::NoValidMissions);
        }
        okra_log!(Level::Info, "registry", "{} mission(s) registered", missions.len());
        Ok(Self { missions, index })
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<Mission>> {
        self.index.get(name)
    }

    /// Missions in definition order.
    pub fn missions(&self) -> &[Arc<Mission>] {
        &self.missions
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Arc<Mission>> {
        self.missions.iter().filter(|m| m.is_enabled())
    }

    /// Route `record` to the ring of its mission.
    pub fn dispatch(&self, record: RawRecord) -> Result<Offer, IngestError> {
        let Some(mission) = self.lookup(record.category()) else {
            let e = IngestError::UnknownMission(record.category().to_owned());
            counter!("okra_records_dropped_total", "reason" => e.reason()).increment(1);
            return Err(e);
        };

        let result = mission.offer(record);
        match &result {
            Ok(offer) => count_offer(mission.name(), *offer),
            Err(e) => {
                counter!("okra_records_dropped_total", "mission" => mission.name().to_owned(), "reason" => e.reason())
                    .increment(1);
            }
        }
        result
    }

    /// Reconcile every mission's table with the database, one at a time.
    /// Returns the number of missions left enabled.
    pub async fn synchronize(&self, db: &dyn Database) -> usize {
        let mut synced = 0;
        for mission in &self.missions {
            match sync::synchronize(db, mission.table()).await {
                Ok(report) => {
                    match report {
                        SyncReport::Created => {
                            okra_log!(Level::Info, "sync", "mission '{}': table created", mission.name())
                        }
                        SyncReport::Altered(n) => {
                            okra_log!(Level::Info, "sync", "mission '{}': {} alteration(s) applied", mission.name(), n)
                        }
                        SyncReport::UpToDate => {
                            okra_log!(Level::Debug, "sync", "mission '{}': table up to date", mission.name())
                        }
                    }
                    mission.set_state(SyncState::Synced);
                    synced += 1;
                }
                Err(e) => {
                    okra_log!(Level::Error, "sync", "mission '{}' disabled: {}", mission.name(), e);
                    counter!("okra_schema_sync_failures_total", "mission" => mission.name().to_owned()).increment(1);
                    mission.set_state(SyncState::Failed);
                }
            }
        }
        synced
    }
}

fn count_offer(mission: &str, offer: Offer) {
    let mission = mission.to_owned();
    match offer {
        Offer::Accepted => {}
        Offer::Evicted => counter!("okra_records_evicted_total", "mission" => mission.clone()).increment(1),
        Offer::Rejected => {
            counter!("okra_records_dropped_total", "mission" => mission, "reason" => "overflow").increment(1);
            return;
        }
    }
    counter!("okra_records_received_total", "mission" => mission).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, TableSpec};
    use metrics_exporter_prometheus::PrometheusBuilder;

    fn spec(name: &str, fields: &[(&str, &str)]) -> MissionSpec {
        MissionSpec::from(TableSpec {
            name: name.into(),
            fields: fields
                .iter()
                .map(|(n, t)| FieldSpec { name: (*n).into(), data_type: (*t).into(), ..FieldSpec::default() })
                .collect(),
            ..TableSpec::default()
        })
    }

    fn login() -> MissionSpec {
        let mut spec = spec("login", &[("id", "bigint"), ("uid", "int"), ("name", "varchar")]);
        spec.table.fields[0].auto_increment = true;
        spec.table.fields[0].primary_key = true;
        spec
    }

    fn record(line: &str) -> RawRecord {
        RawRecord::decode(line.as_bytes(), '|').unwrap()
    }

    #[test]
    fn rejects_empty_and_duplicate_definitions() {
        let pipeline = PipelineConfig::default();
        assert_eq!(MissionRegistry::load(vec![], &pipeline).err(), Some(RegistryError::Empty));
        assert_eq!(
            MissionRegistry::load(vec![login(), login()], &pipeline).err(),
            Some(RegistryError::Duplicate("login".into()))
        );
        assert_eq!(
            MissionRegistry::load(vec![spec("broken", &[])], &pipeline).err(),
            Some(RegistryError::NoValidMissions)
        );
    }

    #[test]
    fn invalid_definitions_are_skipped() {
        let registry =
            MissionRegistry::load(vec![spec("broken", &[]), login()], &PipelineConfig::default()).unwrap();
        assert_eq!(registry.missions().len(), 1);
        assert!(registry.lookup("broken").is_none());
        assert!(registry.lookup("login").is_some());
    }

    #[test]
    fn per_mission_overrides_win() {
        let mut spec = login();
        spec.batch_size = Some(7);
        spec.ring_buffer_size = Some(3);
        spec.flush_interval = Some(Duration::from_millis(20));
        let registry = MissionRegistry::load(vec![spec], &PipelineConfig::default()).unwrap();
        let mission = registry.lookup("login").unwrap();
        assert_eq!(mission.batch_size(), 7);
        assert_eq!(mission.ring().capacity(), 3);
        assert_eq!(mission.flush_interval(), Duration::from_millis(20));
        assert_eq!(mission.insert_sql(), "INSERT INTO `login` (`uid`,`name`) VALUES (?,?);");
    }

    #[test]
    fn dispatch_checks_mission_count_and_state() {
        let registry = MissionRegistry::load(vec![login()], &PipelineConfig::default()).unwrap();
        let mission = registry.lookup("login").unwrap();

        assert_eq!(
            registry.dispatch(record("logout|1|a")),
            Err(IngestError::UnknownMission("logout".into()))
        );
        assert_eq!(
            registry.dispatch(record("login|1")),
            Err(IngestError::FieldCount { mission: "login".into(), expected: 3, compact: 2, got: 1 })
        );
        assert_eq!(registry.dispatch(record("login|1001|")), Err(IngestError::Disabled("login".into())));
        assert!(mission.ring().is_empty());

        mission.set_state(SyncState::Synced);
        assert_eq!(registry.dispatch(record("login|1001|")), Ok(Offer::Accepted));
        assert_eq!(registry.dispatch(record("login|0|1002|Bob")), Ok(Offer::Accepted));
        assert_eq!(mission.ring().len(), 2);
        assert_eq!(registry.enabled().count(), 1);

        mission.set_state(SyncState::Failed);
        assert_eq!(registry.dispatch(record("login|1003|")), Err(IngestError::Disabled("login".into())));
    }

    #[test]
    fn offer_counters_carry_the_mission() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        let mut spec = login();
        spec.ring_buffer_size = Some(1);
        let registry = MissionRegistry::load(vec![spec], &PipelineConfig::default()).unwrap();
        registry.lookup("login").unwrap().set_state(SyncState::Synced);

        metrics::with_local_recorder(&recorder, || {
            registry.dispatch(record("login|1001|")).unwrap();
            registry.dispatch(record("login|1002|")).unwrap();
            let _ = registry.dispatch(record("login|1"));
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"okra_records_received_total{mission="login"} 2"#), "{rendered}");
        assert!(rendered.contains(r#"okra_records_evicted_total{mission="login"} 1"#), "{rendered}");
        assert!(
            rendered.lines().any(|line| line.starts_with("okra_records_dropped_total")
                && line.contains(r#"mission="login""#)
                && line.contains(r#"reason="field_count""#)),
            "{rendered}"
        );
    }
}
