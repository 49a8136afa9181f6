// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use okra_log::config::{MissionSpec, PipelineConfig};
use okra_log::db::{Database, DbError, Row};
use okra_log::mission::{MissionRegistry, SyncState};
use okra_log::schema::{FieldSpec, TableSpec};

/// In-memory [`Database`]: records every call, serves canned query rows and
/// fails on demand.
#[derive(Default)]
pub struct MockDatabase {
    rows: Mutex<HashMap<String, Vec<Row>>>,
    executed: Mutex<Vec<String>>,
    batches: Mutex<Vec<Vec<String>>>,
    prepared: Mutex<Vec<(String, Vec<Vec<Option<String>>>)>>,
    queries: Mutex<Vec<String>>,
    fail_on: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `rows` whenever exactly `sql` is queried.
    pub fn with_rows(self, sql: impl Into<String>, rows: Vec<Row>) -> Self {
        self.rows.lock().unwrap().insert(sql.into(), rows);
        self
    }

    /// Fail every call whose statement contains `needle`.
    pub fn fail_on(&self, needle: impl Into<String>) {
        *self.fail_on.lock().unwrap() = Some(needle.into());
    }

    pub fn recover(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn prepared(&self) -> Vec<(String, Vec<Vec<Option<String>>>)> {
        self.prepared.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn check(&self, sql: &str) -> Result<(), DbError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_on.lock().unwrap().as_deref() {
            Some(needle) if sql.contains(needle) => Err(DbError::Rejected(format!("injected failure: {sql}"))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Database for MockDatabase {
    async fn execute(&self, sql: &str) -> Result<u64, DbError> {
        self.check(sql)?;
        self.executed.lock().unwrap().push(sql.to_owned());
        Ok(0)
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        self.check(sql)?;
        self.queries.lock().unwrap().push(sql.to_owned());
        Ok(self.rows.lock().unwrap().get(sql).cloned().unwrap_or_default())
    }

    async fn execute_batch(&self, statements: &[String]) -> Result<u64, DbError> {
        for statement in statements {
            self.check(statement)?;
        }
        self.batches.lock().unwrap().push(statements.to_vec());
        Ok(statements.len() as u64)
    }

    async fn execute_prepared_batch(&self, sql: &str, rows: Vec<Vec<Option<String>>>) -> Result<u64, DbError> {
        self.check(sql)?;
        let count = rows.len() as u64;
        self.prepared.lock().unwrap().push((sql.to_owned(), rows));
        Ok(count)
    }
}

pub fn field(name: &str, data_type: &str) -> FieldSpec {
    FieldSpec { name: name.into(), data_type: data_type.into(), ..FieldSpec::default() }
}

/// `login(id BIGINT(20) UNSIGNED AUTO_INCREMENT PK, uid INT NOT NULL, name VARCHAR(20) DEFAULT '')`
pub fn login_spec() -> TableSpec {
    TableSpec {
        name: "login".into(),
        fields: vec![
            FieldSpec {
                length: Some("20".into()),
                unsigned: true,
                primary_key: true,
                auto_increment: true,
                ..field("id", "bigint")
            },
            FieldSpec { not_null: true, ..field("uid", "int") },
            FieldSpec { length: Some("20".into()), default: Some("''".into()), ..field("name", "varchar") },
        ],
        ..TableSpec::default()
    }
}

/// Registry with the login mission, already marked synced.
pub fn synced_registry(pipeline: &PipelineConfig) -> MissionRegistry {
    let registry = MissionRegistry::load(vec![MissionSpec::from(login_spec())], pipeline).unwrap();
    registry.lookup("login").unwrap().set_state(SyncState::Synced);
    registry
}

pub fn row(pairs: &[(&str, Option<&str>)]) -> Row {
    Row::from_pairs(pairs.iter().copied())
}
