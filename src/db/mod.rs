// src/db/mod.rs
//! Database contract, the MySQL adapter and the startup schema synchronizer.

pub mod mysql;
pub mod sync;

use async_trait::async_trait;
use thiserror::Error;

pub use mysql::MySqlDatabase;
pub use sync::{synchronize, plan_alterations, SyncError, SyncReport};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    #[error("invalid database URL: {0}")]
    Url(#[from] mysql_async::UrlError),

    #[error("{0}")]
    Rejected(String),
}

/// One result row, column name to text value (`None` for SQL NULL).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, Option<String>)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Option<String>)>) -> Self {
        Self { columns }
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, value)| (name.to_owned(), value.map(str::to_owned)))
                .collect(),
        )
    }

    /// Value of `column`; `None` when the column is absent or NULL.
    /// Exact names win over case-insensitive matches.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .or_else(|| self.columns.iter().find(|(name, _)| name.eq_ignore_ascii_case(column)))
            .and_then(|(_, value)| value.as_deref())
    }
}

/// Everything the daemon needs from a database. Connection acquisition,
/// pooling and retry live behind the implementation.
#[async_trait]
pub trait Database: Send + Sync + 'static {
    /// Run one statement, returning the affected row count.
    async fn execute(&self, sql: &str) -> Result<u64, DbError>;

    /// Run a query and collect every row.
    async fn query(&self, sql: &str) -> Result<Vec<Row>, DbError>;

    /// Run `statements` in one transaction; all or nothing.
    async fn execute_batch(&self, statements: &[String]) -> Result<u64, DbError>;

    /// Run one parameterized statement once per parameter row, in one
    /// transaction.
    async fn execute_prepared_batch(&self, sql: &str, rows: Vec<Vec<Option<String>>>) -> Result<u64, DbError>;
}
