// src/db/mysql.rs
//! [`Database`] over a `mysql_async` connection pool.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Opts, OptsBuilder, Params, Pool, TxOpts, Value};

use super::{Database, DbError, Row};
use crate::config::DatabaseConfig;

pub struct MySqlDatabase {
    pool: Pool,
}

impl MySqlDatabase {
    /// Build the pool. No connection is opened until the first statement.
    pub fn connect(cfg: &DatabaseConfig) -> Result<Self, DbError> {
        let mut builder = OptsBuilder::from_opts(Opts::from_url(&cfg.url)?);
        if let Some(user) = &cfg.username {
            builder = builder.user(Some(user.clone()));
        }
        if let Some(pass) = &cfg.password {
            builder = builder.pass(Some(pass.clone()));
        }
        Ok(Self { pool: Pool::new(Opts::from(builder)) })
    }

    /// Close idle connections and wait for checked-out ones to return.
    pub async fn disconnect(&self) -> Result<(), DbError> {
        self.pool.clone().disconnect().await?;
        Ok(())
    }
}

#[async_trait]
impl Database for MySqlDatabase {
    async fn execute(&self, sql: &str) -> Result<u64, DbError> {
        let mut conn = self.pool.get_conn().await?;
        conn.query_drop(sql).await?;
        Ok(conn.affected_rows())
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        let mut conn = self.pool.get_conn().await?;
        let rows: Vec<mysql_async::Row> = conn.query(sql).await?;
        Ok(rows.iter().map(to_row).collect())
    }

    async fn execute_batch(&self, statements: &[String]) -> Result<u64, DbError> {
        let mut conn = self.pool.get_conn().await?;
        let mut tx = conn.start_transaction(TxOpts::default()).await?;
        for statement in statements {
            tx.query_drop(statement.as_str()).await?;
        }
        tx.commit().await?;
        Ok(statements.len() as u64)
    }

    async fn execute_prepared_batch(&self, sql: &str, rows: Vec<Vec<Option<String>>>) -> Result<u64, DbError> {
        let count = rows.len() as u64;
        let mut conn = self.pool.get_conn().await?;
        let mut tx = conn.start_transaction(TxOpts::default()).await?;
        tx.exec_batch(sql, rows.into_iter().map(Params::from)).await?;
        tx.commit().await?;
        Ok(count)
    }
}

fn to_row(row: &mysql_async::Row) -> Row {
    Row::new(
        row.columns_ref()
            .iter()
            .enumerate()
            .map(|(i, column)| (column.name_str().into_owned(), row.as_ref(i).and_then(to_text)))
            .collect(),
    )
}

fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::NULL => None,
        Value::Bytes(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::Int(v) => Some(v.to_string()),
        Value::UInt(v) => Some(v.to_string()),
        Value::Float(v) => Some(v.to_string()),
        Value::Double(v) => Some(v.to_string()),
        other => Some(other.as_sql(true).trim_matches('\'').to_owned()),
    }
}
