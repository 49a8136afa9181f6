// src/db/sync.rs

//! Startup schema reconciliation.
//!
//! A missing table is created. An existing one gets `ADD COLUMN` for every
//! declared column it lacks and `CHANGE COLUMN` for every declared column
//! whose definition drifted. Columns that only exist live are left alone;
//! nothing is ever dropped.

use log::Level;
use thiserror::Error;

use super::{Database, DbError};
use crate::schema::introspect::{fetch_table, IntrospectError};
use crate::schema::{Field, Table, TypeFamily};
use crate::sql::ddl;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("introspection of '{table}' failed: {source}")]
    Introspect {
        table: String,
        #[source]
        source: IntrospectError,
    },

    #[error("'{statement}' failed: {source}")]
    Execute {
        statement: String,
        #[source]
        source: DbError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncReport {
    Created,
    Altered(usize),
    UpToDate,
}

/// Bring the live table in line with `declared`. Statements run one by one;
/// the first failure stops the run.
pub async fn synchronize(db: &dyn Database, declared: &Table) -> Result<SyncReport, SyncError> {
    let live = fetch_table(db, declared.database(), declared.name())
        .await
        .map_err(|source| SyncError::Introspect { table: declared.name().to_owned(), source })?;

    let (statements, report) = match live {
        None => (vec![ddl::create_table(declared)], SyncReport::Created),
        Some(live) => {
            let statements = plan_alterations(declared, &live);
            let report = match statements.len() {
                0 => SyncReport::UpToDate,
                n => SyncReport::Altered(n),
            };
            (statements, report)
        }
    };

    for statement in statements {
        okra_log!(Level::Debug, "sync", "{}", statement);
        if let Err(source) = db.execute(&statement).await {
            return Err(SyncError::Execute { statement, source });
        }
    }
    Ok(report)
}

/// ALTER statements that turn `live` into `declared`, in declared order.
pub fn plan_alterations(declared: &Table, live: &Table) -> Vec<String> {
    let mut statements = Vec::new();
    let mut previous: Option<&str> = None;

    for field in declared.fields() {
        match live.field(field.name()) {
            None => statements.push(ddl::add_column(declared, field, previous)),
            Some(current) => {
                let drift = column_differences(field, current);
                if !drift.is_empty() {
                    okra_log!(
                        Level::Info,
                        "sync",
                        "{}.{} drifted ({}): live '{}', declared '{}'",
                        declared.name(),
                        field.name(),
                        drift.join(", "),
                        current.column_type(),
                        field.column_type()
                    );
                    statements.push(ddl::change_column(declared, current.name(), field));
                }
            }
        }
        previous = Some(field.name());
    }
    statements
}

/// Names of the DDL-relevant attributes that differ between a declared and
/// a live column.
pub fn column_differences(declared: &Field, live: &Field) -> Vec<&'static str> {
    let family = declared.family();
    let mut drift = Vec::new();

    let same_type = declared.data_type().same_as(live.data_type())
        && (!family.supports_unsigned() || effective_unsigned(declared) == effective_unsigned(live))
        && (!family.supports_zerofill() || declared.is_zerofill() == live.is_zerofill());
    if !same_type {
        drift.push("type");
    }
    if !same_length(family, declared.length(), live.length()) {
        drift.push("length");
    }
    if declared.requires_value() != live.requires_value() {
        drift.push("nullability");
    }
    if !same_default(family, key_default(declared), key_default(live)) {
        drift.push("default");
    }
    let auto_increment = declared.is_auto_increment() && family.supports_auto_increment();
    if auto_increment != live.is_auto_increment() {
        drift.push("auto_increment");
    }
    if declared.desc() != live.desc() {
        drift.push("comment");
    }
    drift
}

// zerofill implies unsigned on the server
fn effective_unsigned(field: &Field) -> bool {
    field.is_unsigned() || field.is_zerofill()
}

fn same_length(family: TypeFamily, declared: Option<&str>, live: Option<&str>) -> bool {
    let squash = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    match (declared, live) {
        (None, _) => true,
        // integer display width is dropped by newer servers
        (Some(_), None) => family == TypeFamily::Integer,
        (Some(d), Some(l)) => squash(d) == squash(l),
    }
}

// a primary key never carries a default
fn key_default(field: &Field) -> Option<&str> {
    field.default_value().filter(|_| !field.is_primary_key())
}

fn same_default(family: TypeFamily, declared: Option<&str>, live: Option<&str>) -> bool {
    match (normalize_default(declared), normalize_default(live)) {
        (Some(d), Some(l)) if family.is_numeric_literal() => match (d.parse::<f64>(), l.parse::<f64>()) {
            (Ok(d), Ok(l)) => d == l,
            _ => d == l,
        },
        (d, l) => d == l,
    }
}

fn normalize_default(value: Option<&str>) -> Option<&str> {
    value
        .map(|v| {
            if v.len() >= 2 && v.starts_with('\'') && v.ends_with('\'') {
                &v[1..v.len() - 1]
            } else {
                v
            }
        })
        .filter(|v| !v.is_empty())
}
