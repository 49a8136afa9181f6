//! SQL text generation. Everything here is a pure function of its inputs.

pub mod ddl;
pub mod dml;
pub mod show;

use thiserror::Error;

/// Why a record could not be rendered into an INSERT.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("record category '{got}' does not match table '{expected}'")]
    CategoryMismatch { expected: String, got: String },

    #[error("table '{table}' expects {expected} value(s) ({compact} without the auto-increment column), got {got}")]
    FieldCount { table: String, expected: usize, compact: usize, got: usize },

    #[error("table '{0}' has no insertable columns")]
    NoColumns(String),
}

/// Backtick-quote an identifier.
pub fn quote_ident(name: &str) -> String {
    format!("`{name}`")
}

/// `` `db`.`table` `` or `` `table` ``.
pub fn qualified_name(database: Option<&str>, table: &str) -> String {
    match database {
        Some(db) => format!("{}.{}", quote_ident(db), quote_ident(table)),
        None => quote_ident(table),
    }
}
