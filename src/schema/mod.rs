//! Table schema model: column types, fields, indexes, tables, and the
//! parsers that rebuild them from live introspection rows.

pub mod field;
pub mod introspect;
pub mod table;
pub mod types;

use thiserror::Error;

pub use field::{Field, FieldSpec};
pub use table::{IndexKind, IndexSpec, KeyIndex, Table, TableSpec};
pub use types::{DataType, TypeFamily};

/// Reasons a field, index or table declaration is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("table has no name")]
    EmptyName,

    #[error("table '{0}' declares no fields")]
    NoFields(String),

    #[error("field has no name")]
    EmptyFieldName,

    #[error("field '{0}' has no type")]
    MissingType(String),

    #[error("field '{0}' is declared twice")]
    DuplicateField(String),

    #[error("table '{0}' has more than one auto-increment field")]
    MultipleAutoIncrement(String),

    #[error("table '{0}' has more than one primary key")]
    MultiplePrimaryKeys(String),

    #[error("index has no name")]
    EmptyIndexName,

    #[error("index '{0}' has no columns")]
    EmptyIndex(String),

    #[error("index '{index}' references unknown column '{column}'")]
    UnknownIndexColumn { index: String, column: String },
}
