// src/schema/table.rs

use std::collections::HashSet;

use serde::Deserialize;

use super::SchemaError;
use super::field::{Field, FieldSpec};

const DEFAULT_ENGINE: &str = "InnoDB";
const DEFAULT_CHARSET: &str = "utf8";
const DEFAULT_COLLATE: &str = "utf8_general_ci";

/// Index flavours, as rendered before the `KEY` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Primary,
    Unique,
    Fulltext,
    #[default]
    Plain,
}

impl IndexKind {
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Self::Primary => Some("PRIMARY"),
            Self::Unique => Some("UNIQUE"),
            Self::Fulltext => Some("FULLTEXT"),
            Self::Plain => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndexSpec {
    pub name: String,
    pub kind: IndexKind,
    pub columns: Vec<String>,
}

/// A named index over an ordered column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyIndex {
    name: String,
    kind: IndexKind,
    columns: Vec<String>,
}

impl KeyIndex {
    /// Primary keys are always named `PRIMARY`.
    pub fn new(name: impl Into<String>, kind: IndexKind, columns: Vec<String>) -> Result<Self, SchemaError> {
        let name = match kind {
            IndexKind::Primary => "PRIMARY".to_owned(),
            _ => name.into(),
        };
        if name.is_empty() {
            return Err(SchemaError::EmptyIndexName);
        }
        if columns.is_empty() {
            return Err(SchemaError::EmptyIndex(name));
        }
        Ok(Self { name, kind, columns })
    }

    fn from_spec(spec: IndexSpec) -> Result<Self, SchemaError> {
        Self::new(spec.name, spec.kind, spec.columns)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// Decoded table declaration. `engine`, `charset` and `collate` fall back to
/// `InnoDB` / `utf8` / `utf8_general_ci` when unset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TableSpec {
    pub database: Option<String>,
    pub name: String,
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collate: Option<String>,
    pub desc: Option<String>,
    pub auto_increment: u64,
    #[serde(rename = "field")]
    pub fields: Vec<FieldSpec>,
    #[serde(rename = "index")]
    pub indexes: Vec<IndexSpec>,
}

/// A validated table schema. Construction fails unless the table has a
/// name, at least one field, unique field names, at most one
/// auto-increment field and at most one primary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    database: Option<String>,
    name: String,
    engine: String,
    charset: String,
    collate: String,
    desc: Option<String>,
    auto_increment: u64,
    fields: Vec<Field>,
    indexes: Vec<KeyIndex>,
}

impl Table {
    pub fn new(mut spec: TableSpec) -> Result<Self, SchemaError> {
        let fields = std::mem::take(&mut spec.fields)
            .into_iter()
            .map(Field::new)
            .collect::<Result<Vec<_>, _>>()?;
        let indexes = std::mem::take(&mut spec.indexes)
            .into_iter()
            .map(KeyIndex::from_spec)
            .collect::<Result<Vec<_>, _>>()?;
        Self::with_columns(spec, fields, indexes)
    }

    /// Build from already-constructed columns; `spec.fields` and
    /// `spec.indexes` are ignored.
    pub fn with_columns(spec: TableSpec, fields: Vec<Field>, indexes: Vec<KeyIndex>) -> Result<Self, SchemaError> {
        let table = Self {
            database: spec.database.filter(|d| !d.is_empty()),
            name: spec.name.trim().to_owned(),
            engine: or_default(spec.engine, DEFAULT_ENGINE),
            charset: or_default(spec.charset, DEFAULT_CHARSET),
            collate: or_default(spec.collate, DEFAULT_COLLATE),
            desc: spec.desc.filter(|d| !d.is_empty()),
            auto_increment: spec.auto_increment,
            fields,
            indexes,
        };
        table.check()?;
        Ok(table)
    }

    /// Re-run the validity rules.
    pub fn check(&self) -> Result<(), SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::EmptyName);
        }
        if self.fields.is_empty() {
            return Err(SchemaError::NoFields(self.name.clone()));
        }
        // column names are case-insensitive on the server
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name().to_ascii_lowercase()) {
                return Err(SchemaError::DuplicateField(field.name().to_owned()));
            }
        }
        if self.fields.iter().filter(|f| f.is_auto_increment()).count() > 1 {
            return Err(SchemaError::MultipleAutoIncrement(self.name.clone()));
        }
        if self.indexes.iter().filter(|ix| ix.kind() == IndexKind::Primary).count() > 1 {
            return Err(SchemaError::MultiplePrimaryKeys(self.name.clone()));
        }
        for index in &self.indexes {
            if let Some(column) = index.columns().iter().find(|c| !seen.contains(&c.to_ascii_lowercase())) {
                return Err(SchemaError::UnknownIndexColumn {
                    index: index.name().to_owned(),
                    column: column.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn collate(&self) -> &str {
        &self.collate
    }

    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    pub fn auto_increment(&self) -> u64 {
        self.auto_increment
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn indexes(&self) -> &[KeyIndex] {
        &self.indexes
    }

    /// Column by name, ignoring ASCII case.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name().eq_ignore_ascii_case(name))
    }

    /// Columns that appear in an INSERT, in declared order.
    pub fn insert_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.is_auto_increment())
    }

    pub fn has_auto_increment(&self) -> bool {
        self.fields.iter().any(Field::is_auto_increment)
    }
}

fn or_default(value: Option<String>, fallback: &str) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or_else(|| fallback.to_owned())
}
