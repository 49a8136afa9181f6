// src/schema/introspect.rs

//! Rebuilds a [`Table`] from what the server reports about it.
//!
//! Three statements are issued per table: `SHOW TABLE STATUS`,
//! `SHOW FULL FIELDS` and `SHOW INDEX`. A field row looks like:
//!
//! ```text
//! Field|Type            |Collation      |Null|Key|Default|Extra         |Comment
//! uid  |int(10) unsigned|NULL           |NO  |PRI|NULL   |auto_increment|
//! name |varchar(20)     |utf8_general_ci|NO  |   |       |              |
//! ```

use thiserror::Error;

use super::field::{Field, FieldSpec};
use super::table::{IndexKind, KeyIndex, Table, TableSpec};
use super::types::DataType;
use super::SchemaError;
use crate::db::{Database, DbError, Row};
use crate::sql::show;

#[derive(Debug, Error)]
pub enum IntrospectError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("introspection row is missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("column '{column}' holds non-numeric value '{value}'")]
    NotANumber { column: &'static str, value: String },

    #[error("live schema rejected: {0}")]
    Schema(#[from] SchemaError),
}

/// Result of parsing a reported column type such as `bigint(20) unsigned`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    pub data_type: DataType,
    pub length: Option<String>,
    pub unsigned: bool,
    pub zerofill: bool,
}

/// Parse a column type string as reported by `SHOW FULL FIELDS`.
pub fn parse_column_type(raw: &str) -> ColumnType {
    let raw = raw.trim();
    let mut base = "";
    let mut length = None;
    let mut unsigned = false;
    let mut zerofill = false;

    match raw.find('(') {
        Some(open) if raw.ends_with(')') => {
            base = &raw[..open];
            length = Some(raw[open + 1..raw.len() - 1].to_owned());
        }
        Some(_) => {
            for token in raw.split(' ').filter(|t| !t.is_empty()) {
                match token.to_ascii_lowercase().as_str() {
                    "unsigned" => unsigned = true,
                    "zerofill" => zerofill = true,
                    _ if token.ends_with(')') => match token.split_once('(') {
                        Some((ty, rest)) => {
                            base = ty;
                            length = Some(rest[..rest.len() - 1].to_owned());
                        }
                        None => base = token,
                    },
                    _ => base = token,
                }
            }
        }
        // newer servers report `int unsigned` without a display width
        None => {
            for token in raw.split_whitespace() {
                match token.to_ascii_lowercase().as_str() {
                    "unsigned" => unsigned = true,
                    "zerofill" => zerofill = true,
                    _ => base = token,
                }
            }
        }
    }

    ColumnType {
        data_type: DataType::from_name(base),
        length: length.filter(|l| !l.is_empty()),
        unsigned,
        zerofill,
    }
}

/// Build a [`Field`] from one `SHOW FULL FIELDS` row.
pub fn field_from_row(row: &Row) -> Result<Field, IntrospectError> {
    let name = require(row, "Field")?;
    let column_type = parse_column_type(require(row, "Type")?);
    let extra = row.get("Extra").unwrap_or_default();

    let field = Field::new(FieldSpec {
        name: name.to_owned(),
        data_type: column_type.data_type.name().to_owned(),
        length: column_type.length,
        unsigned: column_type.unsigned,
        zerofill: column_type.zerofill,
        charset: None,
        collate: row.get("Collation").map(str::to_owned),
        not_null: row.get("Null").is_some_and(|n| n.eq_ignore_ascii_case("NO")),
        primary_key: row.get("Key").is_some_and(|k| k.eq_ignore_ascii_case("PRI")),
        auto_increment: extra.to_ascii_lowercase().contains("auto_increment"),
        default: row.get("Default").map(str::to_owned),
        desc: row.get("Comment").map(str::to_owned),
    })?;
    Ok(field)
}

/// One `SHOW INDEX` row, reduced to what grouping needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub key_name: String,
    pub seq_in_index: usize,
    pub column_name: String,
    pub index_type: String,
    pub non_unique: bool,
}

impl IndexRow {
    pub fn from_row(row: &Row) -> Result<Self, IntrospectError> {
        let seq = require(row, "Seq_in_index")?;
        let non_unique = row.get("Non_unique").unwrap_or("1");
        Ok(Self {
            key_name: require(row, "Key_name")?.to_owned(),
            seq_in_index: seq
                .parse()
                .map_err(|_| IntrospectError::NotANumber { column: "Seq_in_index", value: seq.to_owned() })?,
            column_name: require(row, "Column_name")?.to_owned(),
            index_type: row.get("Index_type").unwrap_or_default().to_owned(),
            non_unique: non_unique != "0",
        })
    }

    fn kind(&self) -> IndexKind {
        if self.key_name == "PRIMARY" {
            IndexKind::Primary
        } else if self.index_type.eq_ignore_ascii_case("FULLTEXT") {
            IndexKind::Fulltext
        } else if !self.non_unique {
            IndexKind::Unique
        } else {
            IndexKind::Plain
        }
    }
}

struct IndexGroup {
    name: String,
    kind: IndexKind,
    members: Vec<(usize, String)>,
}

/// Fold index rows into one [`KeyIndex`] per index name. Groups keep the
/// order in which their names first appear; columns are ordered by their
/// position in the index.
pub fn group_indexes<I>(rows: I) -> Result<Vec<KeyIndex>, SchemaError>
where
    I: IntoIterator<Item = IndexRow>,
{
    let groups = rows.into_iter().fold(Vec::<IndexGroup>::new(), |mut groups, row| {
        let member = (row.seq_in_index, row.column_name.clone());
        match groups.iter_mut().find(|g| g.name == row.key_name) {
            Some(group) => group.members.push(member),
            None => groups.push(IndexGroup { kind: row.kind(), name: row.key_name, members: vec![member] }),
        }
        groups
    });

    groups
        .into_iter()
        .map(|mut group| {
            group.members.sort_by_key(|(seq, _)| *seq);
            let columns = group.members.into_iter().map(|(_, column)| column).collect();
            KeyIndex::new(group.name, group.kind, columns)
        })
        .collect()
}

/// Read the live schema of `name`, or `None` when the table does not exist.
pub async fn fetch_table(
    db: &dyn Database,
    database: Option<&str>,
    name: &str,
) -> Result<Option<Table>, IntrospectError> {
    // LIKE treats `_` as a wildcard, so keep only the exact match
    let status_rows = db.query(&show::table_status(database, name)).await?;
    let Some(status) = status_rows
        .iter()
        .find(|r| r.get("Name").is_some_and(|n| n.eq_ignore_ascii_case(name)))
    else {
        return Ok(None);
    };

    let auto_increment = match status.get("Auto_increment") {
        Some(v) if !v.is_empty() => v
            .parse()
            .map_err(|_| IntrospectError::NotANumber { column: "Auto_increment", value: v.to_owned() })?,
        _ => 0,
    };
    let header = TableSpec {
        database: database.map(str::to_owned),
        name: name.to_owned(),
        engine: status.get("Engine").map(str::to_owned),
        collate: status.get("Collation").map(str::to_owned),
        desc: status.get("Comment").map(str::to_owned),
        auto_increment,
        ..TableSpec::default()
    };

    let fields = db
        .query(&show::full_fields(database, name))
        .await?
        .iter()
        .map(field_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    let index_rows = db
        .query(&show::index(database, name))
        .await?
        .iter()
        .map(IndexRow::from_row)
        .collect::<Result<Vec<_>, _>>()?;
    let indexes = group_indexes(index_rows)?;

    Ok(Some(Table::with_columns(header, fields, indexes)?))
}

fn require<'r>(row: &'r Row, column: &'static str) -> Result<&'r str, IntrospectError> {
    row.get(column).ok_or(IntrospectError::MissingColumn(column))
}
