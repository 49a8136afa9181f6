// src/sql/dml.rs

//! INSERT rendering.
//!
//! Two paths exist. [`insert_prepared`] + [`insert_params`] bind values and
//! are safe for arbitrary input. [`insert_literal`] inlines the values into
//! the statement text; it does not escape embedded quotes.
//!
//! Both resolve each cell the same way. A raw value that is empty or `NULL`
//! (any case) falls back to the column default, then to an empty literal
//! (`0` / `''`) for NOT NULL columns, then to SQL `NULL`.

use super::{qualified_name, quote_ident, RenderError};
use crate::comms::record::RawRecord;
use crate::schema::{Field, Table};

/// Resolved content of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell<'a> {
    Value(&'a str),
    Default(&'a str),
    Empty,
    Null,
}

fn resolve<'a>(field: &'a Field, raw: &'a str) -> Cell<'a> {
    if !raw.is_empty() && !raw.eq_ignore_ascii_case("NULL") {
        Cell::Value(raw)
    } else if let Some(default) = field.default_value() {
        Cell::Default(default)
    } else if field.requires_value() {
        Cell::Empty
    } else {
        Cell::Null
    }
}

fn is_quoted(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'')
}

fn literal(field: &Field, cell: Cell<'_>) -> String {
    let numeric = field.family().is_numeric_literal();
    match cell {
        Cell::Value(v) if numeric => v.to_owned(),
        Cell::Value(v) => format!("'{v}'"),
        // defaults are SQL text; an already-quoted one is used as written
        Cell::Default(d) if numeric || is_quoted(d) => d.to_owned(),
        Cell::Default(d) => format!("'{d}'"),
        Cell::Empty if numeric => "0".to_owned(),
        Cell::Empty => "''".to_owned(),
        Cell::Null => "NULL".to_owned(),
    }
}

fn param(field: &Field, cell: Cell<'_>) -> Option<String> {
    match cell {
        Cell::Value(v) => Some(v.to_owned()),
        Cell::Default(d) if is_quoted(d) => Some(d[1..d.len() - 1].to_owned()),
        Cell::Default(d) => Some(d.to_owned()),
        Cell::Empty if field.family().is_numeric_literal() => Some("0".to_owned()),
        Cell::Empty => Some(String::new()),
        Cell::Null => None,
    }
}

/// Whether `count` values fit the table: either one per column (the
/// auto-increment slot present and ignored) or one per insertable column.
pub fn accepts_value_count(table: &Table, count: usize) -> bool {
    count == table.fields().len() || count == table.insert_fields().count()
}

/// Pair each insertable column with its raw value.
fn bind<'r>(table: &'r Table, record: &'r RawRecord) -> Result<Vec<(&'r Field, &'r str)>, RenderError> {
    if record.category() != table.name() {
        return Err(RenderError::CategoryMismatch {
            expected: table.name().to_owned(),
            got: record.category().to_owned(),
        });
    }
    let values = record.values();
    let total = table.fields().len();
    let compact = table.insert_fields().count();
    if compact == 0 {
        return Err(RenderError::NoColumns(table.name().to_owned()));
    }

    let pairs: Vec<(&Field, &str)> = if values.len() == total {
        table
            .fields()
            .iter()
            .zip(values)
            .filter(|(f, _)| !f.is_auto_increment())
            .map(|(f, v)| (f, v.as_str()))
            .collect()
    } else if values.len() == compact {
        table.insert_fields().zip(values).map(|(f, v)| (f, v.as_str())).collect()
    } else {
        return Err(RenderError::FieldCount {
            table: table.name().to_owned(),
            expected: total,
            compact,
            got: values.len(),
        });
    };
    Ok(pairs)
}

fn column_list(table: &Table) -> String {
    table.insert_fields().map(|f| quote_ident(f.name())).collect::<Vec<_>>().join(",")
}

/// `INSERT INTO `t` (`a`,`b`) VALUES (?,?);` without the auto-increment column.
pub fn insert_prepared(table: &Table) -> String {
    let placeholders = vec!["?"; table.insert_fields().count()].join(",");
    format!(
        "INSERT INTO {} ({}) VALUES ({placeholders});",
        qualified_name(table.database(), table.name()),
        column_list(table)
    )
}

/// Bind values for [`insert_prepared`]; `None` binds SQL NULL.
pub fn insert_params(table: &Table, record: &RawRecord) -> Result<Vec<Option<String>>, RenderError> {
    Ok(bind(table, record)?
        .into_iter()
        .map(|(field, raw)| param(field, resolve(field, raw)))
        .collect())
}

/// Render `record` as a self-contained INSERT statement.
pub fn insert_literal(table: &Table, record: &RawRecord) -> Result<String, RenderError> {
    let values = bind(table, record)?
        .into_iter()
        .map(|(field, raw)| literal(field, resolve(field, raw)))
        .collect::<Vec<_>>()
        .join(",");
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({values});",
        qualified_name(table.database(), table.name()),
        column_list(table)
    ))
}
