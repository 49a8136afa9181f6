//! Introspection statements.

use super::qualified_name;

/// `SHOW TABLE STATUS [FROM `db`] LIKE 'name';`
pub fn table_status(database: Option<&str>, table: &str) -> String {
    match database {
        Some(db) => format!("SHOW TABLE STATUS FROM `{db}` LIKE '{table}';"),
        None => format!("SHOW TABLE STATUS LIKE '{table}';"),
    }
}

pub fn full_fields(database: Option<&str>, table: &str) -> String {
    format!("SHOW FULL FIELDS FROM {};", qualified_name(database, table))
}

pub fn index(database: Option<&str>, table: &str) -> String {
    format!("SHOW INDEX FROM {};", qualified_name(database, table))
}
