// src/sql/ddl.rs

//! CREATE / ALTER rendering.
//!
//! ```text
//! CREATE TABLE IF NOT EXISTS `login` (
//!   `id` BIGINT(20) UNSIGNED NOT NULL AUTO_INCREMENT,
//!   `name` VARCHAR(20) CHARSET utf8 COLLATE utf8_general_ci NULL DEFAULT '' COMMENT 'nick',
//!   PRIMARY KEY (`id`),
//!   UNIQUE KEY `uniq_name` (`name`)
//! ) ENGINE=InnoDB CHARSET=utf8 COLLATE=utf8_general_ci;
//! ```

use super::{qualified_name, quote_ident};
use crate::schema::{Field, IndexKind, KeyIndex, Table};

/// Full column clause, e.g. `` `uid` INT(10) UNSIGNED NOT NULL COMMENT 'user' ``.
/// Modifiers the column's type family does not support are left out.
pub fn column_definition(field: &Field) -> String {
    let family = field.family();
    let mut parts = vec![quote_ident(field.name()), type_clause(field)];

    if field.is_unsigned() && family.supports_unsigned() {
        parts.push("UNSIGNED".into());
    }
    if field.is_zerofill() && family.supports_zerofill() {
        parts.push("ZEROFILL".into());
    }
    if family.supports_charset() {
        if let Some(charset) = field.charset() {
            parts.push(format!("CHARSET {charset}"));
        }
        if let Some(collate) = field.collate() {
            parts.push(format!("COLLATE {collate}"));
        }
    }
    parts.push(if field.requires_value() { "NOT NULL" } else { "NULL" }.into());
    if field.is_auto_increment() && family.supports_auto_increment() {
        parts.push("AUTO_INCREMENT".into());
    }
    if let Some(default) = field.default_value().filter(|_| !field.is_primary_key()) {
        parts.push(format!("DEFAULT {default}"));
    }
    if let Some(desc) = field.desc() {
        parts.push(format!("COMMENT '{desc}'"));
    }
    parts.join(" ")
}

fn type_clause(field: &Field) -> String {
    match field.length() {
        Some(len) => format!("{}({len})", field.data_type().name()),
        None => field.data_type().name().to_owned(),
    }
}

/// `PRIMARY KEY (`a`)`, `UNIQUE KEY `n` (`a`,`b`)`, `KEY `n` (`a`)`.
pub fn index_clause(index: &KeyIndex) -> String {
    let columns = index.columns().iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(",");
    match index.kind() {
        IndexKind::Primary => format!("PRIMARY KEY ({columns})"),
        kind => {
            let prefix = kind.keyword().map(|k| format!("{k} ")).unwrap_or_default();
            format!("{prefix}KEY {} ({columns})", quote_ident(index.name()))
        }
    }
}

/// Trailing table options; each is emitted only when set.
pub fn table_attributes(table: &Table) -> String {
    let mut out = String::new();
    for (key, value) in [("ENGINE", table.engine()), ("CHARSET", table.charset()), ("COLLATE", table.collate())] {
        if !value.is_empty() {
            out.push_str(&format!(" {key}={value}"));
        }
    }
    if table.auto_increment() > 0 {
        out.push_str(&format!(" AUTO_INCREMENT={}", table.auto_increment()));
    }
    if let Some(desc) = table.desc() {
        out.push_str(&format!(" COMMENT='{desc}'"));
    }
    out
}

pub fn create_table(table: &Table) -> String {
    let clauses: Vec<String> = table
        .fields()
        .iter()
        .map(column_definition)
        .chain(table.indexes().iter().map(index_clause))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n){};",
        qualified_name(table.database(), table.name()),
        clauses.join(",\n  "),
        table_attributes(table)
    )
}

/// `ADD COLUMN ... AFTER `prev``, or `FIRST` when there is no predecessor.
pub fn add_column(table: &Table, field: &Field, after: Option<&str>) -> String {
    let position = match after {
        Some(prev) => format!("AFTER {}", quote_ident(prev)),
        None => "FIRST".to_owned(),
    };
    format!(
        "ALTER TABLE {} ADD COLUMN {} {position};",
        qualified_name(table.database(), table.name()),
        column_definition(field)
    )
}

pub fn change_column(table: &Table, old_name: &str, field: &Field) -> String {
    format!(
        "ALTER TABLE {} CHANGE COLUMN {} {};",
        qualified_name(table.database(), table.name()),
        quote_ident(old_name),
        column_definition(field)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, IndexSpec, TableSpec};

    fn field(spec: FieldSpec) -> Field {
        Field::new(spec).unwrap()
    }

    fn named(name: &str, ty: &str) -> FieldSpec {
        FieldSpec { name: name.into(), data_type: ty.into(), ..FieldSpec::default() }
    }

    #[test]
    fn column_definition_gates_modifiers_by_family() {
        let id = field(FieldSpec {
            length: Some("20".into()),
            unsigned: true,
            zerofill: true,
            primary_key: true,
            auto_increment: true,
            default: Some("0".into()),
            ..named("id", "bigint")
        });
        assert_eq!(column_definition(&id), "`id` BIGINT(20) UNSIGNED ZEROFILL NOT NULL AUTO_INCREMENT");

        let name = field(FieldSpec {
            length: Some("20".into()),
            unsigned: true,
            charset: Some("utf8".into()),
            collate: Some("utf8_general_ci".into()),
            default: Some("''".into()),
            desc: Some("nick".into()),
            ..named("name", "varchar")
        });
        assert_eq!(
            column_definition(&name),
            "`name` VARCHAR(20) CHARSET utf8 COLLATE utf8_general_ci NULL DEFAULT '' COMMENT 'nick'"
        );

        let blob = field(FieldSpec {
            charset: Some("utf8".into()),
            auto_increment: true,
            not_null: true,
            ..named("data", "blob")
        });
        assert_eq!(column_definition(&blob), "`data` BLOB NOT NULL");
    }

    #[test]
    fn index_clauses() {
        let cols = |c: &[&str]| c.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let primary = KeyIndex::new("", IndexKind::Primary, cols(&["id"])).unwrap();
        let unique = KeyIndex::new("uniq", IndexKind::Unique, cols(&["a", "b"])).unwrap();
        let fulltext = KeyIndex::new("ft", IndexKind::Fulltext, cols(&["note"])).unwrap();
        let plain = KeyIndex::new("k", IndexKind::Plain, cols(&["a"])).unwrap();

        assert_eq!(index_clause(&primary), "PRIMARY KEY (`id`)");
        assert_eq!(index_clause(&unique), "UNIQUE KEY `uniq` (`a`,`b`)");
        assert_eq!(index_clause(&fulltext), "FULLTEXT KEY `ft` (`note`)");
        assert_eq!(index_clause(&plain), "KEY `k` (`a`)");
    }

    fn login() -> Table {
        Table::new(TableSpec {
            database: Some("okra".into()),
            name: "login".into(),
            desc: Some("login log".into()),
            auto_increment: 100,
            fields: vec![
                FieldSpec { primary_key: true, auto_increment: true, ..named("id", "bigint") },
                FieldSpec { not_null: true, ..named("uid", "int") },
            ],
            indexes: vec![IndexSpec { kind: IndexKind::Primary, columns: vec!["id".into()], ..IndexSpec::default() }],
            ..TableSpec::default()
        })
        .unwrap()
    }

    #[test]
    fn create_table_lists_columns_indexes_and_attributes() {
        assert_eq!(
            create_table(&login()),
            "CREATE TABLE IF NOT EXISTS `okra`.`login` (\n  \
             `id` BIGINT NOT NULL AUTO_INCREMENT,\n  \
             `uid` INT NOT NULL,\n  \
             PRIMARY KEY (`id`)\n\
             ) ENGINE=InnoDB CHARSET=utf8 COLLATE=utf8_general_ci AUTO_INCREMENT=100 COMMENT='login log';"
        );
    }

    #[test]
    fn alter_statements() {
        let table = login();
        let note = field(named("note", "text"));
        assert_eq!(
            add_column(&table, &note, Some("uid")),
            "ALTER TABLE `okra`.`login` ADD COLUMN `note` TEXT NULL AFTER `uid`;"
        );
        assert_eq!(add_column(&table, &note, None), "ALTER TABLE `okra`.`login` ADD COLUMN `note` TEXT NULL FIRST;");
        assert_eq!(
            change_column(&table, "note", &note),
            "ALTER TABLE `okra`.`login` CHANGE COLUMN `note` `note` TEXT NULL;"
        );
    }
}
