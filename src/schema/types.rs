// src/schema/types.rs

//! Column type vocabulary.
//!
//! Every column type resolves once, at parse time, to a [`DataType`] and its
//! [`TypeFamily`]. All capability checks (may it be `UNSIGNED`? does it take a
//! charset? is it written unquoted in a `VALUES` list?) go through the family.

use std::fmt;

/// Groups of types that share rendering rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    Integer,
    Real,
    Decimal,
    Bit,
    Temporal,
    Text,
    Binary,
    Other,
}

impl TypeFamily {
    pub fn supports_unsigned(self) -> bool {
        matches!(self, Self::Integer | Self::Real | Self::Decimal)
    }

    pub fn supports_zerofill(self) -> bool {
        matches!(self, Self::Integer | Self::Real)
    }

    pub fn supports_auto_increment(self) -> bool {
        matches!(self, Self::Integer | Self::Real)
    }

    pub fn supports_charset(self) -> bool {
        matches!(self, Self::Text)
    }

    /// Values of this family are written without quotes.
    pub fn is_numeric_literal(self) -> bool {
        matches!(self, Self::Integer | Self::Real | Self::Decimal | Self::Bit)
    }
}

/// MySQL column types understood by the daemon.
///
/// `Other` keeps whatever the server reported for types outside the list;
/// it has no capabilities and its values are always quoted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Bit,
    TinyInt,
    SmallInt,
    MediumInt,
    Int,
    Integer,
    BigInt,
    Float,
    Double,
    Decimal,
    Date,
    Time,
    Year,
    DateTime,
    Timestamp,
    Char,
    VarChar,
    TinyBlob,
    TinyText,
    Blob,
    Text,
    MediumBlob,
    MediumText,
    LongBlob,
    LongText,
    Other(String),
}

impl DataType {
    /// Case-insensitive lookup; unknown names become `Other` (upper-cased).
    pub fn from_name(name: &str) -> Self {
        let upper = name.trim().to_ascii_uppercase();
        match upper.as_str() {
            "BIT" => Self::Bit,
            "TINYINT" => Self::TinyInt,
            "SMALLINT" => Self::SmallInt,
            "MEDIUMINT" => Self::MediumInt,
            "INT" => Self::Int,
            "INTEGER" => Self::Integer,
            "BIGINT" => Self::BigInt,
            "FLOAT" => Self::Float,
            "DOUBLE" => Self::Double,
            "DECIMAL" => Self::Decimal,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "YEAR" => Self::Year,
            "DATETIME" => Self::DateTime,
            "TIMESTAMP" => Self::Timestamp,
            "CHAR" => Self::Char,
            "VARCHAR" => Self::VarChar,
            "TINYBLOB" => Self::TinyBlob,
            "TINYTEXT" => Self::TinyText,
            "BLOB" => Self::Blob,
            "TEXT" => Self::Text,
            "MEDIUMBLOB" => Self::MediumBlob,
            "MEDIUMTEXT" => Self::MediumText,
            "LONGBLOB" => Self::LongBlob,
            "LONGTEXT" => Self::LongText,
            _ => Self::Other(upper),
        }
    }

    /// Upper-case SQL keyword.
    pub fn name(&self) -> &str {
        match self {
            Self::Bit => "BIT",
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::MediumInt => "MEDIUMINT",
            Self::Int => "INT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Decimal => "DECIMAL",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Year => "YEAR",
            Self::DateTime => "DATETIME",
            Self::Timestamp => "TIMESTAMP",
            Self::Char => "CHAR",
            Self::VarChar => "VARCHAR",
            Self::TinyBlob => "TINYBLOB",
            Self::TinyText => "TINYTEXT",
            Self::Blob => "BLOB",
            Self::Text => "TEXT",
            Self::MediumBlob => "MEDIUMBLOB",
            Self::MediumText => "MEDIUMTEXT",
            Self::LongBlob => "LONGBLOB",
            Self::LongText => "LONGTEXT",
            Self::Other(name) => name,
        }
    }

    pub fn family(&self) -> TypeFamily {
        match self {
            Self::TinyInt | Self::SmallInt | Self::MediumInt | Self::Int | Self::Integer | Self::BigInt => {
                TypeFamily::Integer
            }
            Self::Float | Self::Double => TypeFamily::Real,
            Self::Decimal => TypeFamily::Decimal,
            Self::Bit => TypeFamily::Bit,
            Self::Date | Self::Time | Self::Year | Self::DateTime | Self::Timestamp => TypeFamily::Temporal,
            Self::Char | Self::VarChar | Self::TinyText | Self::Text | Self::MediumText | Self::LongText => {
                TypeFamily::Text
            }
            Self::TinyBlob | Self::Blob | Self::MediumBlob | Self::LongBlob => TypeFamily::Binary,
            Self::Other(_) => TypeFamily::Other,
        }
    }

    /// `INTEGER` is a synonym the server reports back as `int`.
    pub fn same_as(&self, other: &DataType) -> bool {
        self.canonical() == other.canonical()
    }

    fn canonical(&self) -> &DataType {
        match self {
            Self::Integer => &Self::Int,
            other => other,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
