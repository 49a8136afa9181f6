// src/schema/field.rs

use serde::Deserialize;

use super::SchemaError;
use super::types::{DataType, TypeFamily};

/// Decoded column declaration, as read from the missions file.
/// Every attribute except `name` and `type` is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub length: Option<String>,
    pub unsigned: bool,
    pub zerofill: bool,
    pub charset: Option<String>,
    pub collate: Option<String>,
    pub not_null: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub default: Option<String>,
    pub desc: Option<String>,
}

/// One validated table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    data_type: DataType,
    length: Option<String>,
    unsigned: bool,
    zerofill: bool,
    charset: Option<String>,
    collate: Option<String>,
    not_null: bool,
    primary_key: bool,
    auto_increment: bool,
    default: Option<String>,
    desc: Option<String>,
}

impl Field {
    pub fn new(spec: FieldSpec) -> Result<Self, SchemaError> {
        let name = spec.name.trim().to_owned();
        if name.is_empty() {
            return Err(SchemaError::EmptyFieldName);
        }
        if spec.data_type.trim().is_empty() {
            return Err(SchemaError::MissingType(name));
        }
        Ok(Self {
            data_type: DataType::from_name(&spec.data_type),
            length: non_empty(spec.length),
            unsigned: spec.unsigned,
            zerofill: spec.zerofill,
            charset: non_empty(spec.charset),
            collate: non_empty(spec.collate),
            not_null: spec.not_null,
            primary_key: spec.primary_key,
            auto_increment: spec.auto_increment,
            default: non_empty(spec.default),
            desc: non_empty(spec.desc),
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn family(&self) -> TypeFamily {
        self.data_type.family()
    }

    pub fn length(&self) -> Option<&str> {
        self.length.as_deref()
    }

    pub fn is_unsigned(&self) -> bool {
        self.unsigned
    }

    pub fn is_zerofill(&self) -> bool {
        self.zerofill
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    pub fn collate(&self) -> Option<&str> {
        self.collate.as_deref()
    }

    pub fn is_not_null(&self) -> bool {
        self.not_null
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    /// Primary keys are always rendered `NOT NULL`.
    pub fn requires_value(&self) -> bool {
        self.primary_key || self.not_null
    }

    /// Type as the server reports it in `SHOW FULL FIELDS`, e.g.
    /// `int(10) unsigned zerofill`.
    pub fn column_type(&self) -> String {
        let mut out = self.data_type.name().to_ascii_lowercase();
        if let Some(len) = &self.length {
            out.push('(');
            out.push_str(len);
            out.push(')');
        }
        if self.unsigned && self.family().supports_unsigned() {
            out.push_str(" unsigned");
        }
        if self.zerofill && self.family().supports_zerofill() {
            out.push_str(" zerofill");
        }
        out
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
