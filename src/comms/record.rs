// src/comms/record.rs

//! Wire format of one log record:
//!
//! ```text
//! <category><sep><v1><sep>...<sep><vN>
//! login|1001|Alice
//! ```

use std::str::Utf8Error;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("datagram is not UTF-8: {0}")]
    NotUtf8(#[from] Utf8Error),

    #[error("empty datagram")]
    Empty,

    #[error("record has no category")]
    MissingCategory,
}

/// One ingested record: a category key and its ordered text values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    category: String,
    values: Vec<String>,
}

impl RawRecord {
    pub fn new(category: impl Into<String>, values: Vec<String>) -> Self {
        Self { category: category.into(), values }
    }

    /// Split a datagram on `separator`. A trailing line break is ignored;
    /// a trailing separator yields a final empty value.
    pub fn decode(datagram: &[u8], separator: char) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(datagram)?.trim_end_matches(['\r', '\n']);
        if text.is_empty() {
            return Err(DecodeError::Empty);
        }
        let mut parts = text.split(separator);
        let category = parts.next().unwrap_or_default();
        if category.is_empty() {
            return Err(DecodeError::MissingCategory);
        }
        Ok(Self::new(category, parts.map(str::to_owned).collect()))
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}
