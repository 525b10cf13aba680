//! Validated names and document identifiers.

use serde_json::Value;
use std::fmt;

use crate::error::{Error, Result};

/// Validated index name.
///
/// Rejecting empty names here keeps malformed paths from ever reaching the
/// engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexName(String);

impl IndexName {
    /// Create an index name; the name must be non-empty.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Validation("index name must not be empty".to_string()));
        }
        Ok(Self(name))
    }

    /// Name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IndexName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for IndexName {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<IndexName> for String {
    fn from(name: IndexName) -> Self {
        name.0
    }
}

/// Validated mapping type name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeName(String);

impl TypeName {
    /// Create a type name; the name must be non-empty.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Validation("type name must not be empty".to_string()));
        }
        Ok(Self(name))
    }

    /// Name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for TypeName {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<TypeName> for String {
    fn from(name: TypeName) -> Self {
        name.0
    }
}

/// Document identifier: a non-empty string or an integer.
///
/// Rendered verbatim into request paths and bulk action metadata, so a
/// numeric id stays a JSON number and a string id stays a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocId {
    /// String identifier.
    Str(String),
    /// Numeric identifier.
    Num(i64),
}

impl DocId {
    /// Create a string identifier; must be non-empty.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::Validation("document id must not be empty".to_string()));
        }
        Ok(Self::Str(id))
    }

    /// Create a numeric identifier.
    pub fn number(id: i64) -> Self {
        Self::Num(id)
    }

    /// The identifier as the JSON value sent in action metadata.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Str(s) => Value::String(s.clone()),
            Self::Num(n) => Value::from(*n),
        }
    }

    /// Read an identifier out of embedded document metadata.
    pub(crate) fn from_meta_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self::Str(s.clone())),
            Value::Number(n) => n.as_i64().map(Self::Num),
            _ => None,
        }
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Num(n) => write!(f, "{n}"),
        }
    }
}

impl From<i64> for DocId {
    fn from(id: i64) -> Self {
        Self::Num(id)
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> Self {
        Self::Num(id.into())
    }
}
