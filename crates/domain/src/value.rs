//! Typed local values held by materialized variables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single typed local value.
///
/// Serialized untagged so a JSON `true`, `21.5` or `"playing"` maps directly
/// onto the matching variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// The kind of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Boolean,
            Self::Number(_) => ValueKind::Numeric,
            Self::Text(_) => ValueKind::Text,
        }
    }
}

/// Plain text representation, as sent on command topics.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => b.fmt(f),
            Self::Number(n) => n.fmt(f),
            Self::Text(t) => f.write_str(t),
        }
    }
}

/// The type a local variable is declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Boolean,
    Numeric,
    Text,
}

impl ValueKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Numeric => "numeric",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`ValueKind`] name.
#[derive(Debug, thiserror::Error)]
#[error("unknown value kind {0:?}")]
pub struct UnknownValueKind(pub String);

impl FromStr for ValueKind {
    type Err = UnknownValueKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boolean" => Ok(Self::Boolean),
            "numeric" => Ok(Self::Numeric),
            "text" => Ok(Self::Text),
            other => Err(UnknownValueKind(other.to_string())),
        }
    }
}
