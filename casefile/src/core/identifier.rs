//! Opaque record identifiers and the deployment's identifier policy.
//!
//! The core never cares whether identifiers are sequence numbers or random
//! tokens. It only asks two questions of the active [`IdentifierPolicy`]:
//! "is this token well-formed?" and "do these two tokens name the same record?".
//! Generation is owned by the persistence collaborator.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::core::error::RecordError;

/// Opaque identifier of a stored record.
///
/// Canonical unsigned integers travel as JSON numbers; every other token
/// travels as a JSON string. Both forms are accepted when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value when the token is a canonical unsigned integer.
    pub fn as_number(&self) -> Option<u64> {
        if self.0.is_empty() || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if self.0.len() > 1 && self.0.starts_with('0') {
            return None;
        }
        self.0.parse().ok()
    }

    /// Read an identifier token out of a JSON payload value.
    ///
    /// Strings are taken verbatim (trimmed); non-negative integers are
    /// converted to their decimal form. Anything else has no token.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(token) => Some(Self::new(token.trim())),
            Value::Number(number) => number.as_u64().map(|n| Self::new(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<Uuid> for RecordId {
    fn from(value: Uuid) -> Self {
        Self(value.hyphenated().to_string())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_number() {
            Some(number) => serializer.serialize_u64(number),
            None => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RecordId::from_json(&value).ok_or_else(|| {
            serde::de::Error::custom("identifier must be a string or an unsigned integer")
        })
    }
}

/// Identifier strategy in effect for a deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierPolicy {
    /// Server-assigned sequence numbers starting at 1.
    #[default]
    Sequential,
    /// Randomly generated 128-bit tokens (hyphenated UUID text).
    Random,
}

impl IdentifierPolicy {
    pub fn is_valid_format(self, token: &str) -> bool {
        match self {
            IdentifierPolicy::Sequential => parse_sequence(token).is_some(),
            IdentifierPolicy::Random => parse_token(token).is_some(),
        }
    }

    /// True when both tokens are well-formed and name the same record.
    pub fn same(self, left: &RecordId, right: &RecordId) -> bool {
        match self {
            IdentifierPolicy::Sequential => {
                match (parse_sequence(&left.0), parse_sequence(&right.0)) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            IdentifierPolicy::Random => match (parse_token(&left.0), parse_token(&right.0)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Position of `id` in the sequence, whatever its spelling (`"01"` is 1).
    ///
    /// Always `None` under [`IdentifierPolicy::Random`].
    pub fn sequence_number(self, id: &RecordId) -> Option<u64> {
        match self {
            IdentifierPolicy::Sequential => parse_sequence(&id.0),
            IdentifierPolicy::Random => None,
        }
    }

    /// Format-check a caller-supplied token.
    ///
    /// Sequence numbers come back in canonical decimal form (`"007"` becomes `"7"`).
    pub fn parse(self, token: &str) -> Result<RecordId, RecordError> {
        let token = token.trim();
        let parsed = match self {
            IdentifierPolicy::Sequential => parse_sequence(token).map(RecordId::from),
            IdentifierPolicy::Random => parse_token(token).map(|_| RecordId::new(token)),
        };
        parsed.ok_or_else(|| RecordError::InvalidIdentifierFormat {
            token: token.to_string(),
        })
    }
}

/// Base-10 integer > 0. Signs, exponents and fractions are rejected.
fn parse_sequence(token: &str) -> Option<u64> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse::<u64>().ok().filter(|n| *n > 0)
}

fn parse_token(token: &str) -> Option<Uuid> {
    // Only the hyphenated 36-char form; Uuid::parse_str also takes simple/braced/urn.
    if token.len() != 36 {
        return None;
    }
    Uuid::parse_str(token).ok()
}
