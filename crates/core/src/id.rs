//! Positive-integer entity keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::validate;

/// A validated backend key: a positive integer within the unsigned 32-bit
/// column domain.
///
/// Deserialization routes through the same validation, so an `Identifier`
/// never holds an out-of-domain value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Identifier(i64);

impl Identifier {
    /// Validate under the default field name `id`.
    pub fn new(value: i64) -> Result<Self, FieldError> {
        Self::for_field(value, "id")
    }

    /// Validate, tagging failures with the caller's field name.
    pub fn for_field(value: i64, field: &str) -> Result<Self, FieldError> {
        validate::int(value, 1, validate::INT_MAX, field).map(Self)
    }

    /// Validate with a caller-supplied failure message. URL parameters and
    /// similar surfaces report their own wording.
    pub fn with_message(value: i64, field: &str, message: &str) -> Result<Self, FieldError> {
        Self::for_field(value, field).map_err(|error| error.with_message(message))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<i64> for Identifier {
    type Error = FieldError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Identifier> for i64 {
    fn from(value: Identifier) -> Self {
        value.0
    }
}
