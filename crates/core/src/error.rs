//! Field-level error model.

use std::fmt;

use thiserror::Error;

/// Status attached to validation failures by default.
pub const STATUS_UNPROCESSABLE: u16 = 422;

/// Status carried by conflicts surfaced from backend constraints.
pub const STATUS_CONFLICT: u16 = 409;

/// A single rejected field.
///
/// Carries the field name the caller supplied (aggregates key on it), a
/// user-facing message, and the status a transport layer would report.
/// Message strings are a published contract; clients match them verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct FieldError {
    field: String,
    message: String,
    status: u16,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            status: STATUS_UNPROCESSABLE,
        }
    }

    pub fn with_status(
        field: impl Into<String>,
        message: impl Into<String>,
        status: u16,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            status,
        }
    }

    /// Same field and status, different message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> u16 {
        self.status
    }
}

/// Ordered collection of [`FieldError`]s describing one failed operation.
///
/// Validation reports every rejected field in one pass so a caller can fix
/// a submission in a single round trip. The description names the outcome
/// ("Invalid Item", "Conflicting Item"); the status defaults to 422 and is
/// raised to 409 for constraint conflicts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub struct FieldErrorStack {
    description: String,
    status: u16,
    errors: Vec<FieldError>,
}

impl FieldErrorStack {
    pub fn new(description: impl Into<String>) -> Self {
        Self::with_status(description, STATUS_UNPROCESSABLE)
    }

    pub fn with_status(description: impl Into<String>, status: u16) -> Self {
        Self {
            description: description.into(),
            status,
            errors: Vec::new(),
        }
    }

    /// Append one error, keeping insertion order.
    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }
}

impl fmt::Display for FieldErrorStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.description)?;
        if self.errors.is_empty() {
            return write!(f, "empty");
        }
        for (position, error) in self.errors.iter().enumerate() {
            if position > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

/// Caller misuse of a persistence API (not user-correctable input).
///
/// Raised when an operation is invoked against an entity in the wrong
/// state, e.g. updating an entity that was never persisted. Never
/// translated; the message is surfaced verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ContractViolation(String);

impl ContractViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}
