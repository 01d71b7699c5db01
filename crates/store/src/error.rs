//! Store-level error taxonomy and backend signal translation.
//!
//! Backend errors never cross the repository boundary raw: known
//! constraint signals become [`StoreError::Conflict`] stacks a client can
//! render field by field, unknown ones pass through as
//! [`StoreError::Backend`]. There is deliberately no blanket
//! `From<BackendError>`; every crossing goes through
//! [`StoreError::from_backend`].

use thiserror::Error;

use wares_core::{ContractViolation, FieldError, FieldErrorStack, STATUS_CONFLICT};

use crate::backend::BackendError;
use crate::statement::{CATEGORY_FK_CONSTRAINT, CODE_UNIQUE_CONSTRAINT};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The entity rejected its own state, usually while rebuilding from a
    /// fetched row.
    #[error(transparent)]
    Invalid(#[from] FieldErrorStack),

    /// A backend constraint rejection translated into field conflicts.
    #[error(transparent)]
    Conflict(FieldErrorStack),

    /// The caller misused the repository API.
    #[error(transparent)]
    Contract(#[from] ContractViolation),

    /// A row that must exist after a successful write was missing.
    #[error("{0}")]
    Inconsistent(String),

    /// Unrecognized backend failure, passed through unmodified.
    #[error(transparent)]
    Backend(BackendError),
}

impl StoreError {
    pub fn contract(message: impl Into<String>) -> Self {
        Self::Contract(ContractViolation::new(message))
    }

    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::Inconsistent(message.into())
    }

    /// Translate a backend signal into its user-facing meaning.
    ///
    /// Only the constraints this store owns are recognized; a violation of
    /// any other constraint is not this layer's to explain and passes
    /// through untouched.
    pub fn from_backend(error: BackendError) -> Self {
        match error {
            BackendError::UniqueViolation { ref constraint }
                if constraint.as_str() == CODE_UNIQUE_CONSTRAINT =>
            {
                conflict("item.code", "Duplicate value for code.")
            }
            BackendError::ForeignKeyViolation { ref constraint }
                if constraint.as_str() == CATEGORY_FK_CONSTRAINT =>
            {
                conflict("item.categoryId", "Item Category does not exist.")
            }
            BackendError::RowNotFound => conflict("item.id", "Item not found."),
            other => Self::Backend(other),
        }
    }
}

fn conflict(field: &str, message: &str) -> StoreError {
    let mut stack = FieldErrorStack::with_status("Conflicting Item", STATUS_CONFLICT);
    stack.push(FieldError::new(field, message));
    StoreError::Conflict(stack)
}
