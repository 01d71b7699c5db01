//! `wares-core`: validation building blocks for the catalog model.
//!
//! This crate contains **pure domain** primitives (no persistence concerns):
//! field-level bound checks, the validated key type, and the error shapes the
//! upper layers aggregate and translate.

pub mod error;
pub mod id;
pub mod validate;

pub use error::{
    ContractViolation, FieldError, FieldErrorStack, STATUS_CONFLICT, STATUS_UNPROCESSABLE,
};
pub use id::Identifier;
