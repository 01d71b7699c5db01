//! Catalog backend boundary.
//!
//! A backend runs rendered statements and reports rows plus constraint
//! signals. It makes no policy decisions: what a violated constraint means
//! to a caller is decided by the error translation layer above it.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryBackend;
pub use postgres::PostgresBackend;
pub use r#trait::{Backend, BackendError, ItemRow, Row};
