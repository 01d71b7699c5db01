//! `wares-store`: persistence for the item catalog.
//!
//! Layered from the bottom up:
//! - [`statement`] renders entity state into parameterized statements,
//! - [`backend`] executes statements (Postgres or in-memory) and reports
//!   constraint signals,
//! - [`error`] translates those signals into user-facing conflicts,
//! - [`repository`] orchestrates the write-then-re-fetch lifecycle.

pub mod backend;
pub mod error;
pub mod repository;
pub mod statement;

pub use backend::{Backend, BackendError, InMemoryBackend, ItemRow, PostgresBackend, Row};
pub use error::StoreError;
pub use repository::ItemRepository;
pub use statement::{SqlValue, Statement, StatementOp};
