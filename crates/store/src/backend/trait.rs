//! The backend contract and its row types.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use wares_catalog::{CategoryValue, ItemDraft};

use crate::statement::{SqlValue, Statement};

/// Failure classes a backend reports.
///
/// Constraint violations carry the backend's constraint name verbatim;
/// which of them become user-facing conflicts is decided above.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    #[error("row not found")]
    RowNotFound,

    #[error("row decode failed: {0}")]
    Decode(String),

    #[error("backend failure: {0}")]
    Failure(String),
}

/// One result row: named columns carrying wire-typed values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: SqlValue) {
        self.columns.push((column.into(), value));
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn int(&self, column: &str) -> Result<i64, BackendError> {
        match self.require(column)? {
            SqlValue::Int(Some(value)) => Ok(*value),
            other => Err(mismatch(column, "non-null integer", other)),
        }
    }

    pub fn opt_int(&self, column: &str) -> Result<Option<i64>, BackendError> {
        match self.require(column)? {
            SqlValue::Int(value) => Ok(*value),
            other => Err(mismatch(column, "integer", other)),
        }
    }

    pub fn float(&self, column: &str) -> Result<f64, BackendError> {
        match self.require(column)? {
            SqlValue::Float(Some(value)) => Ok(*value),
            SqlValue::Int(Some(value)) => Ok(*value as f64),
            other => Err(mismatch(column, "non-null float", other)),
        }
    }

    pub fn text(&self, column: &str) -> Result<String, BackendError> {
        match self.require(column)? {
            SqlValue::Text(Some(value)) => Ok(value.clone()),
            other => Err(mismatch(column, "non-null text", other)),
        }
    }

    pub fn opt_text(&self, column: &str) -> Result<Option<String>, BackendError> {
        match self.require(column)? {
            SqlValue::Text(value) => Ok(value.clone()),
            other => Err(mismatch(column, "text", other)),
        }
    }

    fn require(&self, column: &str) -> Result<&SqlValue, BackendError> {
        self.get(column)
            .ok_or_else(|| BackendError::Decode(format!("missing column '{column}'")))
    }
}

fn mismatch(column: &str, expected: &str, found: &SqlValue) -> BackendError {
    BackendError::Decode(format!(
        "column '{column}' cannot decode as {expected}: {found:?}"
    ))
}

/// Current snapshot of one item as the backend reports it: base columns,
/// joined category name, latest history values, derived status token.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRow {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub category_id: i64,
    pub category_name: Option<String>,
    pub quantity: i64,
    pub price: f64,
    pub rating: i64,
    pub inventory_status: String,
}

impl ItemRow {
    pub fn from_row(row: &Row) -> Result<Self, BackendError> {
        Ok(Self {
            id: row.int("id")?,
            code: row.text("code")?,
            name: row.text("name")?,
            description: row.text("description")?,
            image: row.opt_text("image")?,
            category_id: row.int("category_id")?,
            category_name: row.opt_text("category_name")?,
            quantity: row.int("quantity")?,
            price: row.float("price")?,
            rating: row.int("rating")?,
            inventory_status: row.text("inventory_status")?,
        })
    }

    /// Bridge into the entity's construction bag.
    pub fn into_draft(self) -> ItemDraft {
        ItemDraft {
            id: Some(self.id),
            code: self.code,
            name: self.name,
            description: self.description,
            image: self.image,
            category: Some(CategoryValue::Reference(self.category_id)),
            category_name: self.category_name,
            quantity: self.quantity,
            price: self.price,
            rating: Some(self.rating),
            inventory_status: Some(self.inventory_status),
        }
    }
}

/// Executes rendered statements against the catalog schema.
///
/// Implementations enforce the schema's constraints and surface them as
/// [`BackendError`] values; they never reinterpret a violation.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Run a statement that returns rows.
    async fn fetch(&self, statement: Statement) -> Result<Vec<Row>, BackendError>;

    /// Run a statement, reporting how many rows it touched.
    async fn execute(&self, statement: Statement) -> Result<u64, BackendError>;
}

#[async_trait]
impl<B> Backend for Arc<B>
where
    B: Backend + ?Sized,
{
    async fn fetch(&self, statement: Statement) -> Result<Vec<Row>, BackendError> {
        (**self).fetch(statement).await
    }

    async fn execute(&self, statement: Statement) -> Result<u64, BackendError> {
        (**self).execute(statement).await
    }
}
