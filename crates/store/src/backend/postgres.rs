//! Postgres-backed catalog backend.
//!
//! Runs rendered statements over a sqlx connection pool and maps sqlx
//! failures onto backend error classes by SQLSTATE: `23505` becomes a
//! unique violation, `23503` a foreign key violation, and `P0002`/`02000`
//! (raised by `update_item` when the row is gone) become row-not-found.
//! Everything else passes through as an opaque failure.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row as _, TypeInfo};

use super::r#trait::{Backend, BackendError, Row};
use crate::statement::{SqlValue, Statement};

/// Backend over a shared Postgres pool.
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: Arc<PgPool>,
}

impl PostgresBackend {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect with default pool sizing.
    pub async fn connect(database_url: &str) -> Result<Self, BackendError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), BackendError> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| BackendError::Failure(format!("migration failed: {e}")))
    }
}

#[async_trait]
impl Backend for PostgresBackend {
    async fn fetch(&self, statement: Statement) -> Result<Vec<Row>, BackendError> {
        let rows = bind_statement(&statement)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(statement.op().name(), e))?;
        rows.iter().map(row_from_pg).collect()
    }

    async fn execute(&self, statement: Statement) -> Result<u64, BackendError> {
        let done = bind_statement(&statement)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(statement.op().name(), e))?;
        Ok(done.rows_affected())
    }
}

fn bind_statement<'q>(
    statement: &'q Statement,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    let mut query = sqlx::query(statement.sql());
    for param in statement.params() {
        query = match param {
            SqlValue::Int(value) => query.bind(*value),
            SqlValue::Float(value) => query.bind(*value),
            SqlValue::Text(value) => query.bind(value.clone()),
            SqlValue::Bool(value) => query.bind(*value),
        };
    }
    query
}

/// Convert a Postgres row into the backend-neutral form, widening narrow
/// numeric columns on the way.
fn row_from_pg(row: &PgRow) -> Result<Row, BackendError> {
    let mut converted = Row::new();
    for column in row.columns() {
        let name = column.name();
        let value = match column.type_info().name() {
            "INT2" => SqlValue::Int(
                row.try_get::<Option<i16>, _>(name)
                    .map_err(|e| decode_error(name, e))?
                    .map(i64::from),
            ),
            "INT4" => SqlValue::Int(
                row.try_get::<Option<i32>, _>(name)
                    .map_err(|e| decode_error(name, e))?
                    .map(i64::from),
            ),
            "INT8" => SqlValue::Int(row.try_get(name).map_err(|e| decode_error(name, e))?),
            "FLOAT4" => SqlValue::Float(
                row.try_get::<Option<f32>, _>(name)
                    .map_err(|e| decode_error(name, e))?
                    .map(f64::from),
            ),
            "FLOAT8" => SqlValue::Float(row.try_get(name).map_err(|e| decode_error(name, e))?),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
                SqlValue::Text(row.try_get(name).map_err(|e| decode_error(name, e))?)
            }
            "BOOL" => SqlValue::Bool(row.try_get(name).map_err(|e| decode_error(name, e))?),
            // `SELECT update_item(...)` yields a single VOID column.
            "VOID" => SqlValue::Text(None),
            other => {
                return Err(BackendError::Decode(format!(
                    "unsupported column type {other} for '{name}'"
                )));
            }
        };
        converted.push(name, value);
    }
    Ok(converted)
}

fn decode_error(column: &str, error: sqlx::Error) -> BackendError {
    BackendError::Decode(format!("column '{column}': {error}"))
}

/// Map a sqlx error onto a backend error class.
fn map_sqlx_error(operation: &str, error: sqlx::Error) -> BackendError {
    match error {
        sqlx::Error::Database(db) => {
            let constraint = db.constraint().unwrap_or_default().to_string();
            match db.code().as_deref() {
                Some("23505") => BackendError::UniqueViolation { constraint },
                Some("23503") => BackendError::ForeignKeyViolation { constraint },
                Some("P0002") | Some("02000") => BackendError::RowNotFound,
                _ => BackendError::Failure(format!(
                    "database error in {operation}: {}",
                    db.message()
                )),
            }
        }
        sqlx::Error::RowNotFound => BackendError::RowNotFound,
        other => BackendError::Failure(format!("sqlx error in {operation}: {other}")),
    }
}
