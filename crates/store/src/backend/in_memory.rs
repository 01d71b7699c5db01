//! In-memory catalog backend.
//!
//! Interprets rendered statements against plain maps plus append-only
//! history vectors, mirroring the production schema: unique code across
//! live and soft-deleted rows, a category foreign key, reads that skip
//! deleted rows and apply the latest history values. Intended for tests
//! and local development.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::r#trait::{Backend, BackendError, Row};
use crate::statement::{
    CATEGORY_FK_CONSTRAINT, CODE_UNIQUE_CONSTRAINT, SqlValue, Statement, StatementOp,
};

/// Quantity at or below which a non-empty stock reads as LOWSTOCK.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

#[derive(Debug, Clone)]
struct ItemRecord {
    id: i64,
    code: String,
    name: String,
    description: String,
    image: Option<String>,
    category_id: i64,
    deleted: bool,
}

#[derive(Debug, Clone)]
struct HistoryRecord<T> {
    item_id: i64,
    value: T,
    recorded_at: DateTime<Utc>,
}

impl<T> HistoryRecord<T> {
    fn now(item_id: i64, value: T) -> Self {
        Self {
            item_id,
            value,
            recorded_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    items: BTreeMap<i64, ItemRecord>,
    categories: BTreeMap<i64, String>,
    prices: Vec<HistoryRecord<f64>>,
    ratings: Vec<HistoryRecord<i64>>,
    inventory: Vec<HistoryRecord<i64>>,
    next_item_id: i64,
    next_category_id: i64,
}

/// Statement interpreter over process-local state.
///
/// Categories, ratings and inventory adjustments are owned by other parts
/// of the system in production; the seeding methods stand in for them.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: RwLock<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a category row; item writes may then reference it by id.
    pub fn add_category(&self, name: &str) -> Result<i64, BackendError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| BackendError::Failure("lock poisoned".to_string()))?;
        state.next_category_id += 1;
        let id = state.next_category_id;
        state.categories.insert(id, name.to_string());
        Ok(id)
    }

    /// Append an out-of-band rating observation.
    pub fn record_rating(&self, item_id: i64, rating: i64) -> Result<(), BackendError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| BackendError::Failure("lock poisoned".to_string()))?;
        if !state.items.contains_key(&item_id) {
            return Err(BackendError::RowNotFound);
        }
        state.ratings.push(HistoryRecord::now(item_id, rating));
        Ok(())
    }

    /// Append an out-of-band inventory adjustment.
    pub fn record_inventory(&self, item_id: i64, quantity: i64) -> Result<(), BackendError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| BackendError::Failure("lock poisoned".to_string()))?;
        if !state.items.contains_key(&item_id) {
            return Err(BackendError::RowNotFound);
        }
        state.inventory.push(HistoryRecord::now(item_id, quantity));
        Ok(())
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn fetch(&self, statement: Statement) -> Result<Vec<Row>, BackendError> {
        match statement.op() {
            StatementOp::InsertItem => {
                let mut state = self
                    .state
                    .write()
                    .map_err(|_| BackendError::Failure("lock poisoned".to_string()))?;
                insert_item(&mut state, statement.params())
            }
            StatementOp::UpdateItem => {
                let mut state = self
                    .state
                    .write()
                    .map_err(|_| BackendError::Failure("lock poisoned".to_string()))?;
                update_item(&mut state, statement.params())
            }
            StatementOp::FetchItem => {
                let id = require_int(statement.params(), 0)?;
                let state = self
                    .state
                    .read()
                    .map_err(|_| BackendError::Failure("lock poisoned".to_string()))?;
                Ok(state
                    .items
                    .get(&id)
                    .filter(|record| !record.deleted)
                    .map(|record| snapshot(&state, record))
                    .into_iter()
                    .collect())
            }
            StatementOp::ListItems => {
                let state = self
                    .state
                    .read()
                    .map_err(|_| BackendError::Failure("lock poisoned".to_string()))?;
                Ok(state
                    .items
                    .values()
                    .filter(|record| !record.deleted)
                    .map(|record| snapshot(&state, record))
                    .collect())
            }
            StatementOp::SoftDeleteItem => Err(BackendError::Failure(format!(
                "{} is not a row-returning statement",
                statement.op().name()
            ))),
        }
    }

    async fn execute(&self, statement: Statement) -> Result<u64, BackendError> {
        match statement.op() {
            StatementOp::SoftDeleteItem => {
                let id = require_int(statement.params(), 0)?;
                let mut state = self
                    .state
                    .write()
                    .map_err(|_| BackendError::Failure("lock poisoned".to_string()))?;
                match state.items.get_mut(&id) {
                    Some(record) if !record.deleted => {
                        record.deleted = true;
                        Ok(1)
                    }
                    _ => Ok(0),
                }
            }
            _ => Err(BackendError::Failure(format!(
                "{} is not an execute statement",
                statement.op().name()
            ))),
        }
    }
}

fn insert_item(state: &mut State, params: &[SqlValue]) -> Result<Vec<Row>, BackendError> {
    let code = require_text(params, 0)?;
    let name = require_text(params, 1)?;
    let description = require_text(params, 2)?;
    let image = opt_text_param(params, 3)?;
    let category_id = require_int(params, 4)?;
    let price = require_float(params, 5)?;
    let quantity = require_int(params, 6)?;

    // Soft-deleted rows still occupy their code.
    if state.items.values().any(|item| item.code == code) {
        return Err(BackendError::UniqueViolation {
            constraint: CODE_UNIQUE_CONSTRAINT.to_string(),
        });
    }
    if !state.categories.contains_key(&category_id) {
        return Err(BackendError::ForeignKeyViolation {
            constraint: CATEGORY_FK_CONSTRAINT.to_string(),
        });
    }

    state.next_item_id += 1;
    let id = state.next_item_id;
    state.items.insert(
        id,
        ItemRecord {
            id,
            code,
            name,
            description,
            image,
            category_id,
            deleted: false,
        },
    );
    state.prices.push(HistoryRecord::now(id, price));
    state.inventory.push(HistoryRecord::now(id, quantity));

    let mut row = Row::new();
    row.push("id", SqlValue::int(id));
    Ok(vec![row])
}

fn update_item(state: &mut State, params: &[SqlValue]) -> Result<Vec<Row>, BackendError> {
    let id = require_int(params, 0)?;
    let code = opt_text_param(params, 1)?;
    let name = opt_text_param(params, 2)?;
    let description = opt_text_param(params, 3)?;
    let image = opt_text_param(params, 4)?;
    let category_id = opt_int_param(params, 5)?;
    let price = opt_float_param(params, 6)?;
    let quantity = opt_int_param(params, 7)?;

    let live = state
        .items
        .get(&id)
        .map(|record| !record.deleted)
        .unwrap_or(false);
    if !live {
        return Err(BackendError::RowNotFound);
    }
    if let Some(code) = &code {
        if state
            .items
            .values()
            .any(|item| item.id != id && item.code == *code)
        {
            return Err(BackendError::UniqueViolation {
                constraint: CODE_UNIQUE_CONSTRAINT.to_string(),
            });
        }
    }
    if let Some(category_id) = category_id {
        if !state.categories.contains_key(&category_id) {
            return Err(BackendError::ForeignKeyViolation {
                constraint: CATEGORY_FK_CONSTRAINT.to_string(),
            });
        }
    }

    // NULL parameters leave the column unchanged.
    if let Some(record) = state.items.get_mut(&id) {
        if let Some(code) = code {
            record.code = code;
        }
        if let Some(name) = name {
            record.name = name;
        }
        if let Some(description) = description {
            record.description = description;
        }
        if let Some(image) = image {
            record.image = Some(image);
        }
        if let Some(category_id) = category_id {
            record.category_id = category_id;
        }
    }
    if let Some(price) = price {
        state.prices.push(HistoryRecord::now(id, price));
    }
    if let Some(quantity) = quantity {
        state.inventory.push(HistoryRecord::now(id, quantity));
    }

    Ok(Vec::new())
}

/// Newest record wins; ties fall to the latest appended.
fn latest<T: Copy>(history: &[HistoryRecord<T>], item_id: i64) -> Option<T> {
    history
        .iter()
        .filter(|record| record.item_id == item_id)
        .max_by_key(|record| record.recorded_at)
        .map(|record| record.value)
}

fn snapshot(state: &State, record: &ItemRecord) -> Row {
    let price = latest(&state.prices, record.id).unwrap_or(0.0);
    let rating = latest(&state.ratings, record.id).unwrap_or(0);
    let quantity = latest(&state.inventory, record.id).unwrap_or(0);
    let status = if quantity <= 0 {
        "OUTOFSTOCK"
    } else if quantity <= LOW_STOCK_THRESHOLD {
        "LOWSTOCK"
    } else {
        "INSTOCK"
    };

    let mut row = Row::new();
    row.push("id", SqlValue::int(record.id));
    row.push("code", SqlValue::text(record.code.clone()));
    row.push("name", SqlValue::text(record.name.clone()));
    row.push("description", SqlValue::text(record.description.clone()));
    row.push("image", SqlValue::Text(record.image.clone()));
    row.push("category_id", SqlValue::int(record.category_id));
    row.push(
        "category_name",
        SqlValue::Text(state.categories.get(&record.category_id).cloned()),
    );
    row.push("quantity", SqlValue::int(quantity));
    row.push("price", SqlValue::float(price));
    row.push("rating", SqlValue::int(rating));
    row.push("inventory_status", SqlValue::text(status));
    row
}

fn require_text(params: &[SqlValue], index: usize) -> Result<String, BackendError> {
    match params.get(index) {
        Some(SqlValue::Text(Some(value))) => Ok(value.clone()),
        other => Err(parameter_mismatch(index, "non-null text", other)),
    }
}

fn opt_text_param(params: &[SqlValue], index: usize) -> Result<Option<String>, BackendError> {
    match params.get(index) {
        Some(SqlValue::Text(value)) => Ok(value.clone()),
        other => Err(parameter_mismatch(index, "text", other)),
    }
}

fn require_int(params: &[SqlValue], index: usize) -> Result<i64, BackendError> {
    match params.get(index) {
        Some(SqlValue::Int(Some(value))) => Ok(*value),
        other => Err(parameter_mismatch(index, "non-null integer", other)),
    }
}

fn opt_int_param(params: &[SqlValue], index: usize) -> Result<Option<i64>, BackendError> {
    match params.get(index) {
        Some(SqlValue::Int(value)) => Ok(*value),
        other => Err(parameter_mismatch(index, "integer", other)),
    }
}

fn require_float(params: &[SqlValue], index: usize) -> Result<f64, BackendError> {
    match params.get(index) {
        Some(SqlValue::Float(Some(value))) => Ok(*value),
        other => Err(parameter_mismatch(index, "non-null float", other)),
    }
}

fn opt_float_param(params: &[SqlValue], index: usize) -> Result<Option<f64>, BackendError> {
    match params.get(index) {
        Some(SqlValue::Float(value)) => Ok(*value),
        other => Err(parameter_mismatch(index, "float", other)),
    }
}

fn parameter_mismatch(index: usize, expected: &str, found: Option<&SqlValue>) -> BackendError {
    BackendError::Failure(format!(
        "parameter {index} cannot decode as {expected}: {found:?}"
    ))
}
