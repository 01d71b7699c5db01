//! Statement rendering for the catalog schema.
//!
//! Entities never see SQL; this module turns them into [`Statement`]
//! values that any [`Backend`](crate::backend::Backend) can run. Writes go
//! through stored procedures (`create_item`, `update_item`) so history
//! rows are appended in the same transaction as the base row. Reads go
//! through the `live_item_snapshots` view, which joins the latest history
//! values onto each live item and derives the stock status token.

use wares_catalog::{Field, Item};
use wares_core::{validate, Identifier};

/// Unique constraint on `items.code`. Inserting or updating to a code that
/// any row already holds, soft-deleted rows included, trips this.
pub const CODE_UNIQUE_CONSTRAINT: &str = "items_code_key";

/// Foreign key from `items.category_id` to `categories.id`.
pub const CATEGORY_FK_CONSTRAINT: &str = "items_category_id_fkey";

const INSERT_ITEM_SQL: &str = "SELECT create_item($1, $2, $3, $4, $5, $6, $7) AS id";

const UPDATE_ITEM_SQL: &str = "SELECT update_item($1, $2, $3, $4, $5, $6, $7, $8)";

const SOFT_DELETE_ITEM_SQL: &str = "UPDATE items SET deleted = TRUE WHERE id = $1 AND NOT deleted";

const FETCH_ITEM_SQL: &str = "SELECT id, code, name, description, image, category_id, category_name, \
     quantity, price, rating, inventory_status \
     FROM live_item_snapshots WHERE id = $1";

const LIST_ITEMS_SQL: &str = "SELECT id, code, name, description, image, category_id, category_name, \
     quantity, price, rating, inventory_status \
     FROM live_item_snapshots ORDER BY id";

/// A typed wire value. `None` renders as SQL NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(Option<i64>),
    Float(Option<f64>),
    Text(Option<String>),
    Bool(Option<bool>),
}

impl SqlValue {
    pub fn int(value: i64) -> Self {
        Self::Int(Some(value))
    }

    pub fn float(value: f64) -> Self {
        Self::Float(Some(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(Some(value.into()))
    }

    pub fn null_int() -> Self {
        Self::Int(None)
    }

    pub fn null_float() -> Self {
        Self::Float(None)
    }

    pub fn null_text() -> Self {
        Self::Text(None)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => *value,
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => *value,
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => value.as_deref(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Self::Int(None) | Self::Float(None) | Self::Text(None) | Self::Bool(None)
        )
    }
}

/// What a statement does, for dispatch and log labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementOp {
    InsertItem,
    UpdateItem,
    SoftDeleteItem,
    FetchItem,
    ListItems,
}

impl StatementOp {
    pub fn name(self) -> &'static str {
        match self {
            Self::InsertItem => "insert_item",
            Self::UpdateItem => "update_item",
            Self::SoftDeleteItem => "soft_delete_item",
            Self::FetchItem => "fetch_item",
            Self::ListItems => "list_items",
        }
    }
}

/// A rendered statement: SQL text plus positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    op: StatementOp,
    sql: &'static str,
    params: Vec<SqlValue>,
}

impl Statement {
    pub fn op(&self) -> StatementOp {
        self.op
    }

    pub fn sql(&self) -> &'static str {
        self.sql
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }
}

/// Render a full insert. Every column is sent; the procedure also seeds
/// the initial price and inventory history rows. Prices cross the wire in
/// the same two-decimal [`validate::money`] form the entity compares with.
pub fn insert_item(item: &Item) -> Statement {
    Statement {
        op: StatementOp::InsertItem,
        sql: INSERT_ITEM_SQL,
        params: vec![
            SqlValue::text(item.code()),
            SqlValue::text(item.name()),
            SqlValue::text(item.description()),
            SqlValue::Text(item.image().map(str::to_string)),
            SqlValue::Int(item.category_id().map(Identifier::get)),
            SqlValue::float(validate::money(item.price())),
            SqlValue::int(item.quantity()),
        ],
    }
}

/// Render a sparse update: dirty fields carry their value, clean fields
/// carry NULL and the procedure leaves the column unchanged.
///
/// An image cleared back to empty is also NULL on the wire, so a sparse
/// update cannot distinguish it from "unchanged"; callers that need the
/// clear to stick must re-send the full row.
pub fn update_item(id: Identifier, item: &Item) -> Statement {
    let dirty = item.dirty_fields();
    let text_if = |field: Field, value: Option<String>| {
        if dirty.contains(&field) {
            SqlValue::Text(value)
        } else {
            SqlValue::null_text()
        }
    };

    let category = if dirty.contains(&Field::Category) {
        SqlValue::Int(item.category_id().map(Identifier::get))
    } else {
        SqlValue::null_int()
    };
    let price = if dirty.contains(&Field::Price) {
        SqlValue::float(validate::money(item.price()))
    } else {
        SqlValue::null_float()
    };
    let quantity = if dirty.contains(&Field::Quantity) {
        SqlValue::int(item.quantity())
    } else {
        SqlValue::null_int()
    };

    Statement {
        op: StatementOp::UpdateItem,
        sql: UPDATE_ITEM_SQL,
        params: vec![
            SqlValue::int(id.get()),
            text_if(Field::Code, Some(item.code().to_string())),
            text_if(Field::Name, Some(item.name().to_string())),
            text_if(Field::Description, Some(item.description().to_string())),
            text_if(Field::Image, item.image().map(str::to_string)),
            category,
            price,
            quantity,
        ],
    }
}

/// Render a soft delete. A plain UPDATE, not a procedure: it touches no
/// history and reports affected rows so callers can detect missing ids.
pub fn soft_delete_item(id: Identifier) -> Statement {
    Statement {
        op: StatementOp::SoftDeleteItem,
        sql: SOFT_DELETE_ITEM_SQL,
        params: vec![SqlValue::int(id.get())],
    }
}

/// Render a single-item snapshot read.
pub fn fetch_item(id: Identifier) -> Statement {
    Statement {
        op: StatementOp::FetchItem,
        sql: FETCH_ITEM_SQL,
        params: vec![SqlValue::int(id.get())],
    }
}

/// Render the full catalog listing, ordered by id.
pub fn list_items() -> Statement {
    Statement {
        op: StatementOp::ListItems,
        sql: LIST_ITEMS_SQL,
        params: Vec::new(),
    }
}
