//! Item lifecycle orchestration over a [`Backend`].
//!
//! Every successful write is followed by a fresh snapshot read, and the
//! re-read entity is returned as canonical state; the caller's copy stays
//! untouched until it merges via [`Item::replace_with`]. Precondition
//! breaches surface as [`StoreError::Contract`] before any backend call.

use tracing::{Span, instrument};

use wares_catalog::Item;
use wares_core::Identifier;

use crate::backend::{Backend, BackendError, ItemRow};
use crate::error::StoreError;
use crate::statement;

#[derive(Debug, Clone)]
pub struct ItemRepository<B> {
    backend: B,
}

impl<B: Backend> ItemRepository<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Persist a new item, or update when it already has an identity.
    ///
    /// Read-only items have no valid category reference and are rejected
    /// before anything is rendered.
    #[instrument(skip(self, item), fields(code = item.code(), id = tracing::field::Empty), err)]
    pub async fn insert_new(&self, item: &Item) -> Result<Item, StoreError> {
        if item.is_read_only() {
            return Err(StoreError::contract("Cannot persist a read-only item."));
        }
        if item.is_persisted() {
            return self.update_existing(item).await;
        }

        let rows = self
            .backend
            .fetch(statement::insert_item(item))
            .await
            .map_err(StoreError::from_backend)?;
        let generated = match rows.first() {
            Some(row) => row.int("id").map_err(|error| {
                StoreError::inconsistent(format!(
                    "Create succeeded but returned no usable id: {error}"
                ))
            })?,
            None => {
                return Err(StoreError::inconsistent(
                    "Create succeeded but returned no row.",
                ));
            }
        };
        let id = Identifier::for_field(generated, "item.id").map_err(|error| {
            StoreError::inconsistent(format!("Backend generated an invalid id: {error}"))
        })?;
        Span::current().record("id", id.get());

        match self.fetch_by_id(id).await? {
            Some(fresh) => Ok(fresh),
            None => Err(StoreError::inconsistent(
                "Unable to retrieve new item from backend.",
            )),
        }
    }

    /// Write the dirty fields of a persisted item, then return the fresh
    /// snapshot.
    #[instrument(skip(self, item), fields(code = item.code(), id = tracing::field::Empty), err)]
    pub async fn update_existing(&self, item: &Item) -> Result<Item, StoreError> {
        if item.is_read_only() {
            return Err(StoreError::contract("Cannot persist a read-only item."));
        }
        let Some(id) = item.id() else {
            return Err(StoreError::contract(
                "Update called on an item that was never persisted.",
            ));
        };
        if !item.is_dirty() {
            return Err(StoreError::contract("Update called on item without updates."));
        }
        Span::current().record("id", id.get());

        self.backend
            .fetch(statement::update_item(id, item))
            .await
            .map_err(StoreError::from_backend)?;

        match self.fetch_by_id(id).await? {
            Some(fresh) => Ok(fresh),
            None => Err(StoreError::inconsistent(
                "Unable to retrieve updated item from backend.",
            )),
        }
    }

    /// Load the current snapshot of one live item.
    #[instrument(skip(self), fields(id = id.get()), err)]
    pub async fn fetch_by_id(&self, id: Identifier) -> Result<Option<Item>, StoreError> {
        let rows = self
            .backend
            .fetch(statement::fetch_item(id))
            .await
            .map_err(StoreError::from_backend)?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let snapshot = ItemRow::from_row(row).map_err(StoreError::from_backend)?;
        Ok(Some(Item::new(snapshot.into_draft())?))
    }

    /// Load every live item, ordered by id.
    #[instrument(skip(self), err)]
    pub async fn list(&self) -> Result<Vec<Item>, StoreError> {
        let rows = self
            .backend
            .fetch(statement::list_items())
            .await
            .map_err(StoreError::from_backend)?;
        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let snapshot = ItemRow::from_row(row).map_err(StoreError::from_backend)?;
            items.push(Item::new(snapshot.into_draft())?);
        }
        Ok(items)
    }

    /// Flag one item deleted. Zero affected rows means the id never
    /// existed or was already deleted; both read as the not-found conflict.
    #[instrument(skip(self), fields(id = id.get()), err)]
    pub async fn soft_delete(&self, id: Identifier) -> Result<(), StoreError> {
        let affected = self
            .backend
            .execute(statement::soft_delete_item(id))
            .await
            .map_err(StoreError::from_backend)?;
        if affected == 0 {
            return Err(StoreError::from_backend(BackendError::RowNotFound));
        }
        Ok(())
    }
}
