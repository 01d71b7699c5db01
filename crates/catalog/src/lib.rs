//! `wares-catalog`: the catalog item entity.
//!
//! Validated field state, field-level dirty tracking, and the category
//! union an item carries between reads and writes.

pub mod item;

pub use item::{Category, CategoryValue, Field, InventoryStatus, Item, ItemDraft};
