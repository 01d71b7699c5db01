//! The catalog item entity: validated fields, dual-typed category state,
//! and field-level dirty tracking that drives sparse updates.

use std::collections::BTreeSet;
use std::fmt;
use std::mem;

use serde::{Deserialize, Serialize};

use wares_core::{validate, ContractViolation, FieldError, FieldErrorStack, Identifier};

// Field domains enforced locally; the backend columns match.
const CODE_MAX: usize = 255;
const NAME_MAX: usize = 255;
const IMAGE_MAX: usize = 2_048;
const QUANTITY_MAX: i64 = validate::INT_MAX;
const PRICE_MIN: f64 = 0.0;
const PRICE_MAX: f64 = validate::FLOAT_MAX;
const RATING_MAX: i64 = 5;

/// Fields participating in dirty tracking.
///
/// Declaration order is the order construction reports errors in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Code,
    Name,
    Description,
    Image,
    Category,
    Quantity,
    Price,
    Rating,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Name => "name",
            Self::Description => "description",
            Self::Image => "image",
            Self::Category => "category",
            Self::Quantity => "quantity",
            Self::Price => "price",
            Self::Rating => "rating",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stock level reported by the backend.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryStatus {
    #[default]
    #[serde(rename = "OUTOFSTOCK")]
    OutOfStock,
    #[serde(rename = "LOWSTOCK")]
    LowStock,
    #[serde(rename = "INSTOCK")]
    InStock,
}

impl InventoryStatus {
    /// Parse a wire token; `None` for anything unrecognized.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "OUTOFSTOCK" => Some(Self::OutOfStock),
            "LOWSTOCK" => Some(Self::LowStock),
            "INSTOCK" => Some(Self::InStock),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OutOfStock => "OUTOFSTOCK",
            Self::LowStock => "LOWSTOCK",
            Self::InStock => "INSTOCK",
        }
    }
}

impl fmt::Display for InventoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value accepted by the category assignment: a reference to a category row
/// or a bare display name. Mirrors the dual-typed field in the JSON shape,
/// hence the untagged representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryValue {
    Reference(i64),
    Name(String),
}

/// Category state carried by an item.
///
/// Only a validated reference makes an item writable; a display name on its
/// own is read-side decoration and keeps the item read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Category {
    #[default]
    Unset,
    DisplayOnly(String),
    Reference {
        id: Identifier,
        name: Option<String>,
    },
}

impl Category {
    pub fn id(&self) -> Option<Identifier> {
        match self {
            Self::Reference { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::DisplayOnly(name) => Some(name),
            Self::Reference { name, .. } => name.as_deref(),
            Self::Unset => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference { .. })
    }
}

/// Raw field bag an [`Item`] is built from.
///
/// Required fields are plain values (a missing JSON key arrives as the
/// empty/zero form and fails validation with a proper field error); optional
/// fields are skipped entirely when absent. `category` carries either a
/// reference or a display name; `category_name` is the joined name a read
/// row reports alongside the reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemDraft {
    pub id: Option<i64>,
    pub code: String,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub category: Option<CategoryValue>,
    pub category_name: Option<String>,
    pub quantity: i64,
    pub price: f64,
    pub rating: Option<i64>,
    pub inventory_status: Option<String>,
}

/// A catalog item: validated field state plus field-level dirty tracking.
///
/// Fields are private; edits go through `set_*` methods that normalize,
/// validate, and record dirtiness for persisted items. The repository reads
/// the dirty set to render sparse updates, then hands back a fresh entity
/// the caller merges with [`Item::replace_with`].
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    id: Option<Identifier>,
    code: String,
    name: String,
    description: String,
    image: Option<String>,
    category: Category,
    quantity: i64,
    price: f64,
    rating: i64,
    inventory_status: InventoryStatus,
    dirty: BTreeSet<Field>,
}

impl Item {
    /// Build an item from a raw field bag, collecting every rejected field.
    ///
    /// The id is assigned first so later assignments see the persisted
    /// state. Required fields are validated unconditionally; the setters'
    /// same-value short-circuit applies only to previously assigned values,
    /// never to the blank initial state. Dirty tracking is reset at the very
    /// end, so construction never leaves residual dirty fields. Failure
    /// reports all rejected fields at once, in declaration order, as an
    /// "Invalid Item" stack.
    pub fn new(draft: ItemDraft) -> Result<Self, FieldErrorStack> {
        let mut item = Self {
            id: None,
            code: String::new(),
            name: String::new(),
            description: String::new(),
            image: None,
            category: Category::Unset,
            quantity: 0,
            price: 0.0,
            rating: 0,
            inventory_status: InventoryStatus::default(),
            dirty: BTreeSet::new(),
        };
        let mut errors = FieldErrorStack::new("Invalid Item");

        if let Some(raw) = draft.id {
            match Identifier::for_field(raw, "item.id") {
                Ok(id) => item.set_id(Some(id)),
                Err(error) => errors.push(error),
            }
        }
        if let Err(error) = item.assign_code(&draft.code) {
            errors.push(error);
        }
        if let Err(error) = item.assign_name(&draft.name) {
            errors.push(error);
        }
        if let Err(error) = item.assign_description(&draft.description) {
            errors.push(error);
        }
        if let Some(image) = &draft.image {
            if let Err(error) = item.set_image(image) {
                errors.push(error);
            }
        }
        if let Some(category) = draft.category {
            if let Err(error) = item.set_category(category) {
                errors.push(error);
            }
        }
        if let Some(name) = draft.category_name {
            if let Err(error) = item.set_category(CategoryValue::Name(name)) {
                errors.push(error);
            }
        }
        if let Err(error) = item.set_quantity(draft.quantity) {
            errors.push(error);
        }
        if let Err(error) = item.set_price(draft.price) {
            errors.push(error);
        }
        if let Some(rating) = draft.rating {
            if let Err(error) = item.set_rating(rating) {
                errors.push(error);
            }
        }
        if let Some(token) = &draft.inventory_status {
            item.set_inventory_status(token);
        }

        item.dirty.clear();
        if errors.is_empty() {
            Ok(item)
        } else {
            Err(errors)
        }
    }

    pub fn id(&self) -> Option<Identifier> {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn category_id(&self) -> Option<Identifier> {
        self.category.id()
    }

    pub fn category_name(&self) -> Option<&str> {
        self.category.name()
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn rating(&self) -> i64 {
        self.rating
    }

    pub fn inventory_status(&self) -> InventoryStatus {
        self.inventory_status
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// An item with no validated category reference cannot be written back.
    pub fn is_read_only(&self) -> bool {
        !self.category.is_reference()
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn dirty_fields(&self) -> &BTreeSet<Field> {
        &self.dirty
    }

    /// Adopt or clear the persisted identity. Identifiers are valid by
    /// construction, so this cannot fail; the id itself is never dirty.
    pub fn set_id(&mut self, id: Option<Identifier>) {
        self.id = id;
    }

    /// Trackable-field setters share one shape: normalize, skip when the
    /// normalized value equals the previously assigned one, validate,
    /// assign, mark dirty when the item is persisted. Construction uses the
    /// `assign_*` halves directly, so required fields are validated even
    /// when the draft value matches the blank initial state.
    pub fn set_code(&mut self, value: &str) -> Result<(), FieldError> {
        if value.trim() == self.code {
            return Ok(());
        }
        self.assign_code(value)
    }

    fn assign_code(&mut self, value: &str) -> Result<(), FieldError> {
        self.code = validate::text(value.trim(), 1, CODE_MAX, "item.code")?;
        self.mark_dirty(Field::Code);
        Ok(())
    }

    pub fn set_name(&mut self, value: &str) -> Result<(), FieldError> {
        if value.trim() == self.name {
            return Ok(());
        }
        self.assign_name(value)
    }

    fn assign_name(&mut self, value: &str) -> Result<(), FieldError> {
        self.name = validate::text(value.trim(), 1, NAME_MAX, "item.name")?;
        self.mark_dirty(Field::Name);
        Ok(())
    }

    pub fn set_description(&mut self, value: &str) -> Result<(), FieldError> {
        if value.trim() == self.description {
            return Ok(());
        }
        self.assign_description(value)
    }

    fn assign_description(&mut self, value: &str) -> Result<(), FieldError> {
        self.description = validate::text(value.trim(), 1, validate::TEXT_MAX, "item.description")?;
        self.mark_dirty(Field::Description);
        Ok(())
    }

    /// Empty input clears the image. A cleared image still renders as NULL
    /// in sparse updates, where NULL means "unchanged"; that collision is
    /// part of the statement contract.
    pub fn set_image(&mut self, value: &str) -> Result<(), FieldError> {
        let trimmed = value.trim();
        let normalized = if trimmed.is_empty() { None } else { Some(trimmed) };
        if normalized == self.image.as_deref() {
            return Ok(());
        }
        self.image = match normalized {
            Some(value) => Some(validate::text(value, 0, IMAGE_MAX, "item.image")?),
            None => None,
        };
        self.mark_dirty(Field::Image);
        Ok(())
    }

    /// Assign the category from the dual-typed input.
    ///
    /// A reference is validated and makes the item writable. A bare name is
    /// display-only state from a read join: never validated, never dirty,
    /// and it does not lift the read-only barrier on its own.
    pub fn set_category(&mut self, value: CategoryValue) -> Result<(), FieldError> {
        match value {
            CategoryValue::Reference(raw) => {
                let id = Identifier::for_field(raw, "item.categoryId")?;
                if self.category.id() == Some(id) {
                    return Ok(());
                }
                // A new reference invalidates any previously joined name.
                self.category = Category::Reference { id, name: None };
                self.mark_dirty(Field::Category);
            }
            CategoryValue::Name(raw) => {
                let trimmed = raw.trim().to_string();
                if self.category.name() == Some(trimmed.as_str()) {
                    return Ok(());
                }
                self.category = match mem::replace(&mut self.category, Category::Unset) {
                    Category::Reference { id, .. } => Category::Reference {
                        id,
                        name: Some(trimmed),
                    },
                    _ => Category::DisplayOnly(trimmed),
                };
            }
        }
        Ok(())
    }

    pub fn set_quantity(&mut self, value: i64) -> Result<(), FieldError> {
        if value == self.quantity {
            return Ok(());
        }
        self.quantity = validate::int(value, 0, QUANTITY_MAX, "item.quantity")?;
        self.mark_dirty(Field::Quantity);
        Ok(())
    }

    /// Price dirtiness compares through [`validate::money`], the same
    /// two-decimal form the rendered parameters carry, so a sub-cent
    /// difference is a no-op.
    pub fn set_price(&mut self, value: f64) -> Result<(), FieldError> {
        if validate::money(value) == validate::money(self.price) {
            return Ok(());
        }
        self.price = validate::float(value, PRICE_MIN, PRICE_MAX, "item.price")?;
        self.mark_dirty(Field::Price);
        Ok(())
    }

    /// Rating is maintained by the backend; accepted here so read rows can
    /// hydrate it, but it never enters the dirty set.
    pub fn set_rating(&mut self, value: i64) -> Result<(), FieldError> {
        if value == self.rating {
            return Ok(());
        }
        self.rating = validate::int(value, 0, RATING_MAX, "item.rating")?;
        Ok(())
    }

    /// Accept a status token from the backend; unknown tokens are ignored.
    pub fn set_inventory_status(&mut self, token: &str) {
        if let Some(status) = InventoryStatus::parse(token) {
            self.inventory_status = status;
        }
    }

    /// Overwrite this item with the canonical state fetched after a write.
    ///
    /// The backend owns rating and inventory status, so the fetched row wins
    /// wholesale. Dirty tracking restarts empty.
    pub fn replace_with(&mut self, canonical: Item) {
        *self = canonical;
        self.dirty.clear();
    }

    /// Local half of a soft delete: forget the persisted identity.
    pub fn mark_deleted(&mut self) -> Result<(), ContractViolation> {
        if !self.is_persisted() {
            return Err(ContractViolation::new(
                "Delete called on an item that was never persisted.",
            ));
        }
        self.id = None;
        Ok(())
    }

    fn mark_dirty(&mut self, field: Field) {
        if self.is_persisted() {
            self.dirty.insert(field);
        }
    }
}
