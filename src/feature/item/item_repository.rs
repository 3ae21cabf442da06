//! Types and functions for storing and loading items.
//!
//! Items live in an [`ItemTable`] in memory. The table is shared between
//! requests through an [`ItemStore`], which hands out exclusive access to it
//! for the duration of one operation.

use crate::infra::error::{ApiResult, InternalError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::instrument;
use utoipa::ToSchema;

/// A new item, already validated and trimmed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewItem {
    /// The item's name.
    pub name: String,
    /// The item's description.
    pub description: String,
}

/// An existing item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// The item's id.
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "MyItem")]
    /// The item's name.
    pub name: String,
    #[schema(example = "A very interesting item")]
    /// The item's description.
    pub description: String,
    /// When the item was created.
    pub created_at: DateTime<Utc>,
    /// When the item was last updated. Absent until the first update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// An item id as written by a client.
///
/// Only the integer at the start of the raw id counts, so `12abc` and `12.5`
/// both name item 12. An id that does not start with an integer is kept as
/// "no id" rather than rejected, so that it is simply never found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemId(Option<i64>);

impl ItemId {
    /// Parses a raw id.
    pub fn parse(raw: &str) -> Self {
        Self(leading_integer(raw))
    }

    /// The id, if it was an integer.
    pub fn value(self) -> Option<i64> {
        self.0
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(Some(id))
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Reads the integer at the start of `raw`, ignoring whatever follows it.
///
/// Leading whitespace and a sign are skipped, and a `0x` prefix switches to hexadecimal.
fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (negative, rest) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let (radix, rest) = match rest.get(..2) {
        Some("0x" | "0X") => (16, &rest[2..]),
        _ => (10, rest),
    };
    let end = rest
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(rest.len());
    let magnitude = i64::from_str_radix(&rest[..end], radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Anything that can create an item.
pub trait CreateItem {
    /// Creates a new item.
    fn create_item(&mut self, new_item: NewItem) -> Item;
}

/// Anything that can fetch an item.
pub trait FetchItem {
    /// Fetches an item.
    fn fetch_item(&self, id: i64) -> Option<Item>;
}

/// Anything that can list items.
pub trait ListItems {
    /// Lists items.
    fn list_items(&self) -> Vec<Item>;
}

/// Anything that can update an item.
pub trait UpdateItem {
    /// Replaces the name and description of an item.
    fn update_item(&mut self, id: i64, new_item: NewItem) -> Option<Item>;
}

/// Anything that can delete an item.
pub trait DeleteItem {
    /// Deletes an item, returning it.
    fn delete_item(&mut self, id: i64) -> Option<Item>;
}

/// Items in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemTable {
    items: Vec<Item>,
}

impl ItemTable {
    /// Creates a table holding the given items.
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// Creates a table holding the two sample items every fresh service starts with.
    pub fn seeded(now: DateTime<Utc>) -> Self {
        let sample = |id, name: &str, description: &str| Item {
            id,
            name: name.to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: None,
        };
        Self::new(vec![
            sample(1, "Sample Item 1", "This is a sample item"),
            sample(2, "Sample Item 2", "Another sample item"),
        ])
    }

    /// The number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The id the next created item gets: one more than the largest id, or 1 if there are none.
    pub fn next_id(&self) -> i64 {
        self.items.iter().map(|item| item.id).fold(0, i64::max) + 1
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }
}

impl CreateItem for ItemTable {
    #[instrument(skip(self))]
    fn create_item(&mut self, new_item: NewItem) -> Item {
        let item = Item {
            id: self.next_id(),
            name: new_item.name,
            description: new_item.description,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.items.push(item.clone());
        tracing::info!("Item created: {} - {}", item.id, item.name);
        item
    }
}

impl FetchItem for ItemTable {
    #[instrument(skip(self))]
    fn fetch_item(&self, id: i64) -> Option<Item> {
        let item = self.items.iter().find(|item| item.id == id).cloned();
        tracing::debug!("Found item: {:?}", item);
        item
    }
}

impl ListItems for ItemTable {
    #[instrument(skip(self))]
    fn list_items(&self) -> Vec<Item> {
        tracing::info!("Retrieving {} items", self.items.len());
        self.items.clone()
    }
}

impl UpdateItem for ItemTable {
    #[instrument(skip(self))]
    fn update_item(&mut self, id: i64, new_item: NewItem) -> Option<Item> {
        let index = self.position(id)?;
        let item = &mut self.items[index];
        item.name = new_item.name;
        item.description = new_item.description;
        item.updated_at = Some(Utc::now());
        tracing::info!("Item updated: {}", id);
        Some(item.clone())
    }
}

impl DeleteItem for ItemTable {
    #[instrument(skip(self))]
    fn delete_item(&mut self, id: i64) -> Option<Item> {
        let index = self.position(id)?;
        let item = self.items.remove(index);
        tracing::info!("Item deleted: {}", id);
        Some(item)
    }
}

/// Shared access to an [`ItemTable`].
///
/// Every operation runs under one lock, so no request sees another request's half-done change.
#[derive(Clone, Debug, Default)]
pub struct ItemStore {
    table: Arc<Mutex<ItemTable>>,
}

impl ItemStore {
    /// Creates a store around a table.
    pub fn new(table: ItemTable) -> Self {
        Self {
            table: Arc::new(Mutex::new(table)),
        }
    }

    /// Creates a store holding the sample items.
    pub fn seeded() -> Self {
        Self::new(ItemTable::seeded(Utc::now()))
    }

    /// Takes exclusive access to the table until the guard is dropped.
    pub fn lock(&self) -> ApiResult<MutexGuard<'_, ItemTable>> {
        self.table
            .lock()
            .map_err(|_| InternalError::StorePoisoned.into())
    }
}
