//! A service for interacting with items.

use super::{
    item_repository::{CreateItem, DeleteItem, FetchItem, Item, ItemId, ListItems, UpdateItem},
    item_validation::ItemPayload,
};
use crate::infra::error::{ApiResult, ClientError};
use tracing::instrument;

/// Creates a new item.
#[instrument(skip(repository))]
pub fn create_item<R: CreateItem>(repository: &mut R, payload: ItemPayload) -> ApiResult<Item> {
    let new_item = payload.into_new_item()?;
    Ok(repository.create_item(new_item))
}

/// Read an item.
#[instrument(skip(repository))]
pub fn read_item<R: FetchItem>(repository: &R, id: ItemId) -> ApiResult<Item> {
    let item = id
        .value()
        .and_then(|id| repository.fetch_item(id))
        .ok_or(ClientError::ItemNotFound(id.value()))?;
    Ok(item)
}

/// Lists all items.
#[instrument(skip(repository))]
pub fn list_items<R: ListItems>(repository: &R) -> Vec<Item> {
    repository.list_items()
}

/// Replaces an item's name and description.
///
/// A missing item is reported before the payload is validated.
#[instrument(skip(repository))]
pub fn update_item<R: FetchItem + UpdateItem>(
    repository: &mut R,
    id: ItemId,
    payload: ItemPayload,
) -> ApiResult<Item> {
    let existing = read_item(repository, id)?;
    let new_item = payload.into_new_item()?;
    let item = repository
        .update_item(existing.id, new_item)
        .ok_or(ClientError::ItemNotFound(Some(existing.id)))?;
    Ok(item)
}

/// Deletes an item, returning it as it was.
#[instrument(skip(repository))]
pub fn delete_item<R: DeleteItem>(repository: &mut R, id: ItemId) -> ApiResult<Item> {
    let item = id
        .value()
        .and_then(|id| repository.delete_item(id))
        .ok_or(ClientError::ItemNotFound(id.value()))?;
    Ok(item)
}
