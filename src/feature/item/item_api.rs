//! The item API implementation.

use super::{
    item_repository::{Item, ItemId, ItemStore},
    item_service,
    item_validation::ItemPayload,
};
use crate::infra::{
    error::{route_not_found, ApiResult},
    extract::Payload,
    response::ApiResponse,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

/// The item API endpoints.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/items",
            get(list_items).post(create_item).fallback(route_not_found),
        )
        .route(
            "/items/:id",
            get(get_item)
                .put(update_item)
                .delete(delete_item)
                .fallback(route_not_found),
        )
}

/// A single item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ItemResponse {
    /// Always `true`.
    pub success: bool,
    /// What happened.
    #[schema(example = "Item retrieved successfully")]
    pub message: String,
    /// The item.
    pub data: Item,
}

impl ItemResponse {
    fn new(message: &str, data: Item) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data,
        }
    }
}

/// All items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ItemListResponse {
    /// Always `true`.
    pub success: bool,
    /// What happened.
    #[schema(example = "Items retrieved successfully")]
    pub message: String,
    /// The items, in the order they were created.
    pub data: Vec<Item>,
    /// The number of items.
    pub count: usize,
}

/// Lists all items.
#[utoipa::path(
    get,
    path = "/api/items",
    responses(
        (status = 200, description = "Every item", body = ItemListResponse),
    )
)]
#[instrument(skip_all)]
pub async fn list_items(
    State(store): State<ItemStore>,
) -> ApiResult<ApiResponse<200, ItemListResponse>> {
    let items = item_service::list_items(&*store.lock()?);
    Ok(ApiResponse::ok(ItemListResponse {
        success: true,
        message: "Items retrieved successfully".to_string(),
        count: items.len(),
        data: items,
    }))
}

/// Gets an item.
#[utoipa::path(
    get,
    path = "/api/items/{id}",
    params(("id" = String, Path, description = "The item id")),
    responses(
        (status = 200, description = "The item", body = ItemResponse),
        (status = 404, description = "No item has this id", body = ErrorBody),
    )
)]
#[instrument(skip(store))]
pub async fn get_item(
    State(store): State<ItemStore>,
    Path(id): Path<ItemId>,
) -> ApiResult<ApiResponse<200, ItemResponse>> {
    let item = item_service::read_item(&*store.lock()?, id)?;
    tracing::info!("Retrieved item: {}", item.id);
    Ok(ApiResponse::ok(ItemResponse::new(
        "Item retrieved successfully",
        item,
    )))
}

/// Creates a new item.
#[utoipa::path(
    post,
    path = "/api/items",
    request_body = ItemPayload,
    responses(
        (status = 201, description = "The created item", body = ItemResponse),
        (status = 400, description = "Invalid item or malformed JSON", body = ErrorBody),
    )
)]
#[instrument(skip(store))]
pub async fn create_item(
    State(store): State<ItemStore>,
    Payload(payload): Payload<ItemPayload>,
) -> ApiResult<ApiResponse<201, ItemResponse>> {
    let item = item_service::create_item(&mut *store.lock()?, payload)?;
    Ok(ApiResponse::created(ItemResponse::new(
        "Item created successfully",
        item,
    )))
}

/// Updates an item.
#[utoipa::path(
    put,
    path = "/api/items/{id}",
    params(("id" = String, Path, description = "The item id")),
    request_body = ItemPayload,
    responses(
        (status = 200, description = "The updated item", body = ItemResponse),
        (status = 400, description = "Invalid item or malformed JSON", body = ErrorBody),
        (status = 404, description = "No item has this id", body = ErrorBody),
    )
)]
#[instrument(skip(store))]
pub async fn update_item(
    State(store): State<ItemStore>,
    Path(id): Path<ItemId>,
    Payload(payload): Payload<ItemPayload>,
) -> ApiResult<ApiResponse<200, ItemResponse>> {
    let item = item_service::update_item(&mut *store.lock()?, id, payload)?;
    Ok(ApiResponse::ok(ItemResponse::new(
        "Item updated successfully",
        item,
    )))
}

/// Deletes an item.
#[utoipa::path(
    delete,
    path = "/api/items/{id}",
    params(("id" = String, Path, description = "The item id")),
    responses(
        (status = 200, description = "The deleted item", body = ItemResponse),
        (status = 404, description = "No item has this id", body = ErrorBody),
    )
)]
#[instrument(skip(store))]
pub async fn delete_item(
    State(store): State<ItemStore>,
    Path(id): Path<ItemId>,
) -> ApiResult<ApiResponse<200, ItemResponse>> {
    let item = item_service::delete_item(&mut *store.lock()?, id)?;
    Ok(ApiResponse::ok(ItemResponse::new(
        "Item deleted successfully",
        item,
    )))
}
