//! OpenAPI configuration.

use crate::feature::{
    health::health_api,
    item::{item_api, item_repository, item_validation},
};
use axum::{routing::get, Json, Router};
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

/// OpenApi configuration.
#[derive(OpenApi)]
#[openapi(
    paths(
        health_api::health,
        health_api::ready,
        item_api::list_items,
        item_api::get_item,
        item_api::create_item,
        item_api::update_item,
        item_api::delete_item,
    ),
    components(
        schemas(
            health_api::Health,
            health_api::Readiness,
            item_repository::Item,
            item_validation::ItemPayload,
            item_api::ItemResponse,
            item_api::ItemListResponse,
            crate::infra::error::ErrorBody
        )
    )
)]
#[derive(Clone, Copy, Debug)]
pub struct ApiDoc;

/// Serves the OpenAPI document and a Redoc UI for it.
pub fn routes() -> Router {
    Router::new()
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Redoc::with_url("/api/redoc", ApiDoc::openapi()))
}
