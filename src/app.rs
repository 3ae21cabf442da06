//! REST API implementation.
//!
//! # Examples
//!
//! Health probe.
//!
//! ```rust
//! # use item_store::{app::spawn_app, infra::config::Config};
//! # tokio_test::block_on(async {
//! # let url = spawn_app(Config::default()).await.unwrap();
//! let response = reqwest::get(format!("{url}/health")).await.unwrap();
//! assert_eq!(200, response.status());
//! # });
//! ```
//!
//! Create item.
//!
//! ```rust
//! # use item_store::{app::spawn_app, infra::config::Config};
//! # use item_store::feature::item::{item_api::ItemResponse, item_validation::ItemPayload};
//! # tokio_test::block_on(async {
//! # let url = spawn_app(Config::default()).await.unwrap();
//! let client = reqwest::ClientBuilder::default().build().unwrap();
//! let new_item = ItemPayload::new("Foo", "A very interesting item");
//! let response = client.post(format!("{url}/api/items")).json(&new_item).send().await.unwrap();
//! assert_eq!(201, response.status());
//! let item = response.json::<ItemResponse>().await.unwrap().data;
//! assert_eq!(3, item.id);
//! assert_eq!("Foo", item.name);
//! # });
//! ```

use crate::{
    feature::{health::health_api, item::item_api, item::item_repository::ItemStore},
    infra::{
        config::Config,
        error::{route_not_found, PanicHandler},
        middleware::{disclose_error_details, log_request_response, MakeRequestIdSpan},
        openapi,
        shutdown::shutdown_signal,
        state::AppState,
    },
};
use axum::{extract::DefaultBodyLimit, Router};
use http::{header::AUTHORIZATION, StatusCode};
use std::iter;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
    timeout::TimeoutLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Constructs the full axum application.
pub fn app(state: AppState) -> Router {
    let server = state.config().server.clone();

    Router::new()
        .merge(health_api::routes())
        .nest("/api", item_api::routes())
        .fallback(route_not_found)
        .with_state(state.clone())
        // OpenAPI document and Redoc
        .merge(openapi::routes())
        // Layers
        .layer(CatchPanicLayer::custom(PanicHandler))
        .layer(DefaultBodyLimit::max(server.body_limit))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            server.request_timeout,
        ))
        .layer(axum::middleware::from_fn(log_request_response))
        .layer(axum::middleware::from_fn_with_state(
            state,
            disclose_error_details,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(MakeRequestIdSpan)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(()),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(SetSensitiveRequestHeadersLayer::new(iter::once(
            AUTHORIZATION,
        )))
        .layer(CorsLayer::permissive())
        .layer(ConcurrencyLimitLayer::new(server.max_concurrent_requests))
}

/// Starts the axum server and runs it until a shutdown signal arrives.
pub async fn run_app(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    tracing::info!("Starting axum on {}", listener.local_addr()?);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("HTTP server closed");
    Ok(())
}

/// Spawn a server with the sample items on a random port, returning its base url.
pub async fn spawn_app(config: Config) -> std::io::Result<String> {
    let address = "127.0.0.1";
    let listener = TcpListener::bind(format!("{address}:0")).await?;
    let port = listener.local_addr()?.port();
    let state = AppState::new(config, ItemStore::seeded());
    tokio::spawn(async move {
        if let Err(e) = run_app(listener, state).await {
            tracing::error!("Server failed: {}", e);
        }
    });
    Ok(format!("http://{address}:{port}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::config::Environment;
    use axum::body::Body;
    use http::Request;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app(environment: &str) -> Router {
        let config = Config {
            environment: Environment::new(environment),
            ..Config::default()
        };
        app(AppState::new(config, ItemStore::seeded()))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn delete(uri: &str) -> Request<Body> {
        Request::delete(uri).body(Body::empty()).unwrap()
    }

    fn with_json(method: &str, uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(body.into())
            .unwrap()
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        with_json("POST", uri, body.to_string())
    }

    fn put(uri: &str, body: Value) -> Request<Body> {
        with_json("PUT", uri, body.to_string())
    }

    #[tokio::test]
    async fn health_is_always_healthy() {
        let app = test_app("test");
        let (status, body) = send(&app, get("/health")).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("healthy", body["status"]);
        assert_eq!("test", body["environment"]);
        assert!(body["uptime"].as_f64().unwrap() >= 0.0);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn ready_is_always_ready() {
        let app = test_app("test");
        let (status, body) = send(&app, get("/ready")).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(true, body["ready"]);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn list_returns_every_item_with_unique_ids() {
        let app = test_app("test");
        let (status, body) = send(&app, get("/api/items")).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(true, body["success"]);
        assert_eq!("Items retrieved successfully", body["message"]);
        let items = body["data"].as_array().unwrap();
        assert_eq!(2, body["count"]);
        assert_eq!(items.len(), 2);
        let mut ids: Vec<i64> = items.iter().map(|i| i["id"].as_i64().unwrap()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(2, ids.len());
    }

    #[tokio::test]
    async fn get_existing_item() {
        let app = test_app("test");
        let (status, body) = send(&app, get("/api/items/1")).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(true, body["success"]);
        assert_eq!(1, body["data"]["id"]);
        assert_eq!("Sample Item 1", body["data"]["name"]);
    }

    #[tokio::test]
    async fn get_missing_item_is_404() {
        let app = test_app("test");
        let (status, body) = send(&app, get("/api/items/999")).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert_eq!(
            json!({ "success": false, "error": "Item not found", "id": 999 }),
            body
        );
    }

    #[tokio::test]
    async fn non_integer_id_is_not_found() {
        let app = test_app("test");
        let (status, body) = send(&app, get("/api/items/abc")).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert_eq!("Item not found", body["error"]);
        assert_eq!(Value::Null, body["id"]);
    }

    #[tokio::test]
    async fn id_with_trailing_characters_uses_leading_integer() {
        let app = test_app("test");
        let (status, body) = send(&app, get("/api/items/1abc")).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(1, body["data"]["id"]);

        let (status, body) = send(&app, get("/api/items/2.0")).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(2, body["data"]["id"]);

        let (status, body) = send(&app, get("/api/items/999x")).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert_eq!(999, body["id"]);
    }

    #[tokio::test]
    async fn create_valid_item() {
        let app = test_app("test");
        let (status, body) = send(
            &app,
            post(
                "/api/items",
                json!({ "name": "  Test Item  ", "description": "This is a test item" }),
            ),
        )
        .await;
        assert_eq!(StatusCode::CREATED, status);
        assert_eq!(true, body["success"]);
        assert_eq!("Item created successfully", body["message"]);
        assert_eq!(3, body["data"]["id"]);
        assert_eq!("Test Item", body["data"]["name"]);
        assert!(body["data"]["createdAt"].is_string());
        assert!(body["data"].get("updatedAt").is_none());

        let (_, body) = send(&app, get("/api/items")).await;
        assert_eq!(3, body["count"]);
    }

    #[tokio::test]
    async fn create_with_missing_name_fails_validation() {
        let app = test_app("test");
        let (status, body) = send(
            &app,
            post("/api/items", json!({ "description": "No name provided" })),
        )
        .await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!(false, body["success"]);
        assert_eq!("Validation failed", body["error"]);
        assert_eq!(
            json!(["name is required and must be a string"]),
            body["details"]
        );
    }

    #[tokio::test]
    async fn create_with_short_name_fails_validation() {
        let app = test_app("test");
        let (status, body) = send(
            &app,
            post("/api/items", json!({ "name": "ab", "description": "Short name" })),
        )
        .await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!(false, body["success"]);
        assert!(body["details"][0]
            .as_str()
            .unwrap()
            .contains("at least 3 characters"));
    }

    #[tokio::test]
    async fn create_with_missing_description_fails_validation() {
        let app = test_app("test");
        let (status, body) =
            send(&app, post("/api/items", json!({ "name": "Test Item" }))).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!(false, body["success"]);
    }

    #[tokio::test]
    async fn update_existing_item() {
        let app = test_app("test");
        let (_, before) = send(&app, get("/api/items/2")).await;
        let (status, body) = send(
            &app,
            put(
                "/api/items/2",
                json!({ "name": "Renamed", "description": "A new description" }),
            ),
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("Item updated successfully", body["message"]);
        assert_eq!(before["data"]["id"], body["data"]["id"]);
        assert_eq!(before["data"]["createdAt"], body["data"]["createdAt"]);
        assert_eq!("Renamed", body["data"]["name"]);
        assert!(body["data"]["updatedAt"].is_string());

        let (_, after) = send(&app, get("/api/items/2")).await;
        assert_eq!(body["data"], after["data"]);
    }

    #[tokio::test]
    async fn update_missing_item_is_404() {
        let app = test_app("test");
        let (status, body) = send(
            &app,
            put(
                "/api/items/999",
                json!({ "name": "Renamed", "description": "A new description" }),
            ),
        )
        .await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert_eq!("Item not found", body["error"]);
        assert_eq!(999, body["id"]);

        let (status, _) = send(&app, put("/api/items/999", json!({}))).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
    }

    #[tokio::test]
    async fn update_with_invalid_item_fails_validation() {
        let app = test_app("test");
        let (status, body) = send(&app, put("/api/items/1", json!({ "name": "ab" }))).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!(
            json!([
                "name must be at least 3 characters",
                "description is required and must be a string"
            ]),
            body["details"]
        );
    }

    #[tokio::test]
    async fn delete_removes_item() {
        let app = test_app("test");
        let (_, before) = send(&app, get("/api/items/1")).await;
        let (status, body) = send(&app, delete("/api/items/1")).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("Item deleted successfully", body["message"]);
        assert_eq!(before["data"], body["data"]);

        let (status, body) = send(&app, get("/api/items/1")).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert_eq!("Item not found", body["error"]);

        let (status, _) = send(&app, delete("/api/items/1")).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
    }

    #[tokio::test]
    async fn ids_restart_at_one_when_all_items_are_deleted() {
        let app = test_app("test");
        send(&app, delete("/api/items/1")).await;
        send(&app, delete("/api/items/2")).await;
        let (status, body) = send(
            &app,
            post(
                "/api/items",
                json!({ "name": "Fresh", "description": "A fresh start" }),
            ),
        )
        .await;
        assert_eq!(StatusCode::CREATED, status);
        assert_eq!(1, body["data"]["id"]);
    }

    #[tokio::test]
    async fn unknown_route_is_generic_404() {
        let app = test_app("test");
        let (status, body) = send(&app, get("/api/unknown")).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert_eq!(
            json!({
                "success": false,
                "error": "not found",
                "path": "/api/unknown",
                "method": "GET"
            }),
            body
        );
    }

    #[tokio::test]
    async fn unknown_method_is_generic_404() {
        let app = test_app("test");
        let (status, body) = send(&app, post("/health", json!({}))).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert_eq!("not found", body["error"]);
        assert_eq!("POST", body["method"]);

        let req = Request::patch("/api/items/1").body(Body::empty()).unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert_eq!("/api/items/1", body["path"]);
        assert_eq!("PATCH", body["method"]);
    }

    #[tokio::test]
    async fn malformed_json_discloses_cause_in_development() {
        let app = test_app("development");
        let (status, body) = send(&app, with_json("POST", "/api/items", "{ not json")).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!(false, body["success"]);
        assert_eq!("Invalid JSON in request body", body["error"]);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn malformed_json_hides_cause_in_production() {
        let app = test_app("production");
        let (status, body) = send(&app, with_json("PUT", "/api/items/1", "[1, 2")).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!(
            json!({ "success": false, "error": "Invalid JSON in request body" }),
            body
        );
    }

    #[tokio::test]
    async fn primitive_json_body_is_invalid_json() {
        let app = test_app("test");
        for raw in ["\"Foo\"", "42", "null"] {
            let (status, body) = send(&app, with_json("POST", "/api/items", raw)).await;
            assert_eq!(StatusCode::BAD_REQUEST, status);
            assert_eq!("Invalid JSON in request body", body["error"]);
        }
    }

    #[tokio::test]
    async fn json_array_body_has_no_fields() {
        let app = test_app("test");
        let (status, body) = send(&app, with_json("POST", "/api/items", "[]")).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!("Validation failed", body["error"]);
        assert_eq!(
            json!([
                "name is required and must be a string",
                "description is required and must be a string"
            ]),
            body["details"]
        );
    }

    #[tokio::test]
    async fn body_without_content_type_has_no_fields() {
        let app = test_app("test");
        let req = Request::post("/api/items")
            .body(Body::from(r#"{"name":"Test Item","description":"This is a test item"}"#))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!("Validation failed", body["error"]);
        assert_eq!(2, body["details"].as_array().unwrap().len());

        let (status, body) = send(&app, with_json("PUT", "/api/items/1", "")).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!("Validation failed", body["error"]);
    }

    #[tokio::test]
    async fn create_item_from_urlencoded_form() {
        let app = test_app("test");
        let req = Request::post("/api/items")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from("name=Form+Item&description=Sent%20as%20a%20form"))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(StatusCode::CREATED, status);
        assert_eq!("Form Item", body["data"]["name"]);
        assert_eq!("Sent as a form", body["data"]["description"]);
    }

    #[tokio::test]
    async fn oversized_body_is_internal_error() {
        let app = test_app("production");
        let description = "x".repeat(200 * 1024);
        let (status, body) = send(
            &app,
            post("/api/items", json!({ "name": "Big", "description": description })),
        )
        .await;
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, status);
        assert_eq!(
            json!({ "success": false, "error": "Internal server error" }),
            body
        );
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let app = test_app("test");
        let res = app.oneshot(get("/ready")).await.unwrap();
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = test_app("test");
        let (status, body) = send(&app, get("/api/openapi.json")).await;
        assert_eq!(StatusCode::OK, status);
        assert!(body["paths"].get("/api/items/{id}").is_some());

        let res = app.oneshot(get("/api/redoc")).await.unwrap();
        assert_eq!(StatusCode::OK, res.status());
    }
}
