//! Liveness and readiness probes.

use crate::infra::{error::route_not_found, state::AppState};
use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The probe endpoints.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health).fallback(route_not_found))
        .route("/ready", get(ready).fallback(route_not_found))
}

/// The service is running.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Health {
    /// Always `healthy`.
    #[schema(example = "healthy")]
    pub status: String,
    /// When the probe was answered.
    pub timestamp: DateTime<Utc>,
    /// The environment the service runs in.
    #[schema(example = "development")]
    pub environment: String,
    /// Seconds since the service started.
    pub uptime: f64,
}

/// The service accepts traffic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Readiness {
    /// Always `true`, there are no dependencies to wait for.
    pub ready: bool,
    /// When the probe was answered.
    pub timestamp: DateTime<Utc>,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "The service is running", body = Health),
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    tracing::debug!("Health check requested");
    Json(Health {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        environment: state.config().environment.name().to_string(),
        uptime: state.uptime().as_secs_f64(),
    })
}

/// Readiness probe.
#[utoipa::path(
    get,
    path = "/ready",
    responses(
        (status = 200, description = "The service accepts traffic", body = Readiness),
    )
)]
pub async fn ready() -> Json<Readiness> {
    Json(Readiness {
        ready: true,
        timestamp: Utc::now(),
    })
}
