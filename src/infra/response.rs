//! Successful responses with a fixed status code.

use axum::{response::IntoResponse, Json};
use http::StatusCode;
use serde::Serialize;

/// A JSON response body sent with the status code `STATUS`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse<const STATUS: u16, T>(pub T);

impl<T> ApiResponse<200, T> {
    /// 200 OK.
    pub fn ok(body: T) -> Self {
        Self(body)
    }
}

impl<T> ApiResponse<201, T> {
    /// 201 Created.
    pub fn created(body: T) -> Self {
        Self(body)
    }
}

impl<const STATUS: u16, T: Serialize> IntoResponse for ApiResponse<STATUS, T> {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(STATUS).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}
