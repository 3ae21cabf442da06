//! Types for reporting errors that happened during a request.
//!
//! Every error is rendered as an [`ErrorBody`]. Errors that wrap an underlying
//! cause attach an [`ErrorDetail`] to the response, which
//! [`disclose_error_details`](super::middleware::disclose_error_details)
//! turns into a `message` field when the environment allows it.

use axum::{extract::OriginalUri, response::IntoResponse, Json};
use http::{Method, StatusCode};
use serde::Serialize;
use tower_http::catch_panic::ResponseForPanic;
use utoipa::ToSchema;

/// A standard error response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    success: bool,
    /// A short description of the error.
    #[schema(example = "Item not found")]
    error: String,
    /// Every violated validation rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
    /// The requested item id, `null` if it was not an integer.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i64>)]
    id: Option<Option<i64>>,
    /// The requested path of an unknown route.
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    /// The requested method of an unknown route.
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    /// The underlying cause, only shown in development.
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl ErrorBody {
    pub(crate) fn new(error: String) -> Self {
        Self {
            success: false,
            error,
            details: None,
            id: None,
            path: None,
            method: None,
            message: None,
        }
    }

    pub(crate) fn with_message(mut self, message: String) -> Self {
        self.message = Some(message);
        self
    }
}

/// The hidden cause of an error response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorDetail {
    /// The body that was sent.
    pub body: ErrorBody,
    /// The cause that was left out of it.
    pub message: String,
}

/// An error from our API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// An error caused by the client.
    #[error("{0}")]
    ClientError(#[from] ClientError),
    /// An internal error.
    #[error("{0}")]
    InternalError(#[from] InternalError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::ClientError(e) => e.into_response(),
            ApiError::InternalError(e) => e.into_response(),
        }
    }
}

/// The result of calling API-related functions.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors caused by the client.
/// The client can do something to fix these.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The submitted item broke one or more rules.
    #[error("Validation failed")]
    Validation(Vec<String>),
    /// No item has the requested id.
    #[error("Item not found")]
    ItemNotFound(Option<i64>),
    /// No route matches the request.
    #[error("not found")]
    RouteNotFound {
        /// The requested method.
        method: String,
        /// The requested path.
        path: String,
    },
    /// The request body was not a JSON object.
    #[error("Invalid JSON in request body")]
    InvalidJson(String),
}

impl IntoResponse for ClientError {
    fn into_response(self) -> axum::response::Response {
        let mut body = ErrorBody::new(self.to_string());
        let mut detail = None;
        let status = match self {
            Self::Validation(details) => {
                body.details = Some(details);
                StatusCode::BAD_REQUEST
            }
            Self::ItemNotFound(id) => {
                body.id = Some(id);
                StatusCode::NOT_FOUND
            }
            Self::RouteNotFound { method, path } => {
                body.method = Some(method);
                body.path = Some(path);
                StatusCode::NOT_FOUND
            }
            Self::InvalidJson(message) => {
                detail = Some(message);
                StatusCode::BAD_REQUEST
            }
        };
        respond(status, body, detail)
    }
}

/// An internal error.
/// The client cannot do anything about this.
#[derive(Debug, thiserror::Error)]
pub enum InternalError {
    /// A request panicked while holding the item store.
    #[error("item store lock poisoned")]
    StorePoisoned,
    /// A handler panicked.
    #[error("{0}")]
    Panic(String),
    /// Other miscellaneous errors.
    #[error("{0}")]
    Other(String),
}

impl IntoResponse for InternalError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("internal error: {}", self);
        let body = ErrorBody::new("Internal server error".to_string());
        respond(
            StatusCode::INTERNAL_SERVER_ERROR,
            body,
            Some(self.to_string()),
        )
    }
}

fn respond(status: StatusCode, body: ErrorBody, message: Option<String>) -> axum::response::Response {
    let mut response = (status, Json(body.clone())).into_response();
    if let Some(message) = message {
        response
            .extensions_mut()
            .insert(ErrorDetail { body, message });
    }
    response
}

/// Responds to requests that match no route.
pub async fn route_not_found(method: Method, OriginalUri(uri): OriginalUri) -> ClientError {
    ClientError::RouteNotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}

/// A handler for converting panics into proper responses for the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanicHandler;

impl ResponseForPanic for PanicHandler {
    type ResponseBody = axum::body::Body;

    fn response_for_panic(
        &mut self,
        err: Box<dyn std::any::Any + Send + 'static>,
    ) -> http::Response<Self::ResponseBody> {
        let message = if let Some(s) = err.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = err.downcast_ref::<&str>() {
            s.to_string()
        } else {
            "Panic".to_string()
        };
        ApiError::InternalError(InternalError::Panic(message)).into_response()
    }
}
