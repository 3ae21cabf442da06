//! Middleware for modifying requests and responses.

use super::{
    config::Config,
    error::{ApiError, ErrorDetail, InternalError},
};
use axum::{
    body::{Body, Bytes, HttpBody as _},
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::BodyExt;
use tower_http::trace::MakeSpan;

static X_REQUEST_ID: &str = "x-request-id";

/// Creates a span per request, tagged with its request id.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MakeRequestIdSpan;

impl<B> MakeSpan<B> for MakeRequestIdSpan {
    fn make_span(&mut self, request: &http::Request<B>) -> tracing::Span {
        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|id| id.to_str().ok())
            .unwrap_or("unknown");
        tracing::info_span!(
            "request",
            request_id = request_id,
            method = %request.method(),
            uri = %request.uri(),
            version = ?request.version(),
        )
    }
}

/// The maximum size of a body to log.
const MAX_BODY_SIZE: u64 = 8192;

/// Print and log the request and response.
pub(crate) async fn log_request_response(
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    // Print request
    let (parts, body) = req.into_parts();
    let req = if fits_in_log(&body) {
        let body_bytes = buffer_and_print("Request", body).await?;
        Request::from_parts(parts, Body::from(body_bytes))
    } else {
        Request::from_parts(parts, body)
    };
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    // Perform request
    let res = next.run(req).await;

    // Print response
    let status = res.status();
    let (parts, body) = res.into_parts();
    let res = if fits_in_log(&body) {
        let body_bytes = buffer_and_print("Response", body).await?;
        Response::from_parts(parts, Body::from(body_bytes))
    } else {
        Response::from_parts(parts, body)
    };
    tracing::info!("{} {} {}", method, path, status.as_u16());

    Ok(res)
}

fn fits_in_log(body: &Body) -> bool {
    match body.size_hint().upper() {
        Some(n) => n <= MAX_BODY_SIZE,
        None => false,
    }
}

/// Read the entire body stream and store it in memory.
async fn buffer_and_print(direction: &str, body: Body) -> Result<Bytes, ApiError> {
    let body = body
        .collect()
        .await
        .map_err(|e| InternalError::Other(format!("failed to read {direction} body: {e}")))?
        .to_bytes();

    // Log if valid text
    if let Ok(body) = std::str::from_utf8(&body) {
        tracing::trace!("{} body = {:?}", direction, body);
    }

    Ok(body)
}

/// Adds the hidden cause of an error response as its `message`,
/// if the environment allows error details to be shown.
pub(crate) async fn disclose_error_details(
    State(config): State<Config>,
    req: Request,
    next: Next,
) -> Response {
    let res = next.run(req).await;
    if !config.environment.discloses_error_details() {
        return res;
    }
    let Some(ErrorDetail { body, message }) = res.extensions().get::<ErrorDetail>().cloned()
    else {
        return res;
    };
    let (parts, _) = res.into_parts();
    (parts, Json(body.with_message(message))).into_response()
}
