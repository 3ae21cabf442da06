//! Custom axum extractors.

use super::error::{ApiError, ClientError, InternalError};
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    Form,
};
use http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// The fields of a request body, sent either as JSON or as an urlencoded form.
///
/// A body of any other content type, a missing content type, an empty body
/// and a JSON array all read as `T::default()`. JSON that does not parse, or
/// that is a bare string, number, boolean or `null`, is rejected with
/// [`ClientError::InvalidJson`]. A body that cannot be read at all, such as
/// one over the size limit, is an [`InternalError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Payload<T>(pub T);

impl<T> AsRef<T> for Payload<T> {
    fn as_ref(&self) -> &T {
        &self.0
    }
}

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match BodyKind::of(&req) {
            BodyKind::Json => {
                let bytes = Bytes::from_request(req, state)
                    .await
                    .map_err(|e| InternalError::Other(e.body_text()))?;
                from_json(&bytes).map(Payload)
            }
            BodyKind::Form => {
                let Form(value) = Form::<T>::from_request(req, state)
                    .await
                    .map_err(|e| InternalError::Other(e.body_text()))?;
                Ok(Payload(value))
            }
            BodyKind::Other => Ok(Payload(T::default())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Other,
}

impl BodyKind {
    fn of(req: &Request) -> Self {
        let essence = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_ascii_lowercase());
        match essence.as_deref() {
            Some("application/json") => Self::Json,
            Some("application/x-www-form-urlencoded") => Self::Form,
            _ => Self::Other,
        }
    }
}

fn from_json<T>(bytes: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if bytes.is_empty() {
        return Ok(T::default());
    }
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| ClientError::InvalidJson(e.to_string()))?;
    match value {
        Value::Object(fields) => serde_json::from_value(Value::Object(fields))
            .map_err(|e| ClientError::InvalidJson(e.to_string()).into()),
        Value::Array(_) => Ok(T::default()),
        other => Err(ClientError::InvalidJson(format!(
            "expected an object or an array, found {other}"
        ))
        .into()),
    }
}
