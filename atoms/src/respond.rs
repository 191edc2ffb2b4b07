use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;

use crate::error::StoreError;

/// Listing payload. `notice` is set when the listing degraded to empty.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl<T> ListResponse<T> {
    pub fn ok(items: Vec<T>) -> Self {
        Self { items, notice: None }
    }

    pub fn degraded(notice: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            notice: Some(notice.into()),
        }
    }
}

pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(value)?.into())
        .map_err(Box::new)?)
}

pub fn error(status: StatusCode, message: impl std::fmt::Display) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(
            serde_json::json!({ "error": message.to_string() })
                .to_string()
                .into(),
        )
        .map_err(Box::new)?)
}

pub fn no_content() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Body::Empty)
        .map_err(Box::new)?)
}

pub fn not_found() -> Result<Response<Body>, Error> {
    error(StatusCode::NOT_FOUND, "Not found")
}

/// Render a store failure: missing records are 404, conflicts 409, the rest 500.
pub fn store_error(err: &StoreError) -> Result<Response<Body>, Error> {
    match err {
        StoreError::NotFound { .. } => error(StatusCode::NOT_FOUND, err),
        StoreError::Conflict(_) => error(StatusCode::CONFLICT, err),
        _ => error(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}
