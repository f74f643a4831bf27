//! Request extractors whose rejections answer in the `ApiError` body.
//!
//! axum's own `Json`, `Query` and `Path` reply with plain text when the
//! request does not deserialize. These wrappers run the same extraction and
//! turn the rejection into `VALIDATION_ERROR`, so every failure a client can
//! see has the `{code, message}` shape.
//!
//! `Json` is also the response type handlers return.

use axum::extract::{FromRequest, FromRequestParts};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::ApiError;

/// JSON request body, and JSON response.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query string parameters.
#[derive(Debug, Clone, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);

/// Path segments such as `/{id}`.
#[derive(Debug, Clone, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);
