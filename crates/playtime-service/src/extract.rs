//! Request extractors with API-shaped rejections.

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json` whose rejections render as `{error:{code,message}}`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        Self::BadRequest(rejection.body_text())
    }
}
