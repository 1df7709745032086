use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use error_stack::Report;
use std::error::Error;
use tracing::error;

use crate::responses::ApiError;

/// Returned by handlers for failures that are not the caller's fault.
/// Always a 500; the full report is logged, never sent.
#[derive(thiserror::Error)]
#[error("there was an error running the endpoint")]
pub struct EndpointError<T: Error>(Report<T>);

impl<T: Error> std::fmt::Debug for EndpointError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<T> From<Report<T>> for EndpointError<T>
where
    T: Error,
{
    fn from(value: Report<T>) -> Self {
        Self(value)
    }
}

impl<T: Error> IntoResponse for EndpointError<T> {
    fn into_response(self) -> Response {
        error!("endpoint failed: {:?}", self.0);
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "an internal error occurred",
        )
        .into_response()
    }
}
