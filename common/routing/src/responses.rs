use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::borrow::Cow;

pub type ErrorMessageType = Cow<'static, str>;

#[derive(Debug, Serialize)]
pub struct EntityResponse<T> {
    #[serde(skip)]
    status_code: StatusCode,
    #[serde(flatten)]
    entity: T,
}

impl<T> EntityResponse<T> {
    pub fn ok(entity: T) -> Self {
        Self {
            status_code: StatusCode::OK,
            entity,
        }
    }

    pub fn created(entity: T) -> Self {
        Self {
            status_code: StatusCode::CREATED,
            entity,
        }
    }
}

impl<T: Serialize> IntoResponse for EntityResponse<T> {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}

/// Body of a successful bulk import.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ImportResponse {
    detail: &'static str,
    batches: usize,
    imported: usize,
}

impl ImportResponse {
    pub fn new(batches: usize, imported: usize) -> Self {
        Self {
            detail: "Successfully imported",
            batches,
            imported,
        }
    }
}

impl IntoResponse for ImportResponse {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self)).into_response()
    }
}

/// `{"detail": "...", "kind": "..."}`. `kind` is only present when the
/// caller can act on it, e.g. to tell a duplicate key from a missing reference.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status_code: StatusCode,
    detail: ErrorMessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

impl ApiError {
    pub fn new(status_code: StatusCode, detail: impl Into<ErrorMessageType>) -> Self {
        Self {
            status_code,
            detail: detail.into(),
            kind: None,
        }
    }

    pub fn not_found(detail: impl Into<ErrorMessageType>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    pub fn bad_request(detail: impl Into<ErrorMessageType>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn unprocessable_entity(detail: impl Into<ErrorMessageType>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }

    pub fn with_kind(mut self, kind: &'static str) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_is_omitted_when_not_set() {
        let error = ApiError::not_found("theme 3 was not found");

        assert_eq!(
            json!({"detail": "theme 3 was not found"}),
            serde_json::to_value(&error).unwrap()
        );
        assert_eq!(StatusCode::NOT_FOUND, error.status_code());
    }

    #[test]
    fn kind_is_serialized_next_to_detail() {
        let error = ApiError::bad_request("import failed").with_kind("duplicate_key");

        assert_eq!(
            json!({"detail": "import failed", "kind": "duplicate_key"}),
            serde_json::to_value(&error).unwrap()
        );
    }
}
