//! # API Errors
//!
//! Maps catalog errors and extractor rejections to HTTP responses with a
//! JSON body `{ "success": false, "error": "<message>" }`.

use super::types::ErrorResponse;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storefront_core::StoreError;
use thiserror::Error;

/// Error returned by every fallible handler.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A catalog operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The request could not be decoded.
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(e) => match e {
                StoreError::CategoryNotFound(_) | StoreError::ProductNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                StoreError::InvalidInput(_)
                | StoreError::HasChildren(_)
                | StoreError::HasProducts(..)
                | StoreError::CycleDetected { .. } => StatusCode::BAD_REQUEST,
                StoreError::Conflict(_) => StatusCode::CONFLICT,
                StoreError::SerializationError(_)
                | StoreError::DeserializationError(_)
                | StoreError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(error = %message, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %message, "Request rejected");
        }
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::{CategoryId, ProductId};

    #[test]
    fn status_mapping() {
        let cases = [
            (StoreError::CategoryNotFound(CategoryId(1)), StatusCode::NOT_FOUND),
            (StoreError::ProductNotFound(ProductId(1)), StatusCode::NOT_FOUND),
            (StoreError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (StoreError::HasChildren(CategoryId(1)), StatusCode::BAD_REQUEST),
            (StoreError::HasProducts(CategoryId(1), 2), StatusCode::BAD_REQUEST),
            (
                StoreError::CycleDetected {
                    id: CategoryId(1),
                    parent: CategoryId(2),
                },
                StatusCode::BAD_REQUEST,
            ),
            (StoreError::Conflict("slug".into()), StatusCode::CONFLICT),
            (StoreError::IoError("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).status(), expected);
        }
    }

    #[test]
    fn message_is_the_store_error_text() {
        let error = ApiError::from(StoreError::HasChildren(CategoryId(4)));
        assert_eq!(
            error.to_string(),
            "Category 4 has subcategories. Remove children first."
        );
    }

    #[test]
    fn is_a_std_error() {
        let error: Box<dyn std::error::Error + Send + Sync> =
            Box::new(ApiError::BadRequest("Invalid JSON body: missing field `name`".into()));
        assert_eq!(error.to_string(), "Invalid JSON body: missing field `name`");

        let store: Box<dyn std::error::Error + Send + Sync> =
            Box::new(ApiError::from(StoreError::Conflict("slug".into())));
        assert_eq!(store.to_string(), StoreError::Conflict("slug".into()).to_string());
    }
}
