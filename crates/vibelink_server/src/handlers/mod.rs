pub mod api;
pub mod blocks;
pub mod profile;

pub use api::api_routes;
pub use blocks::block_routes;
pub use profile::public_routes;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use vibelink_core::error::{SerializableError, VibelinkError};

/// Error response with a `{ "kind", "message" }` body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: SerializableError,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: SerializableError {
                kind: kind.to_string(),
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NotFound", message)
    }
}

impl From<VibelinkError> for ApiError {
    fn from(err: VibelinkError) -> Self {
        let status = match &err {
            VibelinkError::Validation(_) => StatusCode::BAD_REQUEST,
            VibelinkError::NotFound(_) => StatusCode::NOT_FOUND,
            VibelinkError::CorruptRow { .. } | VibelinkError::Store(_) => {
                tracing::error!("Store failure: {}", err);
                StatusCode::SERVICE_UNAVAILABLE
            }
        };
        Self {
            status,
            body: err.to_serializable(),
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, _) = &err
            && failure.code == rusqlite::ErrorCode::ConstraintViolation
        {
            // A concurrent writer won a UNIQUE race
            tracing::warn!("Constraint violation: {}", err);
            return Self::new(StatusCode::CONFLICT, "Conflict", "Value is already taken");
        }
        tracing::error!("Database error: {}", err);
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "Store", err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
