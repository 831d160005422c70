use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{error::ActionError, storage::StorageError};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Action(#[from] ActionError),
    /// No session, or the token did not verify.
    #[error("Unauthorized")]
    Unauthenticated,
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Action(err) => match err {
                ActionError::Validation(_) => StatusCode::BAD_REQUEST,
                ActionError::Unauthorized => StatusCode::FORBIDDEN,
                ActionError::NotFound(_) => StatusCode::NOT_FOUND,
                ActionError::InvalidState(_) | ActionError::Conflict(_) => StatusCode::CONFLICT,
                ActionError::Store { .. } | ActionError::Storage(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Storage(StorageError::InvalidKey(_)) => StatusCode::BAD_REQUEST,
            ApiError::Storage(StorageError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Storage(StorageError::NotFound(_)) => "File not found".to_string(),
            ApiError::Storage(StorageError::InvalidKey(_)) => "Invalid file path".to_string(),
            ApiError::Storage(StorageError::Io(_)) => "Failed to read file".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, "Request failed");
        }
        (status, Json(ApiResponse::<()>::error(self.message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_errors_map_to_statuses() {
        let cases = [
            (ApiError::from(ActionError::validation("Name is required")), StatusCode::BAD_REQUEST),
            (ApiError::from(ActionError::Unauthorized), StatusCode::FORBIDDEN),
            (ApiError::from(ActionError::NotFound("Room")), StatusCode::NOT_FOUND),
            (
                ApiError::from(ActionError::invalid_state("Only active activities can be closed")),
                StatusCode::CONFLICT,
            ),
            (ApiError::Unauthenticated, StatusCode::UNAUTHORIZED),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status);
        }
    }

    #[test]
    fn store_failures_only_expose_the_context() {
        let err = ApiError::from(ActionError::Store {
            context: "Failed to update building",
            source: sqlx::Error::PoolTimedOut,
        });
        assert_eq!(err.message(), "Failed to update building");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
