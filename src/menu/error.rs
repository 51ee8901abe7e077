use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::inventory::InventoryError;

/// Error types for menu operations
#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Menu item not found: {0}")]
    NotFound(String),

    #[error("Stored menu document is invalid: {0}")]
    InvalidDocument(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type MenuResult<T> = Result<T, MenuError>;

impl From<sqlx::Error> for MenuError {
    fn from(err: sqlx::Error) -> Self {
        MenuError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for MenuError {
    fn from(err: serde_json::Error) -> Self {
        MenuError::InvalidDocument(err.to_string())
    }
}

impl From<validator::ValidationErrors> for MenuError {
    fn from(err: validator::ValidationErrors) -> Self {
        MenuError::ValidationError(err.to_string())
    }
}

impl From<MenuError> for InventoryError {
    fn from(err: MenuError) -> Self {
        match err {
            MenuError::DatabaseError(msg) => InventoryError::DatabaseError(msg),
            MenuError::NotFound(id) => InventoryError::MenuItemNotFound(id),
            MenuError::InvalidDocument(msg) => InventoryError::InvalidDocument(msg),
            MenuError::ValidationError(msg) => InventoryError::ValidationError(msg),
        }
    }
}

impl IntoResponse for MenuError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            MenuError::DatabaseError(msg) => {
                tracing::error!("Menu database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            MenuError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Menu item with id {} not found", id),
            ),
            MenuError::InvalidDocument(msg) => {
                tracing::error!("Invalid menu document: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Stored data could not be read".to_string(),
                )
            }
            MenuError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
