use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

/// Error types for inventory operations
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Ingredient not found: {0}")]
    IngredientNotFound(String),

    #[error("Menu item not found: {0}")]
    MenuItemNotFound(String),

    #[error("Stock alert not found: {0}")]
    AlertNotFound(Uuid),

    #[error("Inventory already deducted for order {0}")]
    AlreadyDeducted(Uuid),

    #[error("Failed to commit stock changes for recipe '{recipe}': {reason}")]
    CommitFailed { recipe: String, reason: String },

    #[error("Stored document is invalid: {0}")]
    InvalidDocument(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type InventoryResult<T> = Result<T, InventoryError>;

impl From<sqlx::Error> for InventoryError {
    fn from(err: sqlx::Error) -> Self {
        InventoryError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for InventoryError {
    fn from(err: serde_json::Error) -> Self {
        InventoryError::InvalidDocument(err.to_string())
    }
}

impl From<validator::ValidationErrors> for InventoryError {
    fn from(err: validator::ValidationErrors) -> Self {
        InventoryError::ValidationError(err.to_string())
    }
}

impl IntoResponse for InventoryError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            InventoryError::DatabaseError(msg) => {
                tracing::error!("Inventory database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            InventoryError::IngredientNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Ingredient with id {} not found", id),
            ),
            InventoryError::MenuItemNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Menu item with id {} not found", id),
            ),
            InventoryError::AlertNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Stock alert with id {} not found", id),
            ),
            InventoryError::AlreadyDeducted(order_id) => (
                StatusCode::CONFLICT,
                format!("Inventory already deducted for order {}", order_id),
            ),
            err @ InventoryError::CommitFailed { .. } => {
                tracing::error!("{}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            InventoryError::InvalidDocument(msg) => {
                tracing::error!("Invalid stored document: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Stored data could not be read".to_string(),
                )
            }
            InventoryError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = InventoryError::IngredientNotFound("milk".to_string());
        assert_eq!(error.to_string(), "Ingredient not found: milk");

        let error = InventoryError::CommitFailed {
            recipe: "Latte".to_string(),
            reason: "connection reset".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to commit stock changes for recipe 'Latte': connection reset"
        );
    }

    #[test]
    fn test_error_from_sqlx() {
        let error: InventoryError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, InventoryError::DatabaseError(_)));
    }

    #[test]
    fn test_status_codes() {
        let response = InventoryError::AlreadyDeducted(Uuid::nil()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = InventoryError::ValidationError("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
