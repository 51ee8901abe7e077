use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::menu::MenuError;
use crate::orders::OrderStatus;

/// Error types for order operations
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Menu item not found: {0}")]
    MenuItemNotFound(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order {0} was changed concurrently, retry the request")]
    ConcurrentUpdate(Uuid),

    #[error("Stored order is invalid: {0}")]
    InvalidDocument(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::DatabaseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for OrderError {
    fn from(err: validator::ValidationErrors) -> Self {
        OrderError::ValidationError(err.to_string())
    }
}

impl From<MenuError> for OrderError {
    fn from(err: MenuError) -> Self {
        match err {
            MenuError::NotFound(id) => OrderError::MenuItemNotFound(id),
            MenuError::DatabaseError(msg) => OrderError::DatabaseError(msg),
            MenuError::InvalidDocument(msg) => OrderError::InvalidDocument(msg),
            MenuError::ValidationError(msg) => OrderError::ValidationError(msg),
        }
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            OrderError::DatabaseError(msg) => {
                tracing::error!("Order database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            OrderError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Order with id {} not found", id),
            ),
            OrderError::MenuItemNotFound(id) => (
                StatusCode::BAD_REQUEST,
                format!("Menu item with id {} not found", id),
            ),
            OrderError::InvalidSelection(msg) => (StatusCode::BAD_REQUEST, msg),
            err @ OrderError::InvalidTransition { .. } => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            err @ OrderError::ConcurrentUpdate(_) => (StatusCode::CONFLICT, err.to_string()),
            OrderError::InvalidDocument(msg) => {
                tracing::error!("Invalid order document: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Stored data could not be read".to_string(),
                )
            }
            OrderError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
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
    fn test_status_codes() {
        let cases = vec![
            (OrderError::NotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (
                OrderError::MenuItemNotFound("x".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                OrderError::InvalidTransition {
                    from: OrderStatus::Cancelled,
                    to: OrderStatus::Pending,
                },
                StatusCode::BAD_REQUEST,
            ),
            (OrderError::ConcurrentUpdate(Uuid::nil()), StatusCode::CONFLICT),
            (
                OrderError::DatabaseError("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_transition_message() {
        let err = OrderError::InvalidTransition {
            from: OrderStatus::Cancelled,
            to: OrderStatus::Pending,
        };
        assert_eq!(
            err.to_string(),
            "Invalid status transition from cancelled to pending"
        );
    }

    #[test]
    fn test_menu_not_found_maps_to_menu_item_not_found() {
        let err: OrderError = MenuError::NotFound("latte".to_string()).into();
        assert!(matches!(err, OrderError::MenuItemNotFound(id) if id == "latte"));
    }
}
