use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::inventory::OrderDeductionReport;

/// Order status enum representing the lifecycle of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One option chosen for an ordered item, addressed by group and option name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    pub group_name: String,
    pub option_name: String,
}

/// An ordered menu item with the configuration and price captured at order time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub menu_item_id: String,
    pub name: String,
    pub size: Option<String>,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
    pub quantity: u32,
    /// Unit price (size price plus option surcharges) when the order was placed
    pub price_snapshot: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub status: OrderStatus,
    pub line_items: Vec<OrderLineItem>,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for one line of a new order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderLineRequest {
    #[validate(length(min = 1, message = "menu_item_id must not be empty"))]
    pub menu_item_id: String,
    pub size: Option<String>,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,
}

/// Request DTO for creating a new order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderLineRequest>,
}

impl CreateOrderRequest {
    /// Validate the request and each of its lines
    pub fn validate_all(&self) -> Result<(), validator::ValidationErrors> {
        self.validate()?;
        self.items.iter().try_for_each(Validate::validate)
    }
}

/// Request DTO for updating order status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Outcome of a status change
///
/// `inventory_deduction` is present when the change confirmed the order. A
/// deduction that could not run at all is reported in `deduction_error`; the
/// status change itself still stands.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdateResponse {
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_deduction: Option<OrderDeductionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deduction_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(OrderStatus::Confirmed).unwrap(),
            json!("confirmed")
        );
        let parsed: OrderStatus = serde_json::from_value(json!("cancelled")).unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
    }

    #[test]
    fn test_create_order_requires_items() {
        let request = CreateOrderRequest { items: vec![] };
        assert!(request.validate_all().is_err());
    }

    #[test]
    fn test_create_order_rejects_zero_quantity() {
        let request = CreateOrderRequest {
            items: vec![OrderLineRequest {
                menu_item_id: "latte".to_string(),
                size: None,
                selected_options: vec![],
                quantity: 0,
            }],
        };
        assert!(request.validate().is_ok());
        assert!(request.validate_all().is_err());
    }

    #[test]
    fn test_line_request_defaults_options() {
        let line: OrderLineRequest =
            serde_json::from_value(json!({ "menu_item_id": "latte", "quantity": 2 })).unwrap();
        assert!(line.selected_options.is_empty());
        assert!(line.validate().is_ok());
    }
}
