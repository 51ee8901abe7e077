use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{validate_non_negative, validate_positive};

/// Unit of measure an ingredient is stocked in
///
/// Recipe quantities are interpreted in the ingredient's own unit; no conversion
/// between units is ever performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Gram,
    Kg,
    Ml,
    Liter,
    Piece,
    Cup,
    Tablespoon,
    Teaspoon,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Gram => "gram",
            Unit::Kg => "kg",
            Unit::Ml => "ml",
            Unit::Liter => "liter",
            Unit::Piece => "piece",
            Unit::Cup => "cup",
            Unit::Tablespoon => "tablespoon",
            Unit::Teaspoon => "teaspoon",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ingredient category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IngredientCategory {
    Dairy,
    Protein,
    Vegetables,
    Fruits,
    Grains,
    Spices,
    Beverages,
    Other,
}

impl Default for IngredientCategory {
    fn default() -> Self {
        IngredientCategory::Other
    }
}

/// A stocked raw material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Ingredient {
    #[schema(example = "b1f0c1de-5a8e-4a40-9d67-3c0a4b0f6f11")]
    pub id: String,
    #[schema(example = "Milk")]
    pub name: String,
    pub unit: Unit,
    /// Never negative; deductions floor at zero
    #[schema(value_type = String, example = "10")]
    pub current_quantity: Decimal,
    #[schema(value_type = String, example = "2")]
    pub minimum_threshold: Decimal,
    /// Minor currency units per one `unit`
    #[schema(value_type = String, example = "25000")]
    pub cost_per_unit: Decimal,
    pub supplier: Option<String>,
    pub category: IngredientCategory,
    pub is_active: bool,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Severity of a low-stock condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Low,
    Critical,
    OutOfStock,
}

impl AlertLevel {
    /// Derive the level for a quantity that is already at or below its threshold.
    ///
    /// Out of stock at zero (or below), critical at half the threshold or less,
    /// low otherwise.
    pub fn for_quantity(quantity: Decimal, minimum_threshold: Decimal) -> Self {
        if quantity <= Decimal::ZERO {
            AlertLevel::OutOfStock
        } else if quantity <= minimum_threshold * Decimal::new(5, 1) {
            AlertLevel::Critical
        } else {
            AlertLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Low => "low",
            AlertLevel::Critical => "critical",
            AlertLevel::OutOfStock => "out_of_stock",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// True when a quantity has fallen to the point where staff should be told.
pub fn is_below_threshold(quantity: Decimal, minimum_threshold: Decimal) -> bool {
    quantity <= minimum_threshold
}

/// Low-stock alert; at most one unacknowledged alert exists per ingredient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StockAlert {
    pub id: Uuid,
    pub ingredient_id: String,
    pub ingredient_name: String,
    #[schema(value_type = String)]
    pub current_quantity: Decimal,
    #[schema(value_type = String)]
    pub minimum_threshold: Decimal,
    pub alert_level: AlertLevel,
    pub acknowledged: bool,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Kind of stock movement recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Purchase,
    Usage,
    Waste,
    Adjustment,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Purchase => "purchase",
            TransactionType::Usage => "usage",
            TransactionType::Waste => "waste",
            TransactionType::Adjustment => "adjustment",
        }
    }
}

/// Immutable audit record of a stock movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct InventoryTransaction {
    pub id: Uuid,
    pub ingredient_id: String,
    pub ingredient_name: String,
    pub transaction_type: TransactionType,
    #[schema(value_type = String)]
    pub quantity: Decimal,
    pub unit: Unit,
    pub reason: String,
    pub order_id: Option<Uuid>,
    pub performed_by: String,
    pub created_at: DateTime<Utc>,
}

/// Transaction record staged before the movement is committed
#[derive(Debug, Clone, PartialEq)]
pub struct NewInventoryTransaction {
    pub ingredient_id: String,
    pub ingredient_name: String,
    pub transaction_type: TransactionType,
    pub quantity: Decimal,
    pub unit: Unit,
    pub reason: String,
    pub order_id: Option<Uuid>,
    pub performed_by: String,
}

/// How a movement changes the stored quantity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StockChange {
    /// Subtract, flooring the result at zero
    Consume(Decimal),
    Receive(Decimal),
    /// Replace the quantity outright (stock count)
    SetTo(Decimal),
}

impl StockChange {
    /// Quantity after applying this change to `current`
    pub fn apply(&self, current: Decimal) -> Decimal {
        match *self {
            StockChange::Consume(amount) => (current - amount).max(Decimal::ZERO),
            StockChange::Receive(amount) => current + amount,
            StockChange::SetTo(amount) => amount.max(Decimal::ZERO),
        }
    }
}

/// A quantity change plus the audit record that must be written with it
#[derive(Debug, Clone, PartialEq)]
pub struct StockMovement {
    pub change: StockChange,
    pub transaction: NewInventoryTransaction,
}

impl StockMovement {
    pub fn ingredient_id(&self) -> &str {
        &self.transaction.ingredient_id
    }
}

/// Post-commit quantity of an ingredient touched by a movement batch
#[derive(Debug, Clone, PartialEq)]
pub struct StockLevel {
    pub ingredient_id: String,
    pub ingredient_name: String,
    pub current_quantity: Decimal,
    pub minimum_threshold: Decimal,
}

impl From<&Ingredient> for StockLevel {
    fn from(ingredient: &Ingredient) -> Self {
        Self {
            ingredient_id: ingredient.id.clone(),
            ingredient_name: ingredient.name.clone(),
            current_quantity: ingredient.current_quantity,
            minimum_threshold: ingredient.minimum_threshold,
        }
    }
}

/// State of an order's inventory deduction in the idempotency ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeductionStatus {
    InProgress,
    Applied,
    NeedsReview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DeductionRecord {
    pub order_id: Uuid,
    pub status: DeductionStatus,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating an ingredient
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateIngredientRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    #[schema(example = "Milk")]
    pub name: String,
    pub unit: Unit,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = String, example = "10")]
    pub current_quantity: Decimal,
    #[schema(value_type = String, example = "2")]
    pub minimum_threshold: Decimal,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = String, example = "25000")]
    pub cost_per_unit: Decimal,
    pub supplier: Option<String>,
    #[serde(default)]
    pub category: IngredientCategory,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub expiry_date: Option<NaiveDate>,
}

fn default_active() -> bool {
    true
}

/// Request DTO for a partial ingredient edit
///
/// A changed `current_quantity` is recorded as an adjustment transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateIngredientRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,
    pub unit: Option<Unit>,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = Option<String>)]
    pub current_quantity: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub minimum_threshold: Option<Decimal>,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = Option<String>)]
    pub cost_per_unit: Option<Decimal>,
    pub supplier: Option<String>,
    pub category: Option<IngredientCategory>,
    pub is_active: Option<bool>,
    pub expiry_date: Option<NaiveDate>,
}

/// Request DTO for restock and waste movements
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct StockQuantityRequest {
    #[validate(custom = "validate_positive")]
    #[schema(value_type = String, example = "5")]
    pub quantity: Decimal,
    pub reason: Option<String>,
}

/// Request DTO for a stock count
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AdjustStockRequest {
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = String, example = "7.5")]
    pub quantity: Decimal,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AcknowledgeAlertRequest {
    #[validate(length(min = 1, message = "acknowledged_by must not be empty"))]
    pub acknowledged_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_alert_level_out_of_stock_at_zero() {
        assert_eq!(AlertLevel::for_quantity(dec!(0), dec!(2)), AlertLevel::OutOfStock);
    }

    #[test]
    fn test_alert_level_critical_at_half_threshold() {
        assert_eq!(AlertLevel::for_quantity(dec!(1), dec!(2)), AlertLevel::Critical);
        assert_eq!(AlertLevel::for_quantity(dec!(0.4), dec!(2)), AlertLevel::Critical);
    }

    #[test]
    fn test_alert_level_low_above_half_threshold() {
        assert_eq!(AlertLevel::for_quantity(dec!(1.4), dec!(2)), AlertLevel::Low);
        assert_eq!(AlertLevel::for_quantity(dec!(2), dec!(2)), AlertLevel::Low);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(is_below_threshold(dec!(2), dec!(2)));
        assert!(!is_below_threshold(dec!(2.01), dec!(2)));
    }

    #[test]
    fn test_consume_floors_at_zero() {
        assert_eq!(StockChange::Consume(dec!(8)).apply(dec!(3)), dec!(0));
        assert_eq!(StockChange::Consume(dec!(0.6)).apply(dec!(10)), dec!(9.4));
    }

    #[test]
    fn test_receive_and_set() {
        assert_eq!(StockChange::Receive(dec!(5)).apply(dec!(1.5)), dec!(6.5));
        assert_eq!(StockChange::SetTo(dec!(7)).apply(dec!(1.5)), dec!(7));
    }

    #[test]
    fn test_unit_serialization() {
        let json = serde_json::to_string(&Unit::Tablespoon).unwrap();
        assert_eq!(json, "\"tablespoon\"");
        let level: AlertLevel = serde_json::from_str("\"out_of_stock\"").unwrap();
        assert_eq!(level, AlertLevel::OutOfStock);
    }
}
