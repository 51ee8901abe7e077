// Storage capabilities consumed by the inventory core
//
// Each trait is implemented twice: over Postgres (repository.rs) and in memory
// (memory.rs). Implementations are built once at start-up and shared as Arc<dyn _>.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::inventory::error::InventoryResult;
use crate::inventory::models::{
    DeductionRecord, DeductionStatus, Ingredient, IngredientCategory, InventoryTransaction,
    StockAlert, StockLevel, StockMovement, UpdateIngredientRequest,
};

/// Filter for listing ingredients
#[derive(Debug, Clone, Default)]
pub struct IngredientFilter {
    pub category: Option<IngredientCategory>,
    pub is_active: Option<bool>,
}

impl IngredientFilter {
    pub fn matches(&self, ingredient: &Ingredient) -> bool {
        self.category.map_or(true, |c| c == ingredient.category)
            && self.is_active.map_or(true, |a| a == ingredient.is_active)
    }
}

#[async_trait]
pub trait IngredientStore: Send + Sync {
    async fn get(&self, id: &str) -> InventoryResult<Option<Ingredient>>;

    async fn list(&self, filter: &IngredientFilter) -> InventoryResult<Vec<Ingredient>>;

    async fn create(&self, ingredient: Ingredient) -> InventoryResult<Ingredient>;

    /// Apply the non-quantity fields of a partial edit.
    ///
    /// `current_quantity` in the request is ignored here; quantity changes only go
    /// through `apply_movements` so that every one of them is audited.
    async fn update_details(
        &self,
        id: &str,
        changes: &UpdateIngredientRequest,
    ) -> InventoryResult<Ingredient>;

    /// Atomically apply a batch of quantity changes and append their transaction
    /// records.
    ///
    /// Either every movement and every record is written or none is. The new
    /// quantity is computed by the store against its own current value, so
    /// concurrent batches touching the same ingredient cannot lose updates.
    /// Returns the post-commit level of each movement's ingredient, in input order.
    async fn apply_movements(&self, movements: &[StockMovement])
        -> InventoryResult<Vec<StockLevel>>;
}

#[async_trait]
pub trait StockAlertStore: Send + Sync {
    /// Create the open alert for an ingredient, or refresh it if one is already open.
    async fn upsert_for_ingredient(
        &self,
        ingredient_id: &str,
        ingredient_name: &str,
        current_quantity: Decimal,
        minimum_threshold: Decimal,
    ) -> InventoryResult<StockAlert>;

    async fn list_open(&self) -> InventoryResult<Vec<StockAlert>>;

    async fn acknowledge(
        &self,
        alert_id: Uuid,
        acknowledged_by: &str,
        at: DateTime<Utc>,
    ) -> InventoryResult<StockAlert>;
}

/// Read side of the append-only audit trail
///
/// Records are appended by `IngredientStore::apply_movements` together with the
/// quantity change they describe.
#[async_trait]
pub trait TransactionLog: Send + Sync {
    async fn list(
        &self,
        ingredient_id: Option<&str>,
        order_id: Option<Uuid>,
    ) -> InventoryResult<Vec<InventoryTransaction>>;
}

/// Idempotency ledger for order deductions
#[async_trait]
pub trait DeductionLedger: Send + Sync {
    /// Atomically mark the order as being deducted. Returns false if the order was
    /// already claimed by an earlier pass.
    async fn claim(&self, order_id: Uuid) -> InventoryResult<bool>;

    async fn record_outcome(
        &self,
        order_id: Uuid,
        status: DeductionStatus,
        detail: Option<String>,
    ) -> InventoryResult<()>;

    async fn list_by_status(&self, status: DeductionStatus)
        -> InventoryResult<Vec<DeductionRecord>>;
}
