// In-memory inventory backend
//
// Backs every inventory store trait with one lock-protected set of tables, so a
// movement batch and its audit records land together exactly like a Postgres
// transaction. Selected with STORAGE_BACKEND=memory and used throughout the tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::inventory::error::{InventoryError, InventoryResult};
use crate::inventory::models::{
    AlertLevel, DeductionRecord, DeductionStatus, Ingredient, InventoryTransaction, StockAlert,
    StockLevel, StockMovement, UpdateIngredientRequest,
};
use crate::inventory::store::{
    DeductionLedger, IngredientFilter, IngredientStore, StockAlertStore, TransactionLog,
};

#[derive(Debug, Default)]
struct InventoryTables {
    ingredients: HashMap<String, Ingredient>,
    transactions: Vec<InventoryTransaction>,
    alerts: Vec<StockAlert>,
    deductions: HashMap<Uuid, DeductionRecord>,
}

#[derive(Debug, Default)]
pub struct InMemoryInventory {
    tables: RwLock<InventoryTables>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every alert ever raised, acknowledged or not
    pub async fn all_alerts(&self) -> Vec<StockAlert> {
        self.tables.read().await.alerts.clone()
    }
}

#[async_trait]
impl IngredientStore for InMemoryInventory {
    async fn get(&self, id: &str) -> InventoryResult<Option<Ingredient>> {
        Ok(self.tables.read().await.ingredients.get(id).cloned())
    }

    async fn list(&self, filter: &IngredientFilter) -> InventoryResult<Vec<Ingredient>> {
        let tables = self.tables.read().await;
        let mut ingredients: Vec<Ingredient> = tables
            .ingredients
            .values()
            .filter(|ingredient| filter.matches(ingredient))
            .cloned()
            .collect();
        ingredients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(ingredients)
    }

    async fn create(&self, ingredient: Ingredient) -> InventoryResult<Ingredient> {
        let mut tables = self.tables.write().await;
        tables
            .ingredients
            .insert(ingredient.id.clone(), ingredient.clone());
        Ok(ingredient)
    }

    async fn update_details(
        &self,
        id: &str,
        changes: &UpdateIngredientRequest,
    ) -> InventoryResult<Ingredient> {
        let mut tables = self.tables.write().await;
        let ingredient = tables
            .ingredients
            .get_mut(id)
            .ok_or_else(|| InventoryError::IngredientNotFound(id.to_string()))?;

        if let Some(name) = &changes.name {
            ingredient.name = name.clone();
        }
        if let Some(unit) = changes.unit {
            ingredient.unit = unit;
        }
        if let Some(threshold) = changes.minimum_threshold {
            ingredient.minimum_threshold = threshold;
        }
        if let Some(cost) = changes.cost_per_unit {
            ingredient.cost_per_unit = cost;
        }
        if let Some(supplier) = &changes.supplier {
            ingredient.supplier = Some(supplier.clone());
        }
        if let Some(category) = changes.category {
            ingredient.category = category;
        }
        if let Some(active) = changes.is_active {
            ingredient.is_active = active;
        }
        if let Some(expiry) = changes.expiry_date {
            ingredient.expiry_date = Some(expiry);
        }
        ingredient.updated_at = Utc::now();

        Ok(ingredient.clone())
    }

    async fn apply_movements(
        &self,
        movements: &[StockMovement],
    ) -> InventoryResult<Vec<StockLevel>> {
        let mut tables = self.tables.write().await;

        // All-or-nothing: refuse the batch before touching anything.
        if let Some(missing) = movements
            .iter()
            .find(|m| !tables.ingredients.contains_key(m.ingredient_id()))
        {
            return Err(InventoryError::IngredientNotFound(
                missing.ingredient_id().to_string(),
            ));
        }

        let now = Utc::now();
        let mut levels = Vec::with_capacity(movements.len());
        for movement in movements {
            let Some(ingredient) = tables.ingredients.get_mut(movement.ingredient_id()) else {
                continue;
            };
            ingredient.current_quantity = movement.change.apply(ingredient.current_quantity);
            ingredient.updated_at = now;
            levels.push(StockLevel {
                ingredient_id: ingredient.id.clone(),
                ingredient_name: ingredient.name.clone(),
                current_quantity: ingredient.current_quantity,
                minimum_threshold: ingredient.minimum_threshold,
            });

            let record = &movement.transaction;
            tables.transactions.push(InventoryTransaction {
                id: Uuid::new_v4(),
                ingredient_id: record.ingredient_id.clone(),
                ingredient_name: record.ingredient_name.clone(),
                transaction_type: record.transaction_type,
                quantity: record.quantity,
                unit: record.unit,
                reason: record.reason.clone(),
                order_id: record.order_id,
                performed_by: record.performed_by.clone(),
                created_at: now,
            });
        }

        Ok(levels)
    }
}

#[async_trait]
impl TransactionLog for InMemoryInventory {
    async fn list(
        &self,
        ingredient_id: Option<&str>,
        order_id: Option<Uuid>,
    ) -> InventoryResult<Vec<InventoryTransaction>> {
        let tables = self.tables.read().await;
        Ok(tables
            .transactions
            .iter()
            .filter(|t| ingredient_id.map_or(true, |id| t.ingredient_id == id))
            .filter(|t| order_id.map_or(true, |id| t.order_id == Some(id)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StockAlertStore for InMemoryInventory {
    async fn upsert_for_ingredient(
        &self,
        ingredient_id: &str,
        ingredient_name: &str,
        current_quantity: Decimal,
        minimum_threshold: Decimal,
    ) -> InventoryResult<StockAlert> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let alert_level = AlertLevel::for_quantity(current_quantity, minimum_threshold);

        if let Some(open) = tables
            .alerts
            .iter_mut()
            .find(|a| a.ingredient_id == ingredient_id && !a.acknowledged)
        {
            open.ingredient_name = ingredient_name.to_string();
            open.current_quantity = current_quantity;
            open.minimum_threshold = minimum_threshold;
            open.alert_level = alert_level;
            open.updated_at = now;
            return Ok(open.clone());
        }

        let alert = StockAlert {
            id: Uuid::new_v4(),
            ingredient_id: ingredient_id.to_string(),
            ingredient_name: ingredient_name.to_string(),
            current_quantity,
            minimum_threshold,
            alert_level,
            acknowledged: false,
            acknowledged_by: None,
            acknowledged_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.alerts.push(alert.clone());
        Ok(alert)
    }

    async fn list_open(&self) -> InventoryResult<Vec<StockAlert>> {
        let tables = self.tables.read().await;
        Ok(tables
            .alerts
            .iter()
            .filter(|a| !a.acknowledged)
            .cloned()
            .collect())
    }

    async fn acknowledge(
        &self,
        alert_id: Uuid,
        acknowledged_by: &str,
        at: DateTime<Utc>,
    ) -> InventoryResult<StockAlert> {
        let mut tables = self.tables.write().await;
        let alert = tables
            .alerts
            .iter_mut()
            .find(|a| a.id == alert_id)
            .ok_or(InventoryError::AlertNotFound(alert_id))?;

        alert.acknowledged = true;
        alert.acknowledged_by = Some(acknowledged_by.to_string());
        alert.acknowledged_at = Some(at);
        alert.updated_at = at;
        Ok(alert.clone())
    }
}

#[async_trait]
impl DeductionLedger for InMemoryInventory {
    async fn claim(&self, order_id: Uuid) -> InventoryResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.deductions.contains_key(&order_id) {
            return Ok(false);
        }
        let now = Utc::now();
        tables.deductions.insert(
            order_id,
            DeductionRecord {
                order_id,
                status: DeductionStatus::InProgress,
                detail: None,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(true)
    }

    async fn record_outcome(
        &self,
        order_id: Uuid,
        status: DeductionStatus,
        detail: Option<String>,
    ) -> InventoryResult<()> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let record = tables
            .deductions
            .entry(order_id)
            .or_insert_with(|| DeductionRecord {
                order_id,
                status,
                detail: None,
                created_at: now,
                updated_at: now,
            });
        record.status = status;
        record.detail = detail;
        record.updated_at = now;
        Ok(())
    }

    async fn list_by_status(
        &self,
        status: DeductionStatus,
    ) -> InventoryResult<Vec<DeductionRecord>> {
        let tables = self.tables.read().await;
        let mut records: Vec<DeductionRecord> = tables
            .deductions
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::models::{
        IngredientCategory, NewInventoryTransaction, StockChange, TransactionType, Unit,
    };
    use rust_decimal_macros::dec;

    fn milk() -> Ingredient {
        let now = Utc::now();
        Ingredient {
            id: "milk".to_string(),
            name: "Milk".to_string(),
            unit: Unit::Liter,
            current_quantity: dec!(10),
            minimum_threshold: dec!(2),
            cost_per_unit: dec!(25000),
            supplier: None,
            category: IngredientCategory::Dairy,
            is_active: true,
            expiry_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn usage(id: &str, amount: Decimal) -> StockMovement {
        StockMovement {
            change: StockChange::Consume(amount),
            transaction: NewInventoryTransaction {
                ingredient_id: id.to_string(),
                ingredient_name: "Milk".to_string(),
                transaction_type: TransactionType::Usage,
                quantity: amount,
                unit: Unit::Liter,
                reason: "Used in recipe: Latte".to_string(),
                order_id: None,
                performed_by: "system".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_apply_movements_writes_quantity_and_audit() {
        let store = InMemoryInventory::new();
        store.create(milk()).await.unwrap();

        let levels = store.apply_movements(&[usage("milk", dec!(0.6))]).await.unwrap();

        assert_eq!(levels[0].current_quantity, dec!(9.4));
        let log = TransactionLog::list(&store, Some("milk"), None).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].quantity, dec!(0.6));
    }

    #[tokio::test]
    async fn test_apply_movements_is_all_or_nothing() {
        let store = InMemoryInventory::new();
        store.create(milk()).await.unwrap();

        let result = store
            .apply_movements(&[usage("milk", dec!(1)), usage("ghost", dec!(1))])
            .await;

        assert!(matches!(result, Err(InventoryError::IngredientNotFound(id)) if id == "ghost"));
        let unchanged = IngredientStore::get(&store, "milk").await.unwrap().unwrap();
        assert_eq!(unchanged.current_quantity, dec!(10));
        assert!(TransactionLog::list(&store, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_open_alert() {
        let store = InMemoryInventory::new();
        let first = store
            .upsert_for_ingredient("milk", "Milk", dec!(1.5), dec!(2))
            .await
            .unwrap();
        let second = store
            .upsert_for_ingredient("milk", "Milk", dec!(0.5), dec!(2))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.alert_level, AlertLevel::Critical);
        assert_eq!(store.list_open().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_acknowledged_alert_is_not_reused() {
        let store = InMemoryInventory::new();
        let first = store
            .upsert_for_ingredient("milk", "Milk", dec!(1.5), dec!(2))
            .await
            .unwrap();
        store.acknowledge(first.id, "manager", Utc::now()).await.unwrap();

        let second = store
            .upsert_for_ingredient("milk", "Milk", dec!(1), dec!(2))
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.all_alerts().await.len(), 2);
        assert_eq!(store.list_open().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_claim_is_single_use() {
        let store = InMemoryInventory::new();
        let order_id = Uuid::new_v4();
        assert!(store.claim(order_id).await.unwrap());
        assert!(!store.claim(order_id).await.unwrap());
    }
}
