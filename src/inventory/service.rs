use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::inventory::error::{InventoryError, InventoryResult};
use crate::inventory::models::{
    is_below_threshold, AcknowledgeAlertRequest, AdjustStockRequest, CreateIngredientRequest,
    DeductionRecord, DeductionStatus, Ingredient, InventoryTransaction, NewInventoryTransaction,
    StockAlert, StockChange, StockLevel, StockMovement, StockQuantityRequest, TransactionType,
    UpdateIngredientRequest,
};
use crate::inventory::store::{
    DeductionLedger, IngredientFilter, IngredientStore, StockAlertStore, TransactionLog,
};

/// Service for direct ingredient edits and inventory queries
///
/// Every quantity change goes through `IngredientStore::apply_movements`, so each
/// one leaves an audit record, and every resulting level at or below the
/// threshold raises (or refreshes) the ingredient's open stock alert.
#[derive(Clone)]
pub struct InventoryService {
    ingredients: Arc<dyn IngredientStore>,
    alerts: Arc<dyn StockAlertStore>,
    transactions: Arc<dyn TransactionLog>,
    ledger: Arc<dyn DeductionLedger>,
    performed_by: String,
    stale_claim_after: Duration,
}

/// How long a claim may stay `in_progress` before the review queue lists it
pub const DEFAULT_STALE_CLAIM_MINUTES: i64 = 5;

impl InventoryService {
    pub fn new(
        ingredients: Arc<dyn IngredientStore>,
        alerts: Arc<dyn StockAlertStore>,
        transactions: Arc<dyn TransactionLog>,
        ledger: Arc<dyn DeductionLedger>,
        performed_by: impl Into<String>,
    ) -> Self {
        Self {
            ingredients,
            alerts,
            transactions,
            ledger,
            performed_by: performed_by.into(),
            stale_claim_after: Duration::minutes(DEFAULT_STALE_CLAIM_MINUTES),
        }
    }

    pub fn with_stale_claim_after(mut self, stale_claim_after: Duration) -> Self {
        self.stale_claim_after = stale_claim_after;
        self
    }

    /// Create a new ingredient
    ///
    /// # Arguments
    /// * `request` - Ingredient fields; the starting quantity is taken as-is
    ///
    /// # Returns
    /// The stored ingredient with its generated id
    pub async fn create_ingredient(
        &self,
        request: CreateIngredientRequest,
    ) -> InventoryResult<Ingredient> {
        request.validate()?;

        let now = Utc::now();
        let ingredient = self
            .ingredients
            .create(Ingredient {
                id: Uuid::new_v4().to_string(),
                name: request.name.trim().to_string(),
                unit: request.unit,
                current_quantity: request.current_quantity,
                minimum_threshold: request.minimum_threshold,
                cost_per_unit: request.cost_per_unit,
                supplier: request.supplier,
                category: request.category,
                is_active: request.is_active,
                expiry_date: request.expiry_date,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(id = %ingredient.id, name = %ingredient.name, "Ingredient created");
        self.raise_alert_if_low(&StockLevel::from(&ingredient)).await?;

        Ok(ingredient)
    }

    pub async fn get_ingredient(&self, id: &str) -> InventoryResult<Ingredient> {
        self.ingredients
            .get(id)
            .await?
            .ok_or_else(|| InventoryError::IngredientNotFound(id.to_string()))
    }

    pub async fn list_ingredients(
        &self,
        filter: &IngredientFilter,
    ) -> InventoryResult<Vec<Ingredient>> {
        self.ingredients.list(filter).await
    }

    /// Apply a partial edit
    ///
    /// Non-quantity fields are written directly. A `current_quantity` that differs
    /// from the stored one is applied as an adjustment movement.
    pub async fn update_ingredient(
        &self,
        id: &str,
        request: UpdateIngredientRequest,
    ) -> InventoryResult<Ingredient> {
        request.validate()?;

        let ingredient = self.ingredients.update_details(id, &request).await?;

        if let Some(quantity) = request.current_quantity {
            if quantity != ingredient.current_quantity {
                return self
                    .apply_change(
                        &ingredient,
                        StockChange::SetTo(quantity),
                        TransactionType::Adjustment,
                        quantity,
                        "Manual quantity update".to_string(),
                    )
                    .await;
            }
        }

        // A threshold edit alone can put the current level under the line.
        self.raise_alert_if_low(&StockLevel::from(&ingredient)).await?;
        Ok(ingredient)
    }

    /// Receive stock from a supplier
    pub async fn restock(
        &self,
        id: &str,
        request: StockQuantityRequest,
    ) -> InventoryResult<Ingredient> {
        request.validate()?;
        let ingredient = self.get_ingredient(id).await?;

        self.apply_change(
            &ingredient,
            StockChange::Receive(request.quantity),
            TransactionType::Purchase,
            request.quantity,
            request.reason.unwrap_or_else(|| "Restock".to_string()),
        )
        .await
    }

    /// Write off spoiled or spilled stock, flooring at zero
    pub async fn record_waste(
        &self,
        id: &str,
        request: StockQuantityRequest,
    ) -> InventoryResult<Ingredient> {
        request.validate()?;
        let ingredient = self.get_ingredient(id).await?;

        self.apply_change(
            &ingredient,
            StockChange::Consume(request.quantity),
            TransactionType::Waste,
            request.quantity,
            request.reason.unwrap_or_else(|| "Waste".to_string()),
        )
        .await
    }

    /// Set the quantity to a counted value
    ///
    /// The adjustment record carries the counted quantity.
    pub async fn adjust_stock(
        &self,
        id: &str,
        request: AdjustStockRequest,
    ) -> InventoryResult<Ingredient> {
        request.validate()?;
        let ingredient = self.get_ingredient(id).await?;

        self.apply_change(
            &ingredient,
            StockChange::SetTo(request.quantity),
            TransactionType::Adjustment,
            request.quantity,
            request
                .reason
                .unwrap_or_else(|| "Stock count adjustment".to_string()),
        )
        .await
    }

    pub async fn list_open_alerts(&self) -> InventoryResult<Vec<StockAlert>> {
        self.alerts.list_open().await
    }

    pub async fn acknowledge_alert(
        &self,
        alert_id: Uuid,
        request: AcknowledgeAlertRequest,
    ) -> InventoryResult<StockAlert> {
        request.validate()?;
        let alert = self
            .alerts
            .acknowledge(alert_id, request.acknowledged_by.trim(), Utc::now())
            .await?;

        tracing::info!(
            alert_id = %alert.id,
            ingredient = %alert.ingredient_name,
            acknowledged_by = %request.acknowledged_by,
            "Stock alert acknowledged"
        );
        Ok(alert)
    }

    pub async fn list_transactions(
        &self,
        ingredient_id: Option<&str>,
        order_id: Option<Uuid>,
    ) -> InventoryResult<Vec<InventoryTransaction>> {
        self.transactions.list(ingredient_id, order_id).await
    }

    /// Orders whose deduction pass ended with a failure, plus claims that never
    /// recorded an outcome within the stale cutoff
    pub async fn list_review_queue(&self) -> InventoryResult<Vec<DeductionRecord>> {
        let mut queue = self.ledger.list_by_status(DeductionStatus::NeedsReview).await?;

        let cutoff = Utc::now() - self.stale_claim_after;
        let stale = self
            .ledger
            .list_by_status(DeductionStatus::InProgress)
            .await?
            .into_iter()
            .filter(|record| record.updated_at <= cutoff);
        queue.extend(stale);

        queue.sort_by_key(|record| record.created_at);
        Ok(queue)
    }

    async fn apply_change(
        &self,
        ingredient: &Ingredient,
        change: StockChange,
        transaction_type: TransactionType,
        quantity: Decimal,
        reason: String,
    ) -> InventoryResult<Ingredient> {
        let movement = StockMovement {
            change,
            transaction: NewInventoryTransaction {
                ingredient_id: ingredient.id.clone(),
                ingredient_name: ingredient.name.clone(),
                transaction_type,
                quantity,
                unit: ingredient.unit,
                reason,
                order_id: None,
                performed_by: self.performed_by.clone(),
            },
        };

        let levels = self.ingredients.apply_movements(&[movement]).await?;
        for level in &levels {
            tracing::info!(
                ingredient = %level.ingredient_name,
                transaction_type = %transaction_type.as_str(),
                quantity = %level.current_quantity,
                "Stock level changed"
            );
            self.raise_alert_if_low(level).await?;
        }

        self.get_ingredient(&ingredient.id).await
    }

    async fn raise_alert_if_low(&self, level: &StockLevel) -> InventoryResult<()> {
        if is_below_threshold(level.current_quantity, level.minimum_threshold) {
            let alert = self
                .alerts
                .upsert_for_ingredient(
                    &level.ingredient_id,
                    &level.ingredient_name,
                    level.current_quantity,
                    level.minimum_threshold,
                )
                .await?;
            tracing::warn!(
                ingredient = %alert.ingredient_name,
                level = %alert.alert_level,
                quantity = %alert.current_quantity,
                "Low stock"
            );
        }
        Ok(())
    }
}
