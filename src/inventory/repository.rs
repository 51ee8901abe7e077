use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::inventory::error::{InventoryError, InventoryResult};
use crate::inventory::models::{
    AlertLevel, DeductionRecord, DeductionStatus, Ingredient, InventoryTransaction, StockAlert,
    StockChange, StockLevel, StockMovement, UpdateIngredientRequest,
};
use crate::inventory::store::{
    DeductionLedger, IngredientFilter, IngredientStore, StockAlertStore, TransactionLog,
};

const INGREDIENT_COLUMNS: &str = "id, name, unit, current_quantity, minimum_threshold, \
    cost_per_unit, supplier, category, is_active, expiry_date, created_at, updated_at";

const ALERT_COLUMNS: &str = "id, ingredient_id, ingredient_name, current_quantity, \
    minimum_threshold, alert_level, acknowledged, acknowledged_by, acknowledged_at, \
    created_at, updated_at";

/// Repository for ingredients and their transaction history
#[derive(Clone)]
pub struct IngredientRepository {
    pool: PgPool,
}

impl IngredientRepository {
    /// Create a new IngredientRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IngredientStore for IngredientRepository {
    async fn get(&self, id: &str) -> InventoryResult<Option<Ingredient>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(&format!(
            "SELECT {} FROM ingredients WHERE id = $1",
            INGREDIENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ingredient)
    }

    async fn list(&self, filter: &IngredientFilter) -> InventoryResult<Vec<Ingredient>> {
        let ingredients = sqlx::query_as::<_, Ingredient>(&format!(
            r#"
            SELECT {}
            FROM ingredients
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::boolean IS NULL OR is_active = $2)
            ORDER BY name
            "#,
            INGREDIENT_COLUMNS
        ))
        .bind(filter.category)
        .bind(filter.is_active)
        .fetch_all(&self.pool)
        .await?;

        Ok(ingredients)
    }

    async fn create(&self, ingredient: Ingredient) -> InventoryResult<Ingredient> {
        let created = sqlx::query_as::<_, Ingredient>(&format!(
            r#"
            INSERT INTO ingredients (id, name, unit, current_quantity, minimum_threshold,
                cost_per_unit, supplier, category, is_active, expiry_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            INGREDIENT_COLUMNS
        ))
        .bind(&ingredient.id)
        .bind(&ingredient.name)
        .bind(ingredient.unit)
        .bind(ingredient.current_quantity)
        .bind(ingredient.minimum_threshold)
        .bind(ingredient.cost_per_unit)
        .bind(&ingredient.supplier)
        .bind(ingredient.category)
        .bind(ingredient.is_active)
        .bind(ingredient.expiry_date)
        .bind(ingredient.created_at)
        .bind(ingredient.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update_details(
        &self,
        id: &str,
        changes: &UpdateIngredientRequest,
    ) -> InventoryResult<Ingredient> {
        let updated = sqlx::query_as::<_, Ingredient>(&format!(
            r#"
            UPDATE ingredients
            SET name = COALESCE($2, name),
                unit = COALESCE($3, unit),
                minimum_threshold = COALESCE($4, minimum_threshold),
                cost_per_unit = COALESCE($5, cost_per_unit),
                supplier = COALESCE($6, supplier),
                category = COALESCE($7, category),
                is_active = COALESCE($8, is_active),
                expiry_date = COALESCE($9, expiry_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            INGREDIENT_COLUMNS
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(changes.unit)
        .bind(changes.minimum_threshold)
        .bind(changes.cost_per_unit)
        .bind(&changes.supplier)
        .bind(changes.category)
        .bind(changes.is_active)
        .bind(changes.expiry_date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| InventoryError::IngredientNotFound(id.to_string()))?;

        Ok(updated)
    }

    async fn apply_movements(
        &self,
        movements: &[StockMovement],
    ) -> InventoryResult<Vec<StockLevel>> {
        let mut tx = self.pool.begin().await?;
        let mut levels = Vec::with_capacity(movements.len());

        for movement in movements {
            // The new quantity is computed inside the UPDATE so that two batches
            // racing on one ingredient serialize on its row lock.
            let (sql, amount) = match movement.change {
                StockChange::Consume(amount) => (
                    "current_quantity = GREATEST(current_quantity - $2, 0)",
                    amount,
                ),
                StockChange::Receive(amount) => ("current_quantity = current_quantity + $2", amount),
                StockChange::SetTo(amount) => ("current_quantity = GREATEST($2, 0)", amount),
            };

            let row: Option<(String, String, Decimal, Decimal)> = sqlx::query_as(&format!(
                r#"
                UPDATE ingredients
                SET {}, updated_at = NOW()
                WHERE id = $1
                RETURNING id, name, current_quantity, minimum_threshold
                "#,
                sql
            ))
            .bind(movement.ingredient_id())
            .bind(amount)
            .fetch_optional(&mut *tx)
            .await?;

            // Dropping `tx` rolls back everything staged so far.
            let (ingredient_id, ingredient_name, current_quantity, minimum_threshold) = row
                .ok_or_else(|| {
                    InventoryError::IngredientNotFound(movement.ingredient_id().to_string())
                })?;

            let record = &movement.transaction;
            sqlx::query(
                r#"
                INSERT INTO inventory_transactions (id, ingredient_id, ingredient_name,
                    transaction_type, quantity, unit, reason, order_id, performed_by)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&record.ingredient_id)
            .bind(&record.ingredient_name)
            .bind(record.transaction_type)
            .bind(record.quantity)
            .bind(record.unit)
            .bind(&record.reason)
            .bind(record.order_id)
            .bind(&record.performed_by)
            .execute(&mut *tx)
            .await?;

            levels.push(StockLevel {
                ingredient_id,
                ingredient_name,
                current_quantity,
                minimum_threshold,
            });
        }

        tx.commit().await?;

        Ok(levels)
    }
}

#[async_trait]
impl TransactionLog for IngredientRepository {
    async fn list(
        &self,
        ingredient_id: Option<&str>,
        order_id: Option<Uuid>,
    ) -> InventoryResult<Vec<InventoryTransaction>> {
        let transactions = sqlx::query_as::<_, InventoryTransaction>(
            r#"
            SELECT id, ingredient_id, ingredient_name, transaction_type, quantity, unit,
                   reason, order_id, performed_by, created_at
            FROM inventory_transactions
            WHERE ($1::text IS NULL OR ingredient_id = $1)
              AND ($2::uuid IS NULL OR order_id = $2)
            ORDER BY created_at, id
            "#,
        )
        .bind(ingredient_id)
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }
}

/// Repository for low-stock alerts
#[derive(Clone)]
pub struct StockAlertRepository {
    pool: PgPool,
}

impl StockAlertRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StockAlertStore for StockAlertRepository {
    async fn upsert_for_ingredient(
        &self,
        ingredient_id: &str,
        ingredient_name: &str,
        current_quantity: Decimal,
        minimum_threshold: Decimal,
    ) -> InventoryResult<StockAlert> {
        let alert_level = AlertLevel::for_quantity(current_quantity, minimum_threshold);

        // Relies on the partial unique index over unacknowledged alerts.
        let alert = sqlx::query_as::<_, StockAlert>(&format!(
            r#"
            INSERT INTO stock_alerts (id, ingredient_id, ingredient_name, current_quantity,
                minimum_threshold, alert_level)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (ingredient_id) WHERE acknowledged = FALSE
            DO UPDATE SET ingredient_name = EXCLUDED.ingredient_name,
                          current_quantity = EXCLUDED.current_quantity,
                          minimum_threshold = EXCLUDED.minimum_threshold,
                          alert_level = EXCLUDED.alert_level,
                          updated_at = NOW()
            RETURNING {}
            "#,
            ALERT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(ingredient_id)
        .bind(ingredient_name)
        .bind(current_quantity)
        .bind(minimum_threshold)
        .bind(alert_level)
        .fetch_one(&self.pool)
        .await?;

        Ok(alert)
    }

    async fn list_open(&self) -> InventoryResult<Vec<StockAlert>> {
        let alerts = sqlx::query_as::<_, StockAlert>(&format!(
            "SELECT {} FROM stock_alerts WHERE acknowledged = FALSE ORDER BY updated_at DESC",
            ALERT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(alerts)
    }

    async fn acknowledge(
        &self,
        alert_id: Uuid,
        acknowledged_by: &str,
        at: DateTime<Utc>,
    ) -> InventoryResult<StockAlert> {
        let alert = sqlx::query_as::<_, StockAlert>(&format!(
            r#"
            UPDATE stock_alerts
            SET acknowledged = TRUE, acknowledged_by = $2, acknowledged_at = $3, updated_at = $3
            WHERE id = $1
            RETURNING {}
            "#,
            ALERT_COLUMNS
        ))
        .bind(alert_id)
        .bind(acknowledged_by)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(InventoryError::AlertNotFound(alert_id))?;

        Ok(alert)
    }
}

/// Repository backing the per-order deduction ledger
#[derive(Clone)]
pub struct DeductionLedgerRepository {
    pool: PgPool,
}

impl DeductionLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeductionLedger for DeductionLedgerRepository {
    async fn claim(&self, order_id: Uuid) -> InventoryResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO order_deductions (order_id, status)
            VALUES ($1, $2)
            ON CONFLICT (order_id) DO NOTHING
            "#,
        )
        .bind(order_id)
        .bind(DeductionStatus::InProgress)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn record_outcome(
        &self,
        order_id: Uuid,
        status: DeductionStatus,
        detail: Option<String>,
    ) -> InventoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO order_deductions (order_id, status, detail)
            VALUES ($1, $2, $3)
            ON CONFLICT (order_id)
            DO UPDATE SET status = EXCLUDED.status, detail = EXCLUDED.detail, updated_at = NOW()
            "#,
        )
        .bind(order_id)
        .bind(status)
        .bind(detail)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_by_status(
        &self,
        status: DeductionStatus,
    ) -> InventoryResult<Vec<DeductionRecord>> {
        let records = sqlx::query_as::<_, DeductionRecord>(
            r#"
            SELECT order_id, status, detail, created_at, updated_at
            FROM order_deductions
            WHERE status = $1
            ORDER BY created_at
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
