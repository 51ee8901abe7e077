use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::orders::{Order, OrderError, OrderLineItem, OrderResult, OrderStatus};

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get(&self, id: Uuid) -> OrderResult<Option<Order>>;

    async fn insert(&self, order: Order) -> OrderResult<Order>;

    /// Move the order from `expected` to `new_status`.
    ///
    /// Returns `None` if the order is no longer in `expected`, so two concurrent
    /// updates cannot both act on the same starting status.
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        new_status: OrderStatus,
    ) -> OrderResult<Option<Order>>;
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    status: OrderStatus,
    line_items: Json<Vec<OrderLineItem>>,
    total_price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            status: row.status,
            line_items: row.line_items.0,
            total_price: row.total_price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ORDER_COLUMNS: &str = "id, status, line_items, total_price, created_at, updated_at";

/// Repository for order database operations
#[derive(Clone)]
pub struct OrdersRepository {
    pool: PgPool,
}

impl OrdersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for OrdersRepository {
    async fn get(&self, id: Uuid) -> OrderResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    async fn insert(&self, order: Order) -> OrderResult<Order> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO orders (id, status, line_items, total_price, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(order.id)
        .bind(order.status)
        .bind(Json(&order.line_items))
        .bind(order.total_price)
        .bind(order.created_at)
        .bind(order.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        new_status: OrderStatus,
    ) -> OrderResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE orders
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(id)
        .bind(expected)
        .bind(new_status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Order::from))
    }
}

/// In-memory orders
#[derive(Debug, Default)]
pub struct InMemoryOrders {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryOrders {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrders {
    async fn get(&self, id: Uuid) -> OrderResult<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn insert(&self, order: Order) -> OrderResult<Order> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(OrderError::DatabaseError(format!(
                "duplicate order id {}",
                order.id
            )));
        }
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        new_status: OrderStatus,
    ) -> OrderResult<Option<Order>> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&id) {
            Some(order) if order.status == expected => {
                order.status = new_status;
                order.updated_at = Utc::now();
                Ok(Some(order.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order() -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            status: OrderStatus::Pending,
            line_items: vec![],
            total_price: dec!(0),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_compare_and_set_requires_expected_status() {
        let store = InMemoryOrders::new();
        let order = store.insert(order()).await.unwrap();

        let confirmed = store
            .compare_and_set_status(order.id, OrderStatus::Pending, OrderStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(confirmed.unwrap().status, OrderStatus::Confirmed);

        let stale = store
            .compare_and_set_status(order.id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert!(stale.is_none());
        assert_eq!(
            store.get(order.id).await.unwrap().unwrap().status,
            OrderStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = InMemoryOrders::new();
        let order = order();
        store.insert(order.clone()).await.unwrap();
        assert!(store.insert(order).await.is_err());
    }
}
