use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::menu::error::{MenuError, MenuResult};
use crate::menu::models::MenuItem;

/// Read/write access to menu item documents
#[async_trait]
pub trait MenuItemStore: Send + Sync {
    async fn get(&self, id: &str) -> MenuResult<Option<MenuItem>>;

    async fn list(&self) -> MenuResult<Vec<MenuItem>>;

    /// Insert or replace the document stored under `item.id`
    async fn save(&self, item: MenuItem) -> MenuResult<MenuItem>;
}

/// Parse a stored document, failing loudly instead of guessing at missing fields
fn decode_document(id: String, document: JsonValue) -> MenuResult<MenuItem> {
    let mut item: MenuItem = serde_json::from_value(document)
        .map_err(|e| MenuError::InvalidDocument(format!("menu item {}: {}", id, e)))?;
    item.id = id;
    Ok(item)
}

/// Postgres-backed menu items, stored as JSONB documents
#[derive(Clone)]
pub struct MenuItemRepository {
    pool: PgPool,
}

impl MenuItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MenuItemStore for MenuItemRepository {
    async fn get(&self, id: &str) -> MenuResult<Option<MenuItem>> {
        let row: Option<(String, JsonValue)> =
            sqlx::query_as("SELECT id, document FROM menu_items WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(id, document)| decode_document(id, document))
            .transpose()
    }

    async fn list(&self) -> MenuResult<Vec<MenuItem>> {
        let rows: Vec<(String, JsonValue)> = sqlx::query_as(
            "SELECT id, document FROM menu_items ORDER BY document->>'name', id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, document)| decode_document(id, document))
            .collect()
    }

    async fn save(&self, item: MenuItem) -> MenuResult<MenuItem> {
        sqlx::query(
            r#"
            INSERT INTO menu_items (id, document)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET document = EXCLUDED.document, updated_at = NOW()
            "#,
        )
        .bind(&item.id)
        .bind(Json(&item))
        .execute(&self.pool)
        .await?;

        Ok(item)
    }
}

/// In-memory menu items, ordered by id
#[derive(Debug, Default)]
pub struct InMemoryMenuItems {
    items: RwLock<BTreeMap<String, MenuItem>>,
}

impl InMemoryMenuItems {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MenuItemStore for InMemoryMenuItems {
    async fn get(&self, id: &str) -> MenuResult<Option<MenuItem>> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn list(&self) -> MenuResult<Vec<MenuItem>> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn save(&self, item: MenuItem) -> MenuResult<MenuItem> {
        self.items
            .write()
            .await
            .insert(item.id.clone(), item.clone());
        Ok(item)
    }
}
