// HTTP handlers for inventory endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::inventory::{
    AcknowledgeAlertRequest, AdjustStockRequest, CreateIngredientRequest, DeductionRecord,
    Ingredient, IngredientCategory, IngredientFilter, InventoryError, InventoryTransaction,
    StockAlert, StockQuantityRequest, UpdateIngredientRequest,
};
use crate::AppState;

/// Query parameters for listing ingredients
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IngredientListQuery {
    /// Only ingredients in this category
    #[param(value_type = Option<String>)]
    pub category: Option<IngredientCategory>,
    /// Only active (or only inactive) ingredients
    pub is_active: Option<bool>,
}

/// Query parameters for the transaction log
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionQuery {
    pub ingredient_id: Option<String>,
    pub order_id: Option<Uuid>,
}

/// Handler for POST /api/ingredients
#[utoipa::path(
    post,
    path = "/api/ingredients",
    request_body = CreateIngredientRequest,
    responses(
        (status = 201, description = "Ingredient created", body = Ingredient),
        (status = 400, description = "Invalid input data", body = String, example = json!({"error": "Validation error: name: Name must not be empty"})),
        (status = 500, description = "Internal server error", body = String, example = json!({"error": "A database error occurred"}))
    ),
    tag = "ingredients"
)]
pub async fn create_ingredient_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateIngredientRequest>,
) -> Result<(StatusCode, Json<Ingredient>), InventoryError> {
    tracing::debug!("Creating ingredient: {}", request.name);
    let ingredient = state.inventory_service.create_ingredient(request).await?;
    Ok((StatusCode::CREATED, Json(ingredient)))
}

/// Handler for GET /api/ingredients
#[utoipa::path(
    get,
    path = "/api/ingredients",
    params(IngredientListQuery),
    responses(
        (status = 200, description = "Ingredients ordered by name", body = Vec<Ingredient>)
    ),
    tag = "ingredients"
)]
pub async fn list_ingredients_handler(
    State(state): State<AppState>,
    Query(query): Query<IngredientListQuery>,
) -> Result<Json<Vec<Ingredient>>, InventoryError> {
    let filter = IngredientFilter {
        category: query.category,
        is_active: query.is_active,
    };
    let ingredients = state.inventory_service.list_ingredients(&filter).await?;
    Ok(Json(ingredients))
}

/// Handler for GET /api/ingredients/:id
#[utoipa::path(
    get,
    path = "/api/ingredients/{id}",
    params(("id" = String, Path, description = "Ingredient ID")),
    responses(
        (status = 200, description = "Ingredient found", body = Ingredient),
        (status = 404, description = "Ingredient not found", body = String, example = json!({"error": "Ingredient with id milk not found"}))
    ),
    tag = "ingredients"
)]
pub async fn get_ingredient_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Ingredient>, InventoryError> {
    let ingredient = state.inventory_service.get_ingredient(&id).await?;
    Ok(Json(ingredient))
}

/// Handler for PATCH /api/ingredients/:id
#[utoipa::path(
    patch,
    path = "/api/ingredients/{id}",
    params(("id" = String, Path, description = "Ingredient ID")),
    request_body = UpdateIngredientRequest,
    responses(
        (status = 200, description = "Ingredient updated", body = Ingredient),
        (status = 400, description = "Invalid input data"),
        (status = 404, description = "Ingredient not found")
    ),
    tag = "ingredients"
)]
pub async fn update_ingredient_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateIngredientRequest>,
) -> Result<Json<Ingredient>, InventoryError> {
    let ingredient = state
        .inventory_service
        .update_ingredient(&id, request)
        .await?;
    Ok(Json(ingredient))
}

/// Handler for POST /api/ingredients/:id/restock
#[utoipa::path(
    post,
    path = "/api/ingredients/{id}/restock",
    params(("id" = String, Path, description = "Ingredient ID")),
    request_body = StockQuantityRequest,
    responses(
        (status = 200, description = "Stock received", body = Ingredient),
        (status = 400, description = "Quantity must be positive"),
        (status = 404, description = "Ingredient not found")
    ),
    tag = "ingredients"
)]
pub async fn restock_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StockQuantityRequest>,
) -> Result<Json<Ingredient>, InventoryError> {
    let ingredient = state.inventory_service.restock(&id, request).await?;
    Ok(Json(ingredient))
}

/// Handler for POST /api/ingredients/:id/waste
#[utoipa::path(
    post,
    path = "/api/ingredients/{id}/waste",
    params(("id" = String, Path, description = "Ingredient ID")),
    request_body = StockQuantityRequest,
    responses(
        (status = 200, description = "Waste recorded", body = Ingredient),
        (status = 400, description = "Quantity must be positive"),
        (status = 404, description = "Ingredient not found")
    ),
    tag = "ingredients"
)]
pub async fn record_waste_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StockQuantityRequest>,
) -> Result<Json<Ingredient>, InventoryError> {
    let ingredient = state.inventory_service.record_waste(&id, request).await?;
    Ok(Json(ingredient))
}

/// Handler for POST /api/ingredients/:id/adjust
#[utoipa::path(
    post,
    path = "/api/ingredients/{id}/adjust",
    params(("id" = String, Path, description = "Ingredient ID")),
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Quantity set to the counted value", body = Ingredient),
        (status = 400, description = "Quantity must not be negative"),
        (status = 404, description = "Ingredient not found")
    ),
    tag = "ingredients"
)]
pub async fn adjust_stock_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AdjustStockRequest>,
) -> Result<Json<Ingredient>, InventoryError> {
    let ingredient = state.inventory_service.adjust_stock(&id, request).await?;
    Ok(Json(ingredient))
}

/// Handler for GET /api/stock-alerts
#[utoipa::path(
    get,
    path = "/api/stock-alerts",
    responses(
        (status = 200, description = "Unacknowledged stock alerts", body = Vec<StockAlert>)
    ),
    tag = "stock-alerts"
)]
pub async fn list_stock_alerts_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<StockAlert>>, InventoryError> {
    let alerts = state.inventory_service.list_open_alerts().await?;
    Ok(Json(alerts))
}

/// Handler for POST /api/stock-alerts/:id/acknowledge
#[utoipa::path(
    post,
    path = "/api/stock-alerts/{id}/acknowledge",
    params(("id" = Uuid, Path, description = "Stock alert ID")),
    request_body = AcknowledgeAlertRequest,
    responses(
        (status = 200, description = "Alert acknowledged", body = StockAlert),
        (status = 404, description = "Stock alert not found")
    ),
    tag = "stock-alerts"
)]
pub async fn acknowledge_alert_handler(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
    Json(request): Json<AcknowledgeAlertRequest>,
) -> Result<Json<StockAlert>, InventoryError> {
    let alert = state
        .inventory_service
        .acknowledge_alert(alert_id, request)
        .await?;
    Ok(Json(alert))
}

/// Handler for GET /api/inventory-transactions
#[utoipa::path(
    get,
    path = "/api/inventory-transactions",
    params(TransactionQuery),
    responses(
        (status = 200, description = "Audit trail, oldest first", body = Vec<InventoryTransaction>)
    ),
    tag = "inventory-transactions"
)]
pub async fn list_transactions_handler(
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<Vec<InventoryTransaction>>, InventoryError> {
    let transactions = state
        .inventory_service
        .list_transactions(query.ingredient_id.as_deref(), query.order_id)
        .await?;
    Ok(Json(transactions))
}

/// Handler for GET /api/deductions/review
#[utoipa::path(
    get,
    path = "/api/deductions/review",
    responses(
        (status = 200, description = "Orders whose inventory deduction needs review", body = Vec<DeductionRecord>)
    ),
    tag = "inventory-transactions"
)]
pub async fn list_review_queue_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<DeductionRecord>>, InventoryError> {
    let records = state.inventory_service.list_review_queue().await?;
    Ok(Json(records))
}
