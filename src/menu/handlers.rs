// HTTP handlers for menu and recipe costing endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::menu::{
    ConfigurationCostRequest, CreateMenuItemRequest, MenuError, MenuItem, MenuItemCost, Recipe,
};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RecipeCostResponse {
    pub recipe_name: String,
    pub serving_size: i32,
    pub cost_per_serving: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ConfigurationCostResponse {
    pub menu_item_id: String,
    pub size: Option<String>,
    pub cost: Decimal,
}

async fn load_menu_item(state: &AppState, id: &str) -> Result<MenuItem, MenuError> {
    state
        .menu_items
        .get(id)
        .await?
        .ok_or_else(|| MenuError::NotFound(id.to_string()))
}

/// Handler for POST /api/recipes/cost
/// Prices one serving of a recipe against current ingredient costs
pub async fn recipe_cost_handler(
    State(state): State<AppState>,
    Json(recipe): Json<Recipe>,
) -> Json<RecipeCostResponse> {
    let cost_per_serving = state
        .cost_aggregator
        .recipe_calculator()
        .calculate_cost(&recipe)
        .await;

    Json(RecipeCostResponse {
        serving_size: recipe.effective_serving_size(),
        recipe_name: recipe.name,
        cost_per_serving,
    })
}

/// Handler for POST /api/menu-items
pub async fn create_menu_item_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateMenuItemRequest>,
) -> Result<(StatusCode, Json<MenuItem>), MenuError> {
    request.validate()?;

    let item = state
        .menu_items
        .save(request.into_menu_item(Uuid::new_v4().to_string()))
        .await?;

    tracing::info!(id = %item.id, name = %item.name, "Menu item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// Handler for GET /api/menu-items
pub async fn list_menu_items_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<MenuItem>>, MenuError> {
    let items = state.menu_items.list().await?;
    Ok(Json(items))
}

/// Handler for GET /api/menu-items/:id
pub async fn get_menu_item_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MenuItem>, MenuError> {
    Ok(Json(load_menu_item(&state, &id).await?))
}

/// Handler for GET /api/menu-items/:id/cost
/// Catalog cost: default size plus every option on offer
pub async fn menu_item_cost_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MenuItemCost>, MenuError> {
    let item = load_menu_item(&state, &id).await?;
    let cost = state
        .cost_aggregator
        .calculate_menu_item_total_cost(&item)
        .await;
    Ok(Json(cost))
}

/// Handler for POST /api/menu-items/:id/configuration-cost
/// Cost of one configuration: chosen size plus chosen options only
pub async fn configuration_cost_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ConfigurationCostRequest>,
) -> Result<Json<ConfigurationCostResponse>, MenuError> {
    let item = load_menu_item(&state, &id).await?;
    let cost = state
        .cost_aggregator
        .calculate_menu_item_configuration_cost(
            &item,
            request.size.as_deref(),
            &request.selected_options,
        )
        .await;

    Ok(Json(ConfigurationCostResponse {
        menu_item_id: item.id,
        size: request.size,
        cost,
    }))
}
