pub mod config;
pub mod db;
pub mod error;
pub mod inventory;
pub mod menu;
pub mod orders;
pub mod validation;

use axum::{
    extract::State,
    http::Uri,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use error::ApiError;
use inventory::{
    DeductionLedger, DeductionLedgerRepository, InMemoryInventory, IngredientRepository,
    IngredientStore, InventoryDeductionEngine, InventoryService, StockAlertRepository,
    StockAlertStore, TransactionLog,
};
use menu::{
    InMemoryMenuItems, MenuItemCostAggregator, MenuItemRepository, MenuItemStore,
    RecipeCostCalculator,
};
use orders::{InMemoryOrders, OrderService, OrderStatusController, OrderStore, OrdersRepository};

/// OpenAPI documentation for the inventory endpoints
#[derive(OpenApi)]
#[openapi(
    paths(
        inventory::create_ingredient_handler,
        inventory::list_ingredients_handler,
        inventory::get_ingredient_handler,
        inventory::update_ingredient_handler,
        inventory::restock_handler,
        inventory::record_waste_handler,
        inventory::adjust_stock_handler,
        inventory::list_stock_alerts_handler,
        inventory::acknowledge_alert_handler,
        inventory::list_transactions_handler,
        inventory::list_review_queue_handler,
    ),
    components(schemas(
        inventory::Ingredient,
        inventory::CreateIngredientRequest,
        inventory::UpdateIngredientRequest,
        inventory::StockQuantityRequest,
        inventory::AdjustStockRequest,
        inventory::AcknowledgeAlertRequest,
        inventory::StockAlert,
        inventory::InventoryTransaction,
        inventory::DeductionRecord,
        inventory::DeductionStatus,
        inventory::Unit,
        inventory::IngredientCategory,
        inventory::AlertLevel,
        inventory::TransactionType,
    )),
    tags(
        (name = "ingredients", description = "Ingredient stock management"),
        (name = "stock-alerts", description = "Low-stock alerts"),
        (name = "inventory-transactions", description = "Stock audit trail and deduction review")
    ),
    info(
        title = "Bistro Inventory API",
        version = "0.1.0",
        description = "Ingredient inventory, recipe costing and order-driven stock deduction"
    )
)]
pub struct ApiDoc;

/// Storage handles the application is assembled from
pub struct Stores {
    pub ingredients: Arc<dyn IngredientStore>,
    pub alerts: Arc<dyn StockAlertStore>,
    pub transactions: Arc<dyn TransactionLog>,
    pub ledger: Arc<dyn DeductionLedger>,
    pub menu_items: Arc<dyn MenuItemStore>,
    pub orders: Arc<dyn OrderStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        let ingredients = Arc::new(IngredientRepository::new(pool.clone()));
        Self {
            ingredients: ingredients.clone(),
            alerts: Arc::new(StockAlertRepository::new(pool.clone())),
            transactions: ingredients,
            ledger: Arc::new(DeductionLedgerRepository::new(pool.clone())),
            menu_items: Arc::new(MenuItemRepository::new(pool.clone())),
            orders: Arc::new(OrdersRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let inventory = Arc::new(InMemoryInventory::new());
        Self {
            ingredients: inventory.clone(),
            alerts: inventory.clone(),
            transactions: inventory.clone(),
            ledger: inventory,
            menu_items: Arc::new(InMemoryMenuItems::new()),
            orders: Arc::new(InMemoryOrders::new()),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Present for the Postgres backend; used by the health check
    pub db: Option<PgPool>,
    pub inventory_service: InventoryService,
    pub menu_items: Arc<dyn MenuItemStore>,
    pub cost_aggregator: MenuItemCostAggregator,
    pub order_service: OrderService,
    pub status_controller: Arc<OrderStatusController>,
}

impl AppState {
    /// Wire services over the given stores
    ///
    /// `inventory_actor` is recorded as the performer of every stock movement.
    pub fn new(stores: Stores, db: Option<PgPool>, inventory_actor: &str) -> Self {
        let deductions = Arc::new(InventoryDeductionEngine::new(
            stores.ingredients.clone(),
            stores.menu_items.clone(),
            stores.alerts.clone(),
            stores.ledger.clone(),
            inventory_actor,
        ));

        Self {
            db,
            inventory_service: InventoryService::new(
                stores.ingredients.clone(),
                stores.alerts,
                stores.transactions,
                stores.ledger,
                inventory_actor,
            ),
            cost_aggregator: MenuItemCostAggregator::new(RecipeCostCalculator::new(
                stores.ingredients,
            )),
            order_service: OrderService::new(stores.orders.clone(), stores.menu_items.clone()),
            status_controller: Arc::new(OrderStatusController::new(stores.orders, deductions)),
            menu_items: stores.menu_items,
        }
    }
}

/// Handler for GET /health
async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let storage = match &state.db {
        Some(pool) => {
            sqlx::query("SELECT 1").execute(pool).await?;
            "postgres"
        }
        None => "memory",
    };
    Ok(Json(json!({ "status": "ok", "storage": storage })))
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::NotFound {
        resource: "Route".to_string(),
        id: uri.path().to_string(),
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        // Inventory
        .route(
            "/api/ingredients",
            post(inventory::create_ingredient_handler).get(inventory::list_ingredients_handler),
        )
        .route(
            "/api/ingredients/:id",
            get(inventory::get_ingredient_handler).patch(inventory::update_ingredient_handler),
        )
        .route("/api/ingredients/:id/restock", post(inventory::restock_handler))
        .route("/api/ingredients/:id/waste", post(inventory::record_waste_handler))
        .route("/api/ingredients/:id/adjust", post(inventory::adjust_stock_handler))
        .route("/api/stock-alerts", get(inventory::list_stock_alerts_handler))
        .route(
            "/api/stock-alerts/:id/acknowledge",
            post(inventory::acknowledge_alert_handler),
        )
        .route(
            "/api/inventory-transactions",
            get(inventory::list_transactions_handler),
        )
        .route("/api/deductions/review", get(inventory::list_review_queue_handler))
        // Menu and costing
        .route("/api/recipes/cost", post(menu::recipe_cost_handler))
        .route(
            "/api/menu-items",
            post(menu::create_menu_item_handler).get(menu::list_menu_items_handler),
        )
        .route("/api/menu-items/:id", get(menu::get_menu_item_handler))
        .route("/api/menu-items/:id/cost", get(menu::menu_item_cost_handler))
        .route(
            "/api/menu-items/:id/configuration-cost",
            post(menu::configuration_cost_handler),
        )
        // Orders
        .route("/api/orders", post(orders::create_order_handler))
        .route("/api/orders/:id", get(orders::get_order_handler))
        .route(
            "/api/orders/:id/status",
            patch(orders::update_order_status_handler),
        )
        .fallback(route_not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
