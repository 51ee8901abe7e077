use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::inventory::InventoryDeductionEngine;
use crate::menu::MenuItemStore;
use crate::orders::{
    CreateOrderRequest, Order, OrderError, OrderLineItem, OrderResult, OrderStatus, OrderStore,
    PriceCalculator, StatusMachine, StatusUpdateResponse,
};

/// Service for placing and reading orders
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    menu_items: Arc<dyn MenuItemStore>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderStore>, menu_items: Arc<dyn MenuItemStore>) -> Self {
        Self { orders, menu_items }
    }

    /// Create a new pending order
    ///
    /// # Arguments
    /// * `request` - Order lines with their size and option choices
    ///
    /// # Returns
    /// The stored order with price snapshots taken from the current menu
    ///
    /// # Validation
    /// - At least one line, each with a positive quantity
    /// - Every menu item, size and option must exist
    pub async fn create_order(&self, request: CreateOrderRequest) -> OrderResult<Order> {
        request.validate_all()?;

        let mut line_items = Vec::with_capacity(request.items.len());
        for line in request.items {
            let item = self
                .menu_items
                .get(&line.menu_item_id)
                .await?
                .ok_or_else(|| OrderError::MenuItemNotFound(line.menu_item_id.clone()))?;

            let price_snapshot =
                PriceCalculator::unit_price(&item, line.size.as_deref(), &line.selected_options)?;

            line_items.push(OrderLineItem {
                menu_item_id: item.id,
                name: item.name,
                size: line.size,
                selected_options: line.selected_options,
                quantity: line.quantity,
                price_snapshot,
                subtotal: PriceCalculator::calculate_subtotal(line.quantity, price_snapshot),
            });
        }

        let subtotals: Vec<_> = line_items.iter().map(|line| line.subtotal).collect();
        let now = Utc::now();
        let order = self
            .orders
            .insert(Order {
                id: Uuid::new_v4(),
                status: OrderStatus::Pending,
                total_price: PriceCalculator::calculate_total(&subtotals),
                line_items,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(order_id = %order.id, total = %order.total_price, "Order created");
        Ok(order)
    }

    pub async fn get_order(&self, id: Uuid) -> OrderResult<Order> {
        self.orders.get(id).await?.ok_or(OrderError::NotFound(id))
    }
}

/// Applies status changes and consumes inventory when an order is confirmed
pub struct OrderStatusController {
    orders: Arc<dyn OrderStore>,
    deductions: Arc<InventoryDeductionEngine>,
}

impl OrderStatusController {
    pub fn new(orders: Arc<dyn OrderStore>, deductions: Arc<InventoryDeductionEngine>) -> Self {
        Self { orders, deductions }
    }

    /// Move an order to `new_status`
    ///
    /// Entering `confirmed` from another status runs the inventory deduction for
    /// the order's lines. Deduction problems are reported in the response and never
    /// undo the status change.
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> OrderResult<StatusUpdateResponse> {
        let current = self
            .orders
            .get(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        StatusMachine::transition(current.status, new_status)?;

        if current.status == new_status {
            return Ok(StatusUpdateResponse {
                order: current,
                inventory_deduction: None,
                deduction_error: None,
            });
        }

        let order = self
            .orders
            .compare_and_set_status(order_id, current.status, new_status)
            .await?
            .ok_or(OrderError::ConcurrentUpdate(order_id))?;

        tracing::info!(
            %order_id,
            from = %current.status,
            to = %new_status,
            "Order status updated"
        );

        if !StatusMachine::triggers_inventory_deduction(current.status, new_status) {
            return Ok(StatusUpdateResponse {
                order,
                inventory_deduction: None,
                deduction_error: None,
            });
        }

        let (inventory_deduction, deduction_error) = match self
            .deductions
            .process_order_inventory_deduction(order_id, &order.line_items)
            .await
        {
            Ok(report) => (Some(report), None),
            Err(e) => {
                tracing::error!(%order_id, error = %e, "Inventory deduction did not run");
                (None, Some(e.to_string()))
            }
        };

        Ok(StatusUpdateResponse {
            order,
            inventory_deduction,
            deduction_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{
        Ingredient, IngredientCategory, IngredientStore, InMemoryInventory, TransactionLog, Unit,
    };
    use crate::menu::{
        InMemoryMenuItems, LegacyRecipe, MenuItem, MenuItemDocument, Recipe, RecipeIngredient,
    };
    use crate::orders::{InMemoryOrders, OrderLineRequest};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct Fixture {
        inventory: Arc<InMemoryInventory>,
        service: OrderService,
        controller: OrderStatusController,
    }

    async fn fixture() -> Fixture {
        let inventory = Arc::new(InMemoryInventory::new());
        let now = Utc::now();
        inventory
            .create(Ingredient {
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
            })
            .await
            .unwrap();

        let menu = Arc::new(InMemoryMenuItems::new());
        menu.save(MenuItem::from(MenuItemDocument {
            id: "latte".to_string(),
            name: "Latte".to_string(),
            price: dec!(45000),
            recipe: Some(LegacyRecipe {
                base_recipe: Some(Recipe {
                    name: "Latte".to_string(),
                    ingredients: vec![RecipeIngredient {
                        ingredient_id: "milk".to_string(),
                        quantity: dec!(0.2),
                        unit: Unit::Liter,
                        notes: None,
                    }],
                    ..Recipe::default()
                }),
            }),
            ..MenuItemDocument::default()
        }))
        .await
        .unwrap();

        let orders = Arc::new(InMemoryOrders::new());
        let engine = Arc::new(InventoryDeductionEngine::new(
            inventory.clone(),
            menu.clone(),
            inventory.clone(),
            inventory.clone(),
            "system",
        ));

        Fixture {
            inventory: inventory.clone(),
            service: OrderService::new(orders.clone(), menu),
            controller: OrderStatusController::new(orders, engine),
        }
    }

    fn latte_request(quantity: u32) -> CreateOrderRequest {
        CreateOrderRequest {
            items: vec![OrderLineRequest {
                menu_item_id: "latte".to_string(),
                size: None,
                selected_options: vec![],
                quantity,
            }],
        }
    }

    async fn milk(fx: &Fixture) -> Decimal {
        IngredientStore::get(fx.inventory.as_ref(), "milk")
            .await
            .unwrap()
            .unwrap()
            .current_quantity
    }

    #[tokio::test]
    async fn test_create_order_snapshots_prices() {
        let fx = fixture().await;
        let order = fx.service.create_order(latte_request(2)).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.line_items[0].price_snapshot, dec!(45000));
        assert_eq!(order.total_price, dec!(90000));
        assert_eq!(fx.service.get_order(order.id).await.unwrap(), order);
    }

    #[tokio::test]
    async fn test_create_order_with_unknown_item() {
        let fx = fixture().await;
        let mut request = latte_request(1);
        request.items[0].menu_item_id = "ghost".to_string();

        let result = fx.service.create_order(request).await;
        assert!(matches!(result, Err(OrderError::MenuItemNotFound(_))));
    }

    #[tokio::test]
    async fn test_confirming_deducts_inventory() {
        let fx = fixture().await;
        let order = fx.service.create_order(latte_request(3)).await.unwrap();

        let response = fx
            .controller
            .update_status(order.id, OrderStatus::Confirmed)
            .await
            .unwrap();

        assert_eq!(response.order.status, OrderStatus::Confirmed);
        assert!(response.inventory_deduction.unwrap().success);
        assert_eq!(milk(&fx).await, dec!(9.4));

        let log = TransactionLog::list(fx.inventory.as_ref(), None, Some(order.id))
            .await
            .unwrap();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_confirm_is_idempotent() {
        let fx = fixture().await;
        let order = fx.service.create_order(latte_request(3)).await.unwrap();

        fx.controller
            .update_status(order.id, OrderStatus::Confirmed)
            .await
            .unwrap();
        let again = fx
            .controller
            .update_status(order.id, OrderStatus::Confirmed)
            .await
            .unwrap();

        assert!(again.inventory_deduction.is_none());
        assert_eq!(milk(&fx).await, dec!(9.4));
    }

    #[tokio::test]
    async fn test_other_transitions_do_not_deduct() {
        let fx = fixture().await;
        let order = fx.service.create_order(latte_request(1)).await.unwrap();

        let response = fx
            .controller
            .update_status(order.id, OrderStatus::Cancelled)
            .await
            .unwrap();

        assert!(response.inventory_deduction.is_none());
        assert_eq!(milk(&fx).await, dec!(10));
    }

    #[tokio::test]
    async fn test_invalid_transition_rejected() {
        let fx = fixture().await;
        let order = fx.service.create_order(latte_request(1)).await.unwrap();

        let result = fx
            .controller
            .update_status(order.id, OrderStatus::Ready)
            .await;

        assert!(matches!(result, Err(OrderError::InvalidTransition { .. })));
        assert_eq!(
            fx.service.get_order(order.id).await.unwrap().status,
            OrderStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let fx = fixture().await;
        let result = fx
            .controller
            .update_status(Uuid::new_v4(), OrderStatus::Confirmed)
            .await;
        assert!(matches!(result, Err(OrderError::NotFound(_))));
    }
}
