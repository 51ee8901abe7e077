// Inventory Deduction Engine
//
// Consumes ingredient stock when an order is confirmed: resolves the recipe for each
// ordered line (size recipe plus any option recipes), commits the decrements and their
// audit records as one batch per recipe, and raises low-stock alerts afterwards.
//
// Failure policy:
// - unknown ingredient in a recipe: skipped and logged, the rest of the recipe applies
// - recipe line with a quantity that is not positive: skipped, logged, flagged for review
// - insufficient stock: deducted anyway (floored at zero) and alerted
// - unknown menu item: that line fails, sibling lines are still processed
// - commit failure: that recipe fails as a whole, the item's other recipes still run
// - alert write failure after a commit: the deduction stands, flagged for review

use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::inventory::error::{InventoryError, InventoryResult};
use crate::inventory::models::{
    is_below_threshold, DeductionStatus, NewInventoryTransaction, StockAlert, StockChange,
    StockMovement, TransactionType,
};
use crate::inventory::store::{DeductionLedger, IngredientStore, StockAlertStore};
use crate::menu::{MenuItemStore, Recipe};
use crate::orders::{OrderLineItem, SelectedOption};

/// Stock consumed from one ingredient by one recipe application
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientUsage {
    pub ingredient_id: String,
    pub ingredient_name: String,
    pub quantity_used: Decimal,
    pub quantity_after: Decimal,
    /// Stock on hand was below what the recipe needed
    pub shortfall: bool,
}

/// Result of applying one recipe `servings` times
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecipeDeduction {
    pub recipe_name: String,
    pub usages: Vec<IngredientUsage>,
    /// Ingredient ids the recipe names but the store does not know
    pub skipped_ingredients: Vec<String>,
    /// Ingredient ids whose recipe quantity is zero or negative; nothing is deducted
    pub invalid_quantities: Vec<String>,
    pub alerts: Vec<StockAlert>,
    /// Alerts that could not be written after the stock change was committed
    pub alert_failures: Vec<String>,
}

impl RecipeDeduction {
    pub fn is_complete(&self) -> bool {
        self.invalid_quantities.is_empty() && self.alert_failures.is_empty()
    }

    fn problems(&self) -> impl Iterator<Item = String> + '_ {
        let invalid = self.invalid_quantities.iter().map(move |id| {
            format!("{}: recipe quantity for {} is not positive", self.recipe_name, id)
        });
        let alerts = self
            .alert_failures
            .iter()
            .map(move |failure| format!("{}: stock alert not written: {}", self.recipe_name, failure));
        invalid.chain(alerts)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionFailure {
    pub group_name: String,
    pub option_name: String,
    pub error: String,
}

/// Result of deducting one ordered menu item
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MenuItemDeduction {
    pub menu_item_id: String,
    pub recipes: Vec<RecipeDeduction>,
    /// Set when the size (or legacy) recipe could not be deducted
    pub base_recipe_error: Option<String>,
    pub option_failures: Vec<OptionFailure>,
}

impl MenuItemDeduction {
    pub fn is_complete(&self) -> bool {
        self.base_recipe_error.is_none()
            && self.option_failures.is_empty()
            && self.recipes.iter().all(RecipeDeduction::is_complete)
    }

    fn problems(&self) -> Vec<String> {
        self.base_recipe_error
            .iter()
            .cloned()
            .chain(
                self.option_failures
                    .iter()
                    .map(|f| format!("{}/{}: {}", f.group_name, f.option_name, f.error)),
            )
            .chain(self.recipes.iter().flat_map(|recipe| recipe.problems()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineDeduction {
    pub menu_item_id: String,
    pub deduction: Option<MenuItemDeduction>,
    pub error: Option<String>,
}

impl LineDeduction {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
            && self
                .deduction
                .as_ref()
                .map_or(false, MenuItemDeduction::is_complete)
    }
}

/// Result of a whole order's deduction pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDeductionReport {
    pub order_id: Uuid,
    pub success: bool,
    pub lines: Vec<LineDeduction>,
}

impl OrderDeductionReport {
    fn failure_summary(&self) -> Option<String> {
        let failures: Vec<String> = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.is_success())
            .map(|(index, line)| {
                let reason = match (&line.error, &line.deduction) {
                    (Some(error), _) => error.clone(),
                    (None, Some(deduction)) => deduction.problems().join("; "),
                    (None, None) => "unknown failure".to_string(),
                };
                format!("line {} ({}): {}", index + 1, line.menu_item_id, reason)
            })
            .collect();

        if failures.is_empty() {
            None
        } else {
            Some(failures.join(" | "))
        }
    }
}

/// A staged usage waiting for the batch commit
struct StagedUsage {
    movement: StockMovement,
    shortfall: bool,
}

pub struct InventoryDeductionEngine {
    ingredients: Arc<dyn IngredientStore>,
    menu_items: Arc<dyn MenuItemStore>,
    alerts: Arc<dyn StockAlertStore>,
    ledger: Arc<dyn DeductionLedger>,
    performed_by: String,
}

impl InventoryDeductionEngine {
    pub fn new(
        ingredients: Arc<dyn IngredientStore>,
        menu_items: Arc<dyn MenuItemStore>,
        alerts: Arc<dyn StockAlertStore>,
        ledger: Arc<dyn DeductionLedger>,
        performed_by: impl Into<String>,
    ) -> Self {
        Self {
            ingredients,
            menu_items,
            alerts,
            ledger,
            performed_by: performed_by.into(),
        }
    }

    /// Consume `servings` times every configured ingredient of `recipe`.
    ///
    /// Decrements and their usage records are committed as one atomic batch.
    /// Ingredients the store does not know are skipped, as are lines whose quantity
    /// is not positive; insufficient stock is alerted but still deducted, flooring
    /// at zero. Once the batch is committed the call succeeds; alert writes that
    /// fail afterwards are reported in `alert_failures`.
    pub async fn deduct_ingredients_from_recipe(
        &self,
        recipe: &Recipe,
        servings: u32,
        order_id: Option<Uuid>,
    ) -> InventoryResult<RecipeDeduction> {
        let servings = Decimal::from(servings);
        let mut deduction = RecipeDeduction {
            recipe_name: recipe.name.clone(),
            ..RecipeDeduction::default()
        };
        let mut staged = Vec::new();

        if servings.is_zero() {
            return Ok(deduction);
        }

        for line in recipe.configured_ingredients() {
            if line.quantity <= Decimal::ZERO {
                tracing::warn!(
                    recipe = %recipe.name,
                    ingredient_id = %line.ingredient_id,
                    quantity = %line.quantity,
                    "Recipe quantity is not positive, skipping deduction"
                );
                deduction.invalid_quantities.push(line.ingredient_id.clone());
                continue;
            }

            let Some(ingredient) = self.ingredients.get(&line.ingredient_id).await? else {
                tracing::warn!(
                    recipe = %recipe.name,
                    ingredient_id = %line.ingredient_id,
                    "Ingredient not found, skipping deduction"
                );
                deduction.skipped_ingredients.push(line.ingredient_id.clone());
                continue;
            };

            let needed = line.quantity * servings;
            let shortfall = ingredient.current_quantity < needed;
            if shortfall {
                tracing::warn!(
                    recipe = %recipe.name,
                    ingredient = %ingredient.name,
                    available = %ingredient.current_quantity,
                    needed = %needed,
                    "Insufficient stock, deducting to zero"
                );
            }

            staged.push(StagedUsage {
                movement: StockMovement {
                    change: StockChange::Consume(needed),
                    transaction: NewInventoryTransaction {
                        ingredient_id: ingredient.id.clone(),
                        ingredient_name: ingredient.name.clone(),
                        transaction_type: TransactionType::Usage,
                        quantity: needed,
                        unit: ingredient.unit,
                        reason: format!("Used in recipe: {}", recipe.name),
                        order_id,
                        performed_by: self.performed_by.clone(),
                    },
                },
                shortfall,
            });
        }

        if staged.is_empty() {
            return Ok(deduction);
        }

        let movements: Vec<StockMovement> = staged.iter().map(|s| s.movement.clone()).collect();
        let levels = match self.ingredients.apply_movements(&movements).await {
            Ok(levels) => levels,
            Err(e) => {
                tracing::error!(
                    order_id = ?order_id,
                    recipe = %recipe.name,
                    error = %e,
                    "Stock commit failed, recipe not deducted"
                );
                return Err(InventoryError::CommitFailed {
                    recipe: recipe.name.clone(),
                    reason: e.to_string(),
                });
            }
        };

        for (usage, level) in staged.iter().zip(levels) {
            if usage.shortfall || is_below_threshold(level.current_quantity, level.minimum_threshold)
            {
                match self
                    .alerts
                    .upsert_for_ingredient(
                        &level.ingredient_id,
                        &level.ingredient_name,
                        level.current_quantity,
                        level.minimum_threshold,
                    )
                    .await
                {
                    Ok(alert) => deduction.alerts.push(alert),
                    Err(e) => {
                        tracing::error!(
                            order_id = ?order_id,
                            recipe = %recipe.name,
                            ingredient_id = %level.ingredient_id,
                            error = %e,
                            "Stock alert not written after commit"
                        );
                        deduction
                            .alert_failures
                            .push(format!("{}: {}", level.ingredient_id, e));
                    }
                }
            }

            deduction.usages.push(IngredientUsage {
                ingredient_id: level.ingredient_id,
                ingredient_name: level.ingredient_name,
                quantity_used: usage.movement.transaction.quantity,
                quantity_after: level.current_quantity,
                shortfall: usage.shortfall,
            });
        }

        tracing::debug!(
            recipe = %recipe.name,
            ingredients = deduction.usages.len(),
            "Recipe deducted"
        );

        Ok(deduction)
    }

    /// Deduct the ingredients for `quantity` units of a menu item.
    ///
    /// The base recipe comes from the selected size (or the default size), else the
    /// legacy recipe; an item without one has nothing to deduct. Every selected
    /// option with its own recipe is deducted as well. A failed base recipe or
    /// option is recorded and the remaining options are still attempted.
    pub async fn deduct_ingredients_for_menu_item(
        &self,
        menu_item_id: &str,
        selected_size: Option<&str>,
        selected_options: &[SelectedOption],
        quantity: u32,
        order_id: Option<Uuid>,
    ) -> InventoryResult<MenuItemDeduction> {
        let item = self
            .menu_items
            .get(menu_item_id)
            .await?
            .ok_or_else(|| InventoryError::MenuItemNotFound(menu_item_id.to_string()))?;

        let mut result = MenuItemDeduction {
            menu_item_id: item.id.clone(),
            ..MenuItemDeduction::default()
        };

        let Some(recipe) = item.deduction_recipe(selected_size) else {
            tracing::info!(
                menu_item = %item.name,
                size = ?selected_size,
                "No recipe configured, nothing to deduct"
            );
            return Ok(result);
        };

        match self
            .deduct_ingredients_from_recipe(recipe, quantity, order_id)
            .await
        {
            Ok(deduction) => result.recipes.push(deduction),
            Err(e) => {
                tracing::warn!(
                    menu_item = %item.name,
                    recipe = %recipe.name,
                    error = %e,
                    "Base recipe deduction failed"
                );
                result.base_recipe_error = Some(e.to_string());
            }
        }

        for selected in selected_options {
            let Some(option_recipe) = item
                .find_option(&selected.group_name, &selected.option_name)
                .and_then(|option| option.recipe.as_ref())
            else {
                continue;
            };

            match self
                .deduct_ingredients_from_recipe(option_recipe, quantity, order_id)
                .await
            {
                Ok(deduction) => result.recipes.push(deduction),
                Err(e) => {
                    tracing::warn!(
                        menu_item = %item.name,
                        group = %selected.group_name,
                        option = %selected.option_name,
                        error = %e,
                        "Option deduction failed"
                    );
                    result.option_failures.push(OptionFailure {
                        group_name: selected.group_name.clone(),
                        option_name: selected.option_name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(result)
    }

    /// Deduct inventory for every line of a confirmed order.
    ///
    /// Runs at most once per order id. Every line is attempted even when an earlier
    /// one fails; the report is successful only if all lines were. Orders that end
    /// with any failure are left in the ledger for review.
    pub async fn process_order_inventory_deduction(
        &self,
        order_id: Uuid,
        line_items: &[OrderLineItem],
    ) -> InventoryResult<OrderDeductionReport> {
        if !self.ledger.claim(order_id).await? {
            tracing::warn!(%order_id, "Inventory already deducted for order, skipping");
            return Err(InventoryError::AlreadyDeducted(order_id));
        }

        let mut lines = Vec::with_capacity(line_items.len());
        for line in line_items {
            let outcome = self
                .deduct_ingredients_for_menu_item(
                    &line.menu_item_id,
                    line.size.as_deref(),
                    &line.selected_options,
                    line.quantity,
                    Some(order_id),
                )
                .await;

            lines.push(match outcome {
                Ok(deduction) => LineDeduction {
                    menu_item_id: line.menu_item_id.clone(),
                    deduction: Some(deduction),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(
                        %order_id,
                        menu_item_id = %line.menu_item_id,
                        error = %e,
                        "Line item deduction failed"
                    );
                    LineDeduction {
                        menu_item_id: line.menu_item_id.clone(),
                        deduction: None,
                        error: Some(e.to_string()),
                    }
                }
            });
        }

        let success = lines.iter().all(LineDeduction::is_success);
        let report = OrderDeductionReport {
            order_id,
            success,
            lines,
        };

        let (status, detail) = match report.failure_summary() {
            None => (DeductionStatus::Applied, None),
            Some(summary) => (DeductionStatus::NeedsReview, Some(summary)),
        };

        if success {
            tracing::info!(%order_id, lines = report.lines.len(), "Order inventory deducted");
        } else {
            tracing::error!(
                %order_id,
                detail = detail.as_deref().unwrap_or_default(),
                "Order inventory deduction incomplete, flagged for review"
            );
        }

        if let Err(e) = self.ledger.record_outcome(order_id, status, detail).await {
            tracing::error!(%order_id, error = %e, "Failed to record deduction outcome");
        }

        Ok(report)
    }
}
