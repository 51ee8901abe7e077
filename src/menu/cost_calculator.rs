use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::inventory::IngredientStore;
use crate::menu::models::{MenuItem, MenuOption, OptionGroup, Recipe};

/// Computes the ingredient cost of one serving of a recipe
///
/// Lookups are lenient: blank ingredient ids, quantities that are not positive,
/// unknown ingredients and failed lookups contribute nothing instead of failing the whole estimate, because
/// recipes are edited a line at a time and often point at ingredients that do
/// not exist yet.
#[derive(Clone)]
pub struct RecipeCostCalculator {
    ingredients: Arc<dyn IngredientStore>,
}

impl RecipeCostCalculator {
    pub fn new(ingredients: Arc<dyn IngredientStore>) -> Self {
        Self { ingredients }
    }

    /// Cost per serving: sum of `quantity * cost_per_unit` over resolvable lines,
    /// divided by the serving size (at least one).
    pub async fn calculate_cost(&self, recipe: &Recipe) -> Decimal {
        let mut total = Decimal::ZERO;

        for line in recipe.configured_ingredients() {
            if line.quantity <= Decimal::ZERO {
                tracing::debug!(
                    recipe = %recipe.name,
                    ingredient_id = %line.ingredient_id,
                    quantity = %line.quantity,
                    "Quantity is not positive, excluded from recipe cost"
                );
                continue;
            }

            match self.ingredients.get(&line.ingredient_id).await {
                Ok(Some(ingredient)) => {
                    total += line.quantity * ingredient.cost_per_unit;
                }
                Ok(None) => {
                    tracing::debug!(
                        recipe = %recipe.name,
                        ingredient_id = %line.ingredient_id,
                        "Ingredient not found, excluded from recipe cost"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        recipe = %recipe.name,
                        ingredient_id = %line.ingredient_id,
                        error = %e,
                        "Ingredient lookup failed, excluded from recipe cost"
                    );
                }
            }
        }

        per_serving(total, recipe.effective_serving_size())
    }
}

/// Divide a batch cost across its servings
pub fn per_serving(total: Decimal, serving_size: i32) -> Decimal {
    total / Decimal::from(serving_size.max(1))
}

/// Catalog cost breakdown of a menu item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItemCost {
    pub base_cost: Decimal,
    /// Option group name to the cost of every option in that group
    pub option_costs: BTreeMap<String, Decimal>,
    pub total_cost: Decimal,
}

/// Aggregates recipe costs over the sizes and options of a menu item
#[derive(Clone)]
pub struct MenuItemCostAggregator {
    recipes: RecipeCostCalculator,
}

impl MenuItemCostAggregator {
    pub fn new(recipes: RecipeCostCalculator) -> Self {
        Self { recipes }
    }

    pub fn recipe_calculator(&self) -> &RecipeCostCalculator {
        &self.recipes
    }

    pub async fn calculate_option_cost(&self, option: &MenuOption) -> Decimal {
        match &option.recipe {
            Some(recipe) => self.recipes.calculate_cost(recipe).await,
            None => Decimal::ZERO,
        }
    }

    /// Cost of every option in the group, chosen or not.
    ///
    /// This is the catalog summary figure; order costing goes through
    /// `calculate_menu_item_configuration_cost`.
    pub async fn calculate_option_group_cost(&self, group: &OptionGroup) -> Decimal {
        let mut total = Decimal::ZERO;
        for option in &group.options {
            total += self.calculate_option_cost(option).await;
        }
        total
    }

    /// Catalog cost of a menu item: default-size (or legacy) recipe plus every
    /// option of every group.
    pub async fn calculate_menu_item_total_cost(&self, item: &MenuItem) -> MenuItemCost {
        let base_cost = match item.catalog_recipe() {
            Some(recipe) => self.recipes.calculate_cost(recipe).await,
            None => Decimal::ZERO,
        };

        let mut option_costs = BTreeMap::new();
        for group in &item.option_groups {
            let cost = self.calculate_option_group_cost(group).await;
            *option_costs.entry(group.name.clone()).or_insert(Decimal::ZERO) += cost;
        }

        let total_cost = base_cost + option_costs.values().copied().sum::<Decimal>();

        MenuItemCost {
            base_cost,
            option_costs,
            total_cost,
        }
    }

    /// Cost of one ordered configuration: the chosen size's recipe plus only the
    /// options named in `selected_options` (group name to option names).
    ///
    /// Groups or options that do not exist on the item are skipped.
    pub async fn calculate_menu_item_configuration_cost(
        &self,
        item: &MenuItem,
        size_label: Option<&str>,
        selected_options: &HashMap<String, Vec<String>>,
    ) -> Decimal {
        let mut total = match item.configured_recipe(size_label) {
            Some(recipe) => self.recipes.calculate_cost(recipe).await,
            None => Decimal::ZERO,
        };

        for (group_name, option_names) in selected_options {
            let Some(group) = item.option_group(group_name) else {
                continue;
            };
            for option_name in option_names {
                match group.find_option(option_name) {
                    Some(option) => total += self.calculate_option_cost(option).await,
                    None => tracing::debug!(
                        menu_item = %item.name,
                        group = %group_name,
                        option = %option_name,
                        "Selected option not found, no cost added"
                    ),
                }
            }
        }

        total
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::inventory::{
        InMemoryInventory, Ingredient, IngredientCategory, IngredientStore, Unit,
    };
    use crate::menu::models::RecipeIngredient;
    use chrono::Utc;
    use proptest::prelude::*;

    /// Recipe cost equals sum(qty * cost) / serving size over a fixed ingredient snapshot
    #[test]
    fn prop_recipe_cost_matches_formula() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        proptest!(|(
            lines in prop::collection::vec((0usize..4, 1i64..=10_000), 0..8),
            serving_size in 1i32..=12
        )| {
            let ids = ["a", "b", "c", "missing"];
            let costs = [
                Decimal::new(1250, 2),
                Decimal::new(3, 0),
                Decimal::new(99999, 3),
            ];

            let total = runtime.block_on(async {
                let store = InMemoryInventory::new();
                for (id, cost) in ids.iter().zip(costs.iter()) {
                    let now = Utc::now();
                    store.create(Ingredient {
                        id: id.to_string(),
                        name: id.to_string(),
                        unit: Unit::Gram,
                        current_quantity: Decimal::ZERO,
                        minimum_threshold: Decimal::ZERO,
                        cost_per_unit: *cost,
                        supplier: None,
                        category: IngredientCategory::Other,
                        is_active: true,
                        expiry_date: None,
                        created_at: now,
                        updated_at: now,
                    }).await.unwrap();
                }

                let recipe = Recipe {
                    name: "Generated".to_string(),
                    serving_size,
                    ingredients: lines.iter().map(|(idx, qty)| RecipeIngredient {
                        ingredient_id: ids[*idx].to_string(),
                        quantity: Decimal::new(*qty, 2),
                        unit: Unit::Gram,
                        notes: None,
                    }).collect(),
                    ..Recipe::default()
                };

                RecipeCostCalculator::new(Arc::new(store)).calculate_cost(&recipe).await
            });

            let expected: Decimal = lines
                .iter()
                .filter(|(idx, _)| *idx < costs.len())
                .map(|(idx, qty)| Decimal::new(*qty, 2) * costs[*idx])
                .sum::<Decimal>()
                / Decimal::from(serving_size);

            prop_assert_eq!(total, expected);
        });
    }
}
