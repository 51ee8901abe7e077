use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::{Validate, ValidationError};

use crate::inventory::Unit;
use crate::validation::{validate_non_negative, validate_recipe};

/// One ingredient line of a recipe
///
/// `quantity` is expressed in the ingredient's stored unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    #[serde(default, alias = "ingredientId")]
    pub ingredient_id: String,
    pub quantity: Decimal,
    pub unit: Unit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A named formula producing `serving_size` servings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default, alias = "prepTime")]
    pub prep_time_minutes: i32,
    #[serde(default = "default_serving_size", alias = "servingSize")]
    pub serving_size: i32,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_serving_size() -> i32 {
    1
}

impl Recipe {
    /// Divisor for per-serving cost; anything below one counts as a single serving
    pub fn effective_serving_size(&self) -> i32 {
        self.serving_size.max(1)
    }

    /// Lines that name an ingredient; blank ids are recipes still being edited
    pub fn configured_ingredients(&self) -> impl Iterator<Item = &RecipeIngredient> {
        self.ingredients
            .iter()
            .filter(|line| !line.ingredient_id.trim().is_empty())
    }
}

/// Availability of a menu item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuItemStatus {
    #[serde(alias = "AVAILABLE")]
    Available,
    #[serde(alias = "UNAVAILABLE_TODAY")]
    UnavailableToday,
    #[serde(alias = "UNAVAILABLE_PERMANENTLY")]
    UnavailablePermanently,
}

impl Default for MenuItemStatus {
    fn default() -> Self {
        MenuItemStatus::Available
    }
}

/// A sellable size of a menu item, with its own price and recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemSize {
    #[serde(alias = "name")]
    pub size: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Recipe>,
    #[serde(default, alias = "costPrice", skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<Decimal>,
}

/// One choice inside an option group; may consume ingredients of its own
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuOption {
    pub name: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Recipe>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub name: String,
    /// 0 makes the group optional
    #[serde(default, alias = "minSelection")]
    pub min_selection: u32,
    #[serde(default = "default_max_selection", alias = "maxSelection")]
    pub max_selection: u32,
    #[serde(default)]
    pub options: Vec<MenuOption>,
    #[serde(
        default,
        alias = "connectedMenuItems",
        skip_serializing_if = "Option::is_none"
    )]
    pub connected_menu_item_ids: Option<Vec<String>>,
}

fn default_max_selection() -> u32 {
    1
}

impl OptionGroup {
    pub fn find_option(&self, option_name: &str) -> Option<&MenuOption> {
        self.options.iter().find(|option| option.name == option_name)
    }
}

/// Where a menu item's preparation recipe comes from
///
/// Items created before sizes existed carry a single legacy recipe; newer items
/// carry one recipe per size.
#[derive(Debug, Clone, PartialEq)]
pub enum RecipeSource {
    Legacy {
        recipe: Option<Recipe>,
    },
    Sized {
        sizes: Vec<MenuItemSize>,
        default_size: Option<String>,
    },
}

impl Default for RecipeSource {
    fn default() -> Self {
        RecipeSource::Legacy { recipe: None }
    }
}

/// A sellable product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MenuItemDocument", into = "MenuItemDocument")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub description: String,
    pub status: MenuItemStatus,
    pub photos: Vec<String>,
    pub option_groups: Vec<OptionGroup>,
    pub recipe_source: RecipeSource,
    /// Hand-entered cost from before recipe costing existed
    pub cost_price: Option<Decimal>,
}

impl MenuItem {
    /// Sizes on offer; empty for legacy items
    pub fn sizes(&self) -> &[MenuItemSize] {
        match &self.recipe_source {
            RecipeSource::Sized { sizes, .. } => sizes,
            RecipeSource::Legacy { .. } => &[],
        }
    }

    fn size(&self, label: &str) -> Option<&MenuItemSize> {
        match &self.recipe_source {
            RecipeSource::Sized { sizes, .. } => sizes.iter().find(|size| size.size == label),
            RecipeSource::Legacy { .. } => None,
        }
    }

    /// Size an order line gets when it names none
    pub fn default_size(&self) -> Option<&MenuItemSize> {
        match &self.recipe_source {
            RecipeSource::Sized { default_size, .. } => {
                default_size.as_deref().and_then(|label| self.size(label))
            }
            RecipeSource::Legacy { .. } => None,
        }
    }

    /// Recipe used for catalog costing: the default size (or the first size), else
    /// the legacy recipe.
    pub fn catalog_recipe(&self) -> Option<&Recipe> {
        match &self.recipe_source {
            RecipeSource::Sized {
                sizes,
                default_size,
            } => default_size
                .as_deref()
                .and_then(|label| self.size(label))
                .or_else(|| sizes.first())
                .and_then(|size| size.recipe.as_ref()),
            RecipeSource::Legacy { recipe } => recipe.as_ref(),
        }
    }

    /// Recipe used for costing one ordered configuration: the named size, falling
    /// back to the first size, else the legacy recipe.
    pub fn configured_recipe(&self, size_label: Option<&str>) -> Option<&Recipe> {
        match &self.recipe_source {
            RecipeSource::Sized { sizes, .. } => size_label
                .and_then(|label| self.size(label))
                .or_else(|| sizes.first())
                .and_then(|size| size.recipe.as_ref()),
            RecipeSource::Legacy { recipe } => recipe.as_ref(),
        }
    }

    /// Recipe whose ingredients are consumed when this item is sold: the selected
    /// size, or the default size when none was selected. Unknown sizes resolve to
    /// no recipe.
    pub fn deduction_recipe(&self, selected_size: Option<&str>) -> Option<&Recipe> {
        match &self.recipe_source {
            RecipeSource::Sized { default_size, .. } => selected_size
                .or(default_size.as_deref())
                .and_then(|label| self.size(label))
                .and_then(|size| size.recipe.as_ref()),
            RecipeSource::Legacy { recipe } => recipe.as_ref(),
        }
    }

    pub fn option_group(&self, group_name: &str) -> Option<&OptionGroup> {
        self.option_groups
            .iter()
            .find(|group| group.name == group_name)
    }

    pub fn find_option(&self, group_name: &str, option_name: &str) -> Option<&MenuOption> {
        self.option_group(group_name)
            .and_then(|group| group.find_option(option_name))
    }
}

/// Stored shape of a menu item document
///
/// Accepts both the legacy single-recipe layout and the sized layout; camelCase keys
/// from older documents are accepted as aliases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuItemDocument {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: MenuItemStatus,
    #[serde(default, alias = "photoUrls")]
    pub photos: Vec<String>,
    #[serde(default, alias = "optionGroups")]
    pub option_groups: Vec<OptionGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<MenuItemSize>,
    #[serde(default, alias = "defaultSize", skip_serializing_if = "Option::is_none")]
    pub default_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<LegacyRecipe>,
    #[serde(default, alias = "costPrice", skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyRecipe {
    #[serde(default, alias = "baseRecipe")]
    pub base_recipe: Option<Recipe>,
}

impl From<MenuItemDocument> for MenuItem {
    fn from(doc: MenuItemDocument) -> Self {
        let recipe_source = if doc.sizes.is_empty() {
            RecipeSource::Legacy {
                recipe: doc.recipe.and_then(|legacy| legacy.base_recipe),
            }
        } else {
            RecipeSource::Sized {
                sizes: doc.sizes,
                default_size: doc.default_size,
            }
        };

        MenuItem {
            id: doc.id,
            name: doc.name,
            price: doc.price,
            category: doc.category,
            description: doc.description,
            status: doc.status,
            photos: doc.photos,
            option_groups: doc.option_groups,
            recipe_source,
            cost_price: doc.cost_price,
        }
    }
}

impl From<MenuItem> for MenuItemDocument {
    fn from(item: MenuItem) -> Self {
        let (sizes, default_size, recipe) = match item.recipe_source {
            RecipeSource::Sized {
                sizes,
                default_size,
            } => (sizes, default_size, None),
            RecipeSource::Legacy { recipe } => (
                Vec::new(),
                None,
                recipe.map(|base| LegacyRecipe {
                    base_recipe: Some(base),
                }),
            ),
        };

        MenuItemDocument {
            id: item.id,
            name: item.name,
            price: item.price,
            category: item.category,
            description: item.description,
            status: item.status,
            photos: item.photos,
            option_groups: item.option_groups,
            sizes,
            default_size,
            recipe,
            cost_price: item.cost_price,
        }
    }
}

/// Request DTO for creating a menu item
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_menu_item_recipes"))]
pub struct CreateMenuItemRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    #[validate(custom = "validate_non_negative")]
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: MenuItemStatus,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub option_groups: Vec<OptionGroup>,
    #[serde(default)]
    pub sizes: Vec<MenuItemSize>,
    pub default_size: Option<String>,
    pub recipe: Option<Recipe>,
}

fn validate_menu_item_recipes(request: &CreateMenuItemRequest) -> Result<(), ValidationError> {
    let size_recipes = request.sizes.iter().filter_map(|size| size.recipe.as_ref());
    let option_recipes = request
        .option_groups
        .iter()
        .flat_map(|group| group.options.iter())
        .filter_map(|option| option.recipe.as_ref());

    request
        .recipe
        .iter()
        .chain(size_recipes)
        .chain(option_recipes)
        .try_for_each(validate_recipe)
}

impl CreateMenuItemRequest {
    pub fn into_menu_item(self, id: String) -> MenuItem {
        MenuItem::from(MenuItemDocument {
            id,
            name: self.name,
            price: self.price,
            category: self.category,
            description: self.description,
            status: self.status,
            photos: self.photos,
            option_groups: self.option_groups,
            sizes: self.sizes,
            default_size: self.default_size,
            recipe: self.recipe.map(|base| LegacyRecipe {
                base_recipe: Some(base),
            }),
            cost_price: None,
        })
    }
}

/// Request DTO for pricing a specific configuration of a menu item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigurationCostRequest {
    pub size: Option<String>,
    /// Option group name to the chosen option names in that group
    #[serde(default)]
    pub selected_options: HashMap<String, Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn named_recipe(name: &str) -> Recipe {
        Recipe {
            name: name.to_string(),
            ..Recipe::default()
        }
    }

    fn sized_item(default_size: Option<&str>) -> MenuItem {
        MenuItem::from(MenuItemDocument {
            id: "tea".to_string(),
            name: "Milk Tea".to_string(),
            sizes: vec![
                MenuItemSize {
                    size: "M".to_string(),
                    price: dec!(30000),
                    recipe: Some(named_recipe("Milk Tea M")),
                    cost_price: None,
                },
                MenuItemSize {
                    size: "L".to_string(),
                    price: dec!(35000),
                    recipe: Some(named_recipe("Milk Tea L")),
                    cost_price: None,
                },
            ],
            default_size: default_size.map(str::to_string),
            ..MenuItemDocument::default()
        })
    }

    #[test]
    fn test_legacy_document_normalizes_to_legacy_source() {
        let item: MenuItem = serde_json::from_value(json!({
            "id": "latte",
            "name": "Latte",
            "price": 45000,
            "status": "AVAILABLE",
            "recipe": { "baseRecipe": { "name": "Latte", "servingSize": 1, "ingredients": [
                { "ingredientId": "milk", "quantity": "0.2", "unit": "liter" }
            ] } },
            "costPrice": 5000
        }))
        .unwrap();

        assert_eq!(item.status, MenuItemStatus::Available);
        assert_eq!(item.cost_price, Some(dec!(5000)));
        match &item.recipe_source {
            RecipeSource::Legacy { recipe: Some(recipe) } => {
                assert_eq!(recipe.ingredients[0].ingredient_id, "milk");
            }
            other => panic!("expected legacy recipe, got {:?}", other),
        }
    }

    #[test]
    fn test_sizes_take_precedence_over_legacy_recipe() {
        let item: MenuItem = serde_json::from_value(json!({
            "name": "Latte",
            "sizes": [{ "size": "M", "price": 40000 }],
            "defaultSize": "M",
            "recipe": { "baseRecipe": { "name": "Old Latte" } }
        }))
        .unwrap();

        assert!(matches!(item.recipe_source, RecipeSource::Sized { .. }));
        assert!(item.catalog_recipe().is_none());
    }

    #[test]
    fn test_round_trip_keeps_recipe_source() {
        let item = sized_item(Some("L"));
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["default_size"], "L");
        assert!(value.get("recipe").is_none());
        let back: MenuItem = serde_json::from_value(value).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_catalog_recipe_uses_default_size() {
        let item = sized_item(Some("L"));
        assert_eq!(item.catalog_recipe().unwrap().name, "Milk Tea L");
    }

    #[test]
    fn test_catalog_recipe_falls_back_to_first_size() {
        assert_eq!(sized_item(None).catalog_recipe().unwrap().name, "Milk Tea M");
        assert_eq!(
            sized_item(Some("XL")).catalog_recipe().unwrap().name,
            "Milk Tea M"
        );
    }

    #[test]
    fn test_configured_recipe_falls_back_to_first_size() {
        let item = sized_item(Some("L"));
        assert_eq!(item.configured_recipe(Some("L")).unwrap().name, "Milk Tea L");
        assert_eq!(item.configured_recipe(Some("XL")).unwrap().name, "Milk Tea M");
        assert_eq!(item.configured_recipe(None).unwrap().name, "Milk Tea M");
    }

    #[test]
    fn test_deduction_recipe_uses_selected_then_default_size() {
        let item = sized_item(Some("L"));
        assert_eq!(item.deduction_recipe(Some("M")).unwrap().name, "Milk Tea M");
        assert_eq!(item.deduction_recipe(None).unwrap().name, "Milk Tea L");
        assert!(item.deduction_recipe(Some("XL")).is_none());
        assert!(sized_item(None).deduction_recipe(None).is_none());
    }

    #[test]
    fn test_find_option_by_group_and_name() {
        let mut item = sized_item(None);
        item.option_groups.push(OptionGroup {
            name: "Toppings".to_string(),
            min_selection: 0,
            max_selection: 2,
            options: vec![MenuOption {
                name: "Pearls".to_string(),
                price: dec!(5000),
                recipe: None,
            }],
            connected_menu_item_ids: None,
        });

        assert!(item.find_option("Toppings", "Pearls").is_some());
        assert!(item.find_option("Toppings", "Jelly").is_none());
        assert!(item.find_option("Sugar", "Pearls").is_none());
    }

    #[test]
    fn test_effective_serving_size_never_below_one() {
        let mut recipe = named_recipe("Batch");
        recipe.serving_size = 0;
        assert_eq!(recipe.effective_serving_size(), 1);
        recipe.serving_size = -4;
        assert_eq!(recipe.effective_serving_size(), 1);
        recipe.serving_size = 8;
        assert_eq!(recipe.effective_serving_size(), 8);
    }

    #[test]
    fn test_create_request_rejects_incomplete_recipe() {
        let request: CreateMenuItemRequest = serde_json::from_value(json!({
            "name": "Latte",
            "price": 45000,
            "recipe": { "name": "Latte", "ingredients": [] }
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_rejects_negative_option_quantity() {
        let request: CreateMenuItemRequest = serde_json::from_value(json!({
            "name": "Latte",
            "price": "45000",
            "recipe": {
                "name": "Latte",
                "ingredients": [{ "ingredient_id": "milk", "quantity": "0.2", "unit": "liter" }]
            },
            "option_groups": [{
                "name": "Extras",
                "options": [{
                    "name": "Refund shot",
                    "recipe": {
                        "name": "Refund shot",
                        "ingredients": [{ "ingredient_id": "milk", "quantity": "-5", "unit": "liter" }]
                    }
                }]
            }]
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }
}
