// Validation utilities module
// Custom validation functions for the inventory and menu request DTOs

use rust_decimal::Decimal;
use validator::ValidationError;

use crate::menu::Recipe;

/// Validates that a decimal amount is zero or greater
pub fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(ValidationError::new("must_not_be_negative"))
    } else {
        Ok(())
    }
}

/// Validates that a decimal amount is strictly positive
pub fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        Err(ValidationError::new("must_be_positive"))
    } else {
        Ok(())
    }
}

/// Validates a recipe saved through the API.
///
/// A saved recipe needs a name, at least one ingredient line, and an ingredient id and
/// a positive quantity on every line. The costing and deduction code stays lenient about incomplete recipes
/// so that documents written before this check still work.
pub fn validate_recipe(recipe: &Recipe) -> Result<(), ValidationError> {
    if recipe.name.trim().is_empty() {
        return Err(ValidationError::new("recipe_name_required"));
    }
    if recipe.ingredients.is_empty() {
        return Err(ValidationError::new("recipe_needs_ingredients"));
    }
    if recipe
        .ingredients
        .iter()
        .any(|line| line.ingredient_id.trim().is_empty())
    {
        return Err(ValidationError::new("recipe_ingredient_id_required"));
    }
    if recipe
        .ingredients
        .iter()
        .any(|line| line.quantity <= Decimal::ZERO)
    {
        return Err(ValidationError::new("recipe_quantity_must_be_positive"));
    }
    Ok(())
}
