pub mod caption;
pub mod generate;

use crate::model::Recipe;

/// A generated recipe together with the outcome of the ingredient check
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedRecipe {
    pub recipe: Recipe,
    /// Ingredients the recipe uses that were not provided (empty when the check passed or was skipped)
    pub unlisted_ingredients: Vec<String>,
}
