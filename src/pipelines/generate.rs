use super::GeneratedRecipe;
use crate::error::CookmateError;
use crate::extract::parse_recipe;
use crate::model::Ingredient;
use crate::providers::{
    build_recipe_prompt, GenerationRequest, GenerativeModel, RecipeConstraints, ResponseFormat,
    RECIPE_SYSTEM_INSTRUCTION,
};
use crate::validation::IngredientValidator;
use log::{debug, info};

/// Sampling settings for recipe generation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        GenerationSettings {
            temperature: 0.7,
            response_format: ResponseFormat::Text,
        }
    }
}

/// Write a recipe from the confirmed ingredients and the user's constraints
///
/// This pipeline:
/// 1. Builds the recipe prompt (fails on an empty ingredient list or zero servings)
/// 2. Sends it with the chef system instruction
/// 3. Extracts the `recipe` object from the answer
/// 4. Checks the recipe's ingredients against the ones provided
pub async fn generate_recipe(
    model: &dyn GenerativeModel,
    ingredients: &[Ingredient],
    constraints: &RecipeConstraints,
    settings: &GenerationSettings,
    validator: &IngredientValidator,
) -> Result<GeneratedRecipe, CookmateError> {
    let prompt = build_recipe_prompt(ingredients, constraints)?;
    let request = GenerationRequest::new(prompt)
        .with_system_instruction(RECIPE_SYSTEM_INSTRUCTION)
        .with_temperature(settings.temperature)
        .with_response_format(settings.response_format);

    let answer = model.generate(&request).await?;
    debug!("Recipe answer: {}", answer);

    let recipe = parse_recipe(&answer)?;
    let unlisted_ingredients = validator.check(&recipe, ingredients)?;
    info!(
        "Generated '{}' with {} via {}",
        recipe.title,
        ingredients.len(),
        model.provider_name()
    );

    Ok(GeneratedRecipe {
        recipe,
        unlisted_ingredients,
    })
}
