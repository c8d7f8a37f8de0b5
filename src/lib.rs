//! Core of the Cookmate app: identify ingredients in a photo, write a recipe
//! from them, search recipes and keep track of the ones a user saved.
//!
//! ```no_run
//! # use cookmate::{Cookmate, ImageSource, RecipeConstraints};
//! # #[tokio::main]
//! # async fn main() -> Result<(), cookmate::CookmateError> {
//! let cookmate = Cookmate::from_config(&cookmate::AppConfig::load()?)?;
//! let ingredients = cookmate
//!     .identify_ingredients(&ImageSource::Path("fridge.jpg".to_string()))
//!     .await?;
//! let generated = cookmate
//!     .generate_recipe(&ingredients, &RecipeConstraints::default())
//!     .await?;
//! cookmate
//!     .repository()
//!     .save_generated_recipe(&generated.recipe, "cook@example.com")
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod extract;
pub mod media;
pub mod model;
pub mod pipelines;
pub mod providers;
pub mod repository;
pub mod search;
pub mod store;
pub mod uniffi_bindings;
pub mod validation;

#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();

pub use builder::{Cookmate, CookmateBuilder};
pub use config::AppConfig;
pub use error::{CookmateError, ExtractionError};
pub use media::ImageSource;
pub use model::{Ingredient, Recipe, RecipeKey, SavedRecipeRecord, StoredRecipe, UserProfile};
pub use pipelines::GeneratedRecipe;
pub use providers::{EquipmentLevel, RecipeConstraints};
pub use repository::RecipeRepository;
pub use search::{SearchFilters, SearchOutcome};
pub use validation::{IngredientValidator, UnlistedIngredientPolicy};

/// Identify the ingredients in a photo using configuration from `cookmate.toml` and the environment
pub async fn identify_ingredients(image: &ImageSource) -> Result<Vec<Ingredient>, CookmateError> {
    Cookmate::from_config(&AppConfig::load()?)?
        .identify_ingredients(image)
        .await
}

/// Write a recipe using configuration from `cookmate.toml` and the environment
pub async fn generate_recipe(
    ingredients: &[Ingredient],
    constraints: &RecipeConstraints,
) -> Result<GeneratedRecipe, CookmateError> {
    Cookmate::from_config(&AppConfig::load()?)?
        .generate_recipe(ingredients, constraints)
        .await
}

/// Search recipes right away using configuration from `cookmate.toml` and the environment
pub async fn search_recipes(
    query: &str,
    filters: &SearchFilters,
) -> Result<Vec<Recipe>, CookmateError> {
    use crate::search::RecipeSearch;

    let config = AppConfig::load()?;
    search::SearchClient::new(&config.search, config.http_client()?)?
        .search(query, filters)
        .await
}
