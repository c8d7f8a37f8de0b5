//! UniFFI bindings for cookmate
//!
//! This module provides FFI-compatible types and functions for use with iOS and Android.
//! The scaffolding itself is set up at the crate root.
//! It wraps the async Rust API with synchronous functions that manage their own tokio runtime.
//! Recipes cross the boundary as JSON strings in the search API shape.

use std::fmt;

use crate::config::AppConfig;
use crate::media::ImageSource;
use crate::model::{Ingredient, Recipe, RecipeKey};
use crate::providers::{EquipmentLevel, RecipeConstraints};
use crate::repository::RecipeRepository;
use crate::search::SearchFilters;
use crate::store::open_store;
use crate::{Cookmate, CookmateError};

/// FFI-compatible ingredient
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiIngredient {
    pub name: String,
    pub quantity: String,
    pub unit: String,
    /// Empty string if none
    pub preparation: String,
}

impl From<Ingredient> for FfiIngredient {
    fn from(ingredient: Ingredient) -> Self {
        FfiIngredient {
            name: ingredient.name,
            quantity: ingredient.quantity,
            unit: ingredient.unit,
            preparation: ingredient.preparation.unwrap_or_default(),
        }
    }
}

impl From<FfiIngredient> for Ingredient {
    fn from(ffi: FfiIngredient) -> Self {
        let ingredient = Ingredient::new(ffi.name, ffi.quantity, ffi.unit);
        if ffi.preparation.is_empty() {
            ingredient
        } else {
            ingredient.with_preparation(ffi.preparation)
        }
    }
}

/// FFI-compatible equipment level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
pub enum FfiEquipmentLevel {
    #[default]
    Basic,
    Intermediate,
    Advanced,
}

impl From<FfiEquipmentLevel> for EquipmentLevel {
    fn from(level: FfiEquipmentLevel) -> Self {
        match level {
            FfiEquipmentLevel::Basic => EquipmentLevel::Basic,
            FfiEquipmentLevel::Intermediate => EquipmentLevel::Intermediate,
            FfiEquipmentLevel::Advanced => EquipmentLevel::Advanced,
        }
    }
}

/// FFI-compatible recipe constraints (0 means "not set"; servings then default to 1)
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiRecipeConstraints {
    pub cuisines: Vec<String>,
    pub dish_types: Vec<String>,
    pub intolerances: Vec<String>,
    pub diets: Vec<String>,
    pub servings: u32,
    pub max_cooking_minutes: u32,
    pub min_protein_grams: u32,
    pub min_fat_grams: u32,
    pub min_carbs_grams: u32,
    pub equipment_level: FfiEquipmentLevel,
}

fn non_zero(value: u32) -> Option<u32> {
    (value > 0).then_some(value)
}

impl From<FfiRecipeConstraints> for RecipeConstraints {
    fn from(ffi: FfiRecipeConstraints) -> Self {
        RecipeConstraints {
            cuisines: ffi.cuisines,
            dish_types: ffi.dish_types,
            intolerances: ffi.intolerances,
            diets: ffi.diets,
            servings: ffi.servings.max(1),
            max_cooking_minutes: non_zero(ffi.max_cooking_minutes),
            min_protein_grams: non_zero(ffi.min_protein_grams),
            min_fat_grams: non_zero(ffi.min_fat_grams),
            min_carbs_grams: non_zero(ffi.min_carbs_grams),
            equipment_level: ffi.equipment_level.into(),
        }
    }
}

/// FFI-compatible search filters (0 means "no bound")
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiSearchFilters {
    pub cuisines: Vec<String>,
    pub diets: Vec<String>,
    pub intolerances: Vec<String>,
    pub dish_types: Vec<String>,
    pub min_carbs: u32,
    pub max_carbs: u32,
    pub min_protein: u32,
    pub max_protein: u32,
    pub min_fat: u32,
    pub max_fat: u32,
}

impl From<FfiSearchFilters> for SearchFilters {
    fn from(ffi: FfiSearchFilters) -> Self {
        SearchFilters {
            cuisines: ffi.cuisines,
            diets: ffi.diets,
            intolerances: ffi.intolerances,
            dish_types: ffi.dish_types,
            min_carbs: non_zero(ffi.min_carbs),
            max_carbs: non_zero(ffi.max_carbs),
            min_protein: non_zero(ffi.min_protein),
            max_protein: non_zero(ffi.max_protein),
            min_fat: non_zero(ffi.min_fat),
            max_fat: non_zero(ffi.max_fat),
        }
    }
}

/// FFI-compatible error type
#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Error))]
pub enum FfiCookmateError {
    /// The photo could not be read
    PermissionDenied { message: String },
    /// The model answer did not contain the expected JSON
    ExtractionError { message: String },
    /// A network request or remote service failed
    NetworkError { message: String },
    /// Invalid input provided
    InvalidInput { message: String },
    /// The generated recipe uses ingredients that were not provided
    UnlistedIngredients { message: String },
    /// Configuration error
    ConfigError { message: String },
    /// Document database error
    StoreError { message: String },
    /// Runtime error (tokio)
    RuntimeError { message: String },
}

impl fmt::Display for FfiCookmateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FfiCookmateError::PermissionDenied { message } => {
                write!(f, "Permission denied: {}", message)
            }
            FfiCookmateError::ExtractionError { message } => {
                write!(f, "Extraction error: {}", message)
            }
            FfiCookmateError::NetworkError { message } => write!(f, "Network error: {}", message),
            FfiCookmateError::InvalidInput { message } => write!(f, "Invalid input: {}", message),
            FfiCookmateError::UnlistedIngredients { message } => {
                write!(f, "Unlisted ingredients: {}", message)
            }
            FfiCookmateError::ConfigError { message } => write!(f, "Config error: {}", message),
            FfiCookmateError::StoreError { message } => write!(f, "Store error: {}", message),
            FfiCookmateError::RuntimeError { message } => write!(f, "Runtime error: {}", message),
        }
    }
}

impl std::error::Error for FfiCookmateError {}

impl From<CookmateError> for FfiCookmateError {
    fn from(err: CookmateError) -> Self {
        let message = err.to_string();
        match err {
            CookmateError::PermissionDenied(_) => FfiCookmateError::PermissionDenied { message },
            CookmateError::Extraction(_) => FfiCookmateError::ExtractionError { message },
            CookmateError::Http(_) | CookmateError::Api { .. } | CookmateError::EmptyResponse(_) => {
                FfiCookmateError::NetworkError { message }
            }
            CookmateError::InvalidInput(_) | CookmateError::Io(_) => {
                FfiCookmateError::InvalidInput { message }
            }
            CookmateError::UnlistedIngredients(names) => FfiCookmateError::UnlistedIngredients {
                message: names.join(", "),
            },
            CookmateError::Config(_) => FfiCookmateError::ConfigError { message },
            CookmateError::Store(_) | CookmateError::Serialization(_) => {
                FfiCookmateError::StoreError { message }
            }
            CookmateError::Task(_) => FfiCookmateError::RuntimeError { message },
        }
    }
}

/// Create a new tokio runtime for FFI calls
fn create_runtime() -> Result<tokio::runtime::Runtime, FfiCookmateError> {
    tokio::runtime::Runtime::new().map_err(|e| FfiCookmateError::RuntimeError {
        message: format!("Failed to create async runtime: {}", e),
    })
}

fn cookmate() -> Result<Cookmate, FfiCookmateError> {
    let config = AppConfig::load().map_err(CookmateError::from)?;
    Ok(Cookmate::from_config(&config)?)
}

// The memory backend lives only as long as the repository, so apps use the firestore backend
fn repository() -> Result<RecipeRepository, FfiCookmateError> {
    let config = AppConfig::load().map_err(CookmateError::from)?;
    let client = config.http_client().map_err(CookmateError::from)?;
    Ok(RecipeRepository::new(open_store(&config.store, client)?))
}

/// Parse the ingredient list out of a model answer
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn parse_ingredients(answer: String) -> Result<Vec<FfiIngredient>, FfiCookmateError> {
    let ingredients = crate::extract::parse_ingredients(&answer).map_err(CookmateError::from)?;
    Ok(ingredients.into_iter().map(Into::into).collect())
}

/// Build the recipe prompt for the given ingredients and constraints
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn build_recipe_prompt(
    ingredients: Vec<FfiIngredient>,
    constraints: FfiRecipeConstraints,
) -> Result<String, FfiCookmateError> {
    let ingredients: Vec<Ingredient> = ingredients.into_iter().map(Into::into).collect();
    Ok(crate::providers::build_recipe_prompt(
        &ingredients,
        &constraints.into(),
    )?)
}

/// Identify the ingredients in the photo at `image_path`
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn identify_ingredients(image_path: String) -> Result<Vec<FfiIngredient>, FfiCookmateError> {
    let rt = create_runtime()?;
    rt.block_on(identify_ingredients_async(image_path))
}

async fn identify_ingredients_async(
    image_path: String,
) -> Result<Vec<FfiIngredient>, FfiCookmateError> {
    let ingredients = cookmate()?
        .identify_ingredients(&ImageSource::Path(image_path))
        .await?;
    Ok(ingredients.into_iter().map(Into::into).collect())
}

/// Generate a recipe and return it as JSON
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn generate_recipe_json(
    ingredients: Vec<FfiIngredient>,
    constraints: FfiRecipeConstraints,
) -> Result<String, FfiCookmateError> {
    let rt = create_runtime()?;
    rt.block_on(generate_recipe_async(ingredients, constraints))
}

async fn generate_recipe_async(
    ingredients: Vec<FfiIngredient>,
    constraints: FfiRecipeConstraints,
) -> Result<String, FfiCookmateError> {
    let ingredients: Vec<Ingredient> = ingredients.into_iter().map(Into::into).collect();
    let generated = cookmate()?
        .generate_recipe(&ingredients, &constraints.into())
        .await?;
    let json = serde_json::to_string(&generated.recipe).map_err(CookmateError::from)?;
    Ok(json)
}

/// Search recipes and return the results as a JSON array
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn search_recipes_json(
    query: String,
    filters: FfiSearchFilters,
) -> Result<String, FfiCookmateError> {
    let rt = create_runtime()?;
    rt.block_on(search_recipes_async(query, filters))
}

async fn search_recipes_async(
    query: String,
    filters: FfiSearchFilters,
) -> Result<String, FfiCookmateError> {
    let recipes = crate::search_recipes(&query, &filters.into()).await?;
    let json = serde_json::to_string(&recipes).map_err(CookmateError::from)?;
    Ok(json)
}

/// Save a recipe (JSON in the search API shape) for a user; returns the saved record as JSON
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn save_recipe_json(recipe_json: String, email: String) -> Result<String, FfiCookmateError> {
    let recipe: Recipe =
        serde_json::from_str(&recipe_json).map_err(|e| FfiCookmateError::InvalidInput {
            message: format!("Not a recipe: {}", e),
        })?;
    let rt = create_runtime()?;
    rt.block_on(save_recipe_async(recipe, email))
}

async fn save_recipe_async(recipe: Recipe, email: String) -> Result<String, FfiCookmateError> {
    let record = repository()?.save_generated_recipe(&recipe, &email).await?;
    let json = serde_json::to_string(&record).map_err(CookmateError::from)?;
    Ok(json)
}

/// Remove a user's saved records for a recipe; returns how many were removed
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn unsave_recipe(recipe_key: String, email: String) -> Result<u32, FfiCookmateError> {
    let rt = create_runtime()?;
    rt.block_on(unsave_recipe_async(recipe_key, email))
}

async fn unsave_recipe_async(recipe_key: String, email: String) -> Result<u32, FfiCookmateError> {
    let removed = repository()?
        .unsave_recipe(&RecipeKey::from(recipe_key), &email)
        .await?;
    Ok(u32::try_from(removed).unwrap_or(u32::MAX))
}

#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn is_recipe_saved(recipe_key: String, email: String) -> Result<bool, FfiCookmateError> {
    let rt = create_runtime()?;
    rt.block_on(is_recipe_saved_async(recipe_key, email))
}

async fn is_recipe_saved_async(recipe_key: String, email: String) -> Result<bool, FfiCookmateError> {
    Ok(repository()?
        .is_recipe_saved(&RecipeKey::from(recipe_key), &email)
        .await?)
}

/// A user's saved records, newest first, as a JSON array
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn list_saved_recipes_json(email: String) -> Result<String, FfiCookmateError> {
    let rt = create_runtime()?;
    rt.block_on(list_saved_recipes_async(email))
}

async fn list_saved_recipes_async(email: String) -> Result<String, FfiCookmateError> {
    let saved = repository()?.list_saved_recipes(&email).await?;
    let json = serde_json::to_string(&saved).map_err(CookmateError::from)?;
    Ok(json)
}

/// Get the library version
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;

    #[test]
    fn test_ffi_ingredient_conversion() {
        let ingredient = Ingredient::new("onion", "1", "piece").with_preparation("diced");
        let ffi: FfiIngredient = ingredient.clone().into();
        assert_eq!(ffi.preparation, "diced");

        let back: Ingredient = ffi.into();
        assert_eq!(back, ingredient);

        let plain: Ingredient = FfiIngredient {
            name: "egg".to_string(),
            quantity: "2".to_string(),
            unit: "piece".to_string(),
            preparation: String::new(),
        }
        .into();
        assert!(plain.preparation.is_none());
    }

    #[test]
    fn test_ffi_constraints_conversion() {
        let constraints: RecipeConstraints = FfiRecipeConstraints {
            servings: 2,
            max_cooking_minutes: 30,
            equipment_level: FfiEquipmentLevel::Advanced,
            ..Default::default()
        }
        .into();

        assert_eq!(constraints.servings, 2);
        assert_eq!(constraints.max_cooking_minutes, Some(30));
        assert_eq!(constraints.min_fat_grams, None);
        assert_eq!(constraints.equipment_level, EquipmentLevel::Advanced);
    }

    #[test]
    fn test_ffi_search_filters_conversion() {
        let filters: SearchFilters = FfiSearchFilters {
            cuisines: vec!["Thai".to_string()],
            max_carbs: 60,
            min_protein: 20,
            ..Default::default()
        }
        .into();

        assert_eq!(filters.cuisines, vec!["Thai"]);
        assert_eq!(filters.max_carbs, Some(60));
        assert_eq!(filters.min_protein, Some(20));
        assert_eq!(filters.min_carbs, None);
        assert_eq!(filters.max_fat, None);
    }

    #[test]
    fn test_save_recipe_rejects_bad_json() {
        let err = save_recipe_json("not json".to_string(), "cook@example.com".to_string())
            .unwrap_err();
        assert!(matches!(err, FfiCookmateError::InvalidInput { .. }));
    }

    #[test]
    fn test_parse_ingredients_ffi() {
        let ingredients =
            parse_ingredients(r#"Sure! {"ingredients": [{"name": "egg", "quantity": "2", "unit": "piece"}]}"#.to_string())
                .unwrap();
        assert_eq!(ingredients.len(), 1);
        assert_eq!(ingredients[0].name, "egg");

        let err = parse_ingredients("no json here".to_string()).unwrap_err();
        assert!(matches!(err, FfiCookmateError::ExtractionError { .. }));
    }

    #[test]
    fn test_build_recipe_prompt_ffi() {
        let prompt = build_recipe_prompt(
            vec![FfiIngredient {
                name: "egg".to_string(),
                quantity: "2".to_string(),
                unit: "piece".to_string(),
                preparation: String::new(),
            }],
            FfiRecipeConstraints {
                servings: 2,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(prompt.contains("\"egg\""));
        assert!(prompt.contains("2 servings"));

        let err = build_recipe_prompt(vec![], FfiRecipeConstraints::default()).unwrap_err();
        assert!(matches!(err, FfiCookmateError::InvalidInput { .. }));
    }

    #[test]
    fn test_error_mapping() {
        let err: FfiCookmateError = CookmateError::UnlistedIngredients(vec![
            "butter".to_string(),
            "milk".to_string(),
        ])
        .into();
        assert_eq!(err.to_string(), "Unlisted ingredients: butter, milk");

        let err: FfiCookmateError = CookmateError::from(ExtractionError::NoPayload).into();
        assert!(matches!(err, FfiCookmateError::ExtractionError { .. }));
    }

    #[test]
    fn test_get_version() {
        let version = get_version();
        assert!(!version.is_empty());
    }
}
