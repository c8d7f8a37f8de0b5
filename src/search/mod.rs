//! Recipe search against the Spoonacular API, plus debouncing.

mod debounce;
mod spoonacular;

pub use debounce::{DebouncedSearch, SearchOutcome, DEFAULT_DEBOUNCE};
pub use spoonacular::SearchClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CookmateError;
use crate::model::Recipe;

/// Optional filters narrowing a search. Empty lists and `None` bounds are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub cuisines: Vec<String>,
    pub diets: Vec<String>,
    pub intolerances: Vec<String>,
    pub dish_types: Vec<String>,
    pub min_carbs: Option<u32>,
    pub max_carbs: Option<u32>,
    pub min_protein: Option<u32>,
    pub max_protein: Option<u32>,
    pub min_fat: Option<u32>,
    pub max_fat: Option<u32>,
}

#[async_trait]
pub trait RecipeSearch: Send + Sync + 'static {
    /// Find recipes matching a free-text query. A blank query yields no recipes.
    async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<Recipe>, CookmateError>;
}
