//! Persistence of recipes, saved recipes and user profiles.

use chrono::Utc;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::CookmateError;
use crate::model::{Recipe, RecipeKey, SavedRecipeRecord, StoredRecipe, UserProfile};
use crate::store::{Direction, Document, DocumentStore, Query};

pub const USERS: &str = "users";
pub const RECIPES: &str = "recipes";
pub const SAVED_RECIPES: &str = "savedRecipes";

/// Reads and writes the app's collections through a [`DocumentStore`]
#[derive(Clone)]
pub struct RecipeRepository {
    store: Arc<dyn DocumentStore>,
}

impl RecipeRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        RecipeRepository { store }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// Save a recipe for a user.
    ///
    /// The recipe itself is written to `recipes` only when no document with the
    /// same key exists yet. A new saved record is written every time. The
    /// lookup and the insert are two separate calls, so two concurrent saves of
    /// a new recipe can both insert it.
    pub async fn save_generated_recipe(
        &self,
        recipe: &Recipe,
        owner_email: &str,
    ) -> Result<SavedRecipeRecord, CookmateError> {
        if recipe.id.is_none() && !recipe.has_keyable_title() {
            return Err(CookmateError::InvalidInput(format!(
                "recipe title '{}' cannot identify the recipe",
                recipe.title
            )));
        }
        let recipe_key = recipe.key();
        let now = Utc::now();

        let existing = self
            .store
            .query(
                RECIPES,
                &Query::new()
                    .where_eq("recipeKey", recipe_key.as_str())
                    .limit(1),
            )
            .await?;
        if existing.is_empty() {
            let stored = StoredRecipe {
                recipe: recipe.clone(),
                recipe_key: recipe_key.clone(),
                created_on: now,
                created_by: Some(owner_email.to_string()),
            };
            let id = self.store.add(RECIPES, to_document(&stored)?).await?;
            info!("Stored recipe '{}' as {}", recipe.title, id);
        } else {
            debug!("Recipe {} already stored", recipe_key);
        }

        let mut record = SavedRecipeRecord {
            id: None,
            recipe_data: recipe.clone(),
            recipe_title: recipe.title.clone(),
            recipe_key,
            user: owner_email.to_string(),
            saved_on: now,
        };
        let id = self.store.add(SAVED_RECIPES, to_document(&record)?).await?;
        record.id = Some(id);
        Ok(record)
    }

    /// Remove every saved record of `recipe_key` for the user; returns how many were removed
    pub async fn unsave_recipe(
        &self,
        recipe_key: &RecipeKey,
        user_email: &str,
    ) -> Result<usize, CookmateError> {
        let saved = self.saved_records(recipe_key, user_email).await?;
        for document in &saved {
            self.store.delete(SAVED_RECIPES, &document.id).await?;
        }
        info!(
            "Removed {} saved record(s) of {} for {}",
            saved.len(),
            recipe_key,
            user_email
        );
        Ok(saved.len())
    }

    pub async fn is_recipe_saved(
        &self,
        recipe_key: &RecipeKey,
        user_email: &str,
    ) -> Result<bool, CookmateError> {
        Ok(!self.saved_records(recipe_key, user_email).await?.is_empty())
    }

    async fn saved_records(
        &self,
        recipe_key: &RecipeKey,
        user_email: &str,
    ) -> Result<Vec<Document>, CookmateError> {
        self.store
            .query(
                SAVED_RECIPES,
                &Query::new()
                    .where_eq("recipeKey", recipe_key.as_str())
                    .where_eq("user", user_email),
            )
            .await
    }

    /// Saved records of a user, newest first
    pub async fn list_saved_recipes(
        &self,
        owner_email: &str,
    ) -> Result<Vec<SavedRecipeRecord>, CookmateError> {
        let documents = self
            .store
            .query(
                SAVED_RECIPES,
                &Query::new()
                    .where_eq("user", owner_email)
                    .order_by("savedOn", Direction::Descending),
            )
            .await?;

        documents
            .into_iter()
            .map(|document| {
                let id = document.id.clone();
                let mut record: SavedRecipeRecord = from_document(document)?;
                record.id = Some(id);
                Ok(record)
            })
            .collect()
    }

    /// Every stored recipe, newest first
    pub async fn list_all_recipes(&self) -> Result<Vec<StoredRecipe>, CookmateError> {
        let documents = self
            .store
            .query(
                RECIPES,
                &Query::new().order_by("createdOn", Direction::Descending),
            )
            .await?;
        documents.into_iter().map(from_document).collect()
    }

    /// Recipes first stored by the given user, newest first
    pub async fn list_recipes_created_by(
        &self,
        email: &str,
    ) -> Result<Vec<StoredRecipe>, CookmateError> {
        let documents = self
            .store
            .query(
                RECIPES,
                &Query::new()
                    .where_eq("createdBy", email)
                    .order_by("createdOn", Direction::Descending),
            )
            .await?;
        documents.into_iter().map(from_document).collect()
    }

    /// Write the profile under the user's email
    pub async fn create_user_profile(&self, profile: &UserProfile) -> Result<(), CookmateError> {
        if profile.email.trim().is_empty() {
            return Err(CookmateError::InvalidInput(
                "a user profile needs an email".to_string(),
            ));
        }
        self.store
            .set(USERS, &profile.email, to_document(profile)?)
            .await?;
        info!("Created profile for {}", profile.email);
        Ok(())
    }

    pub async fn get_user_profile(
        &self,
        email: &str,
    ) -> Result<Option<UserProfile>, CookmateError> {
        self.store
            .get(USERS, email)
            .await?
            .map(from_document)
            .transpose()
    }
}

fn to_document<T: Serialize>(value: &T) -> Result<Value, CookmateError> {
    Ok(serde_json::to_value(value)?)
}

fn from_document<T: DeserializeOwned>(document: Document) -> Result<T, CookmateError> {
    serde_json::from_value(document.data).map_err(|e| {
        CookmateError::Store(format!("document {} has an unexpected shape: {}", document.id, e))
    })
}
