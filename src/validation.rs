//! Checks a generated recipe against the ingredients it was asked to use.
//!
//! The recipe prompt tells the model to stick to the listed ingredients, but
//! nothing guarantees it does. Every ingredient the recipe references is matched
//! against the requested ones and a short list of pantry staples.

use log::warn;
use serde::Deserialize;

use crate::error::CookmateError;
use crate::model::{Ingredient, Recipe};

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnlistedIngredientPolicy {
    /// Skip the check
    Allow,
    /// Keep the recipe and report the unlisted ingredients
    #[default]
    Flag,
    /// Fail generation when the recipe uses unlisted ingredients
    Reject,
}

#[derive(Debug, Clone)]
pub struct IngredientValidator {
    policy: UnlistedIngredientPolicy,
    pantry_staples: Vec<String>,
}

impl IngredientValidator {
    pub fn new(policy: UnlistedIngredientPolicy, pantry_staples: Vec<String>) -> Self {
        IngredientValidator {
            policy,
            pantry_staples,
        }
    }

    pub fn policy(&self) -> UnlistedIngredientPolicy {
        self.policy
    }

    /// Names of recipe ingredients that match neither a requested ingredient nor a staple
    pub fn unlisted(&self, recipe: &Recipe, requested: &[Ingredient]) -> Vec<String> {
        let allowed: Vec<Vec<String>> = requested
            .iter()
            .map(|i| i.name.as_str())
            .chain(self.pantry_staples.iter().map(String::as_str))
            .map(normalized_words)
            .filter(|words| !words.is_empty())
            .collect();

        recipe
            .ingredient_names()
            .into_iter()
            .filter(|name| {
                let words = normalized_words(name);
                !words.is_empty() && !allowed.iter().any(|a| covered_by(a, &words))
            })
            .collect()
    }

    /// Apply the configured policy; returns the unlisted names when the recipe is kept
    pub fn check(
        &self,
        recipe: &Recipe,
        requested: &[Ingredient],
    ) -> Result<Vec<String>, CookmateError> {
        if self.policy == UnlistedIngredientPolicy::Allow {
            return Ok(Vec::new());
        }

        let unlisted = self.unlisted(recipe, requested);
        if unlisted.is_empty() {
            return Ok(unlisted);
        }

        match self.policy {
            UnlistedIngredientPolicy::Reject => Err(CookmateError::UnlistedIngredients(unlisted)),
            _ => {
                warn!(
                    "Recipe '{}' uses unlisted ingredients: {}",
                    recipe.title,
                    unlisted.join(", ")
                );
                Ok(unlisted)
            }
        }
    }
}

impl Default for IngredientValidator {
    fn default() -> Self {
        IngredientValidator::new(
            UnlistedIngredientPolicy::default(),
            vec!["salt".to_string(), "pepper".to_string(), "water".to_string()],
        )
    }
}

// A recipe ingredient is covered when every one of its words appears in an allowed name,
// so "tomato" is covered by "cherry tomatoes" but "chicken stock" is not covered by "chicken".
fn covered_by(allowed: &[String], ingredient: &[String]) -> bool {
    ingredient.iter().all(|word| allowed.contains(word))
}

// Words that describe how an ingredient is sold or cut, not what it is
const QUALIFIERS: &[&str] = &[
    "fresh", "freshly", "ground", "sea", "kosher", "fine", "coarse", "table", "chopped", "diced",
    "sliced", "minced", "grated", "large", "medium", "small", "whole", "boiling", "lukewarm",
];

fn normalized_words(name: &str) -> Vec<String> {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| singular(&w.to_lowercase()))
        .filter(|w| !QUALIFIERS.contains(&w.as_str()))
        .collect()
}

fn singular(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        format!("{}y", stem)
    } else if let Some(stem) = word.strip_suffix("oes") {
        format!("{}o", stem)
    } else if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}
