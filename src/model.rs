use chrono::{DateTime, SecondsFormat, Utc};
use scraper::Html;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// An ingredient recognised in a photo or entered by hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub quantity: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Ingredient {
    pub fn new(
        name: impl Into<String>,
        quantity: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Ingredient {
            name: name.into(),
            quantity: quantity.into(),
            unit: unit.into(),
            preparation: None,
            location: None,
        }
    }

    /// Ingredient added by the user; blank quantity and unit fall back to "1 piece".
    pub fn manual(name: &str, quantity: &str, unit: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let quantity = match quantity.trim() {
            "" => "1",
            q => q,
        };
        let unit = match unit.trim() {
            "" => "piece",
            u => u,
        };
        Some(Ingredient::new(name, quantity, unit))
    }

    pub fn with_preparation(mut self, preparation: impl Into<String>) -> Self {
        self.preparation = Some(preparation.into());
        self
    }
}

// Models sometimes answer `"quantity": 2` instead of `"quantity": "2"`.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, found {}",
            other
        ))),
    }
}

/// A recipe in the shape returned by the recipe search API.
///
/// Generated recipes are requested in the same shape so both sources can be
/// stored and rendered the same way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_in_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default)]
    pub vegetarian: bool,
    #[serde(default)]
    pub vegan: bool,
    #[serde(default)]
    pub gluten_free: bool,
    #[serde(default)]
    pub dairy_free: bool,
    #[serde(default)]
    pub very_healthy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cuisines: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dish_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extended_ingredients: Vec<RecipeIngredient>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub analyzed_instructions: Vec<InstructionSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default)]
    pub nutrients: Vec<Nutrient>,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrient {
    pub name: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_of_daily_needs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstructionSet {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub number: u32,
    pub step: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingredients: Vec<StepItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equipment: Vec<StepItem>,
}

/// Ingredient or equipment referenced by a single instruction step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

impl Recipe {
    /// Look up a nutrient such as "Calories", "Protein", "Fat" or "Carbohydrates"
    pub fn nutrient(&self, name: &str) -> Option<&Nutrient> {
        self.nutrition
            .as_ref()?
            .nutrients
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(name))
    }

    /// Steps of the first instruction set, which is the one the app renders
    pub fn steps(&self) -> &[Step] {
        self.analyzed_instructions
            .first()
            .map(|set| set.steps.as_slice())
            .unwrap_or(&[])
    }

    /// Every ingredient name the recipe refers to, deduplicated case-insensitively
    pub fn ingredient_names(&self) -> Vec<String> {
        let from_nutrition = self
            .nutrition
            .iter()
            .flat_map(|n| n.ingredients.iter().map(|i| i.name.as_str()));
        let from_extended = self.extended_ingredients.iter().map(|i| i.name.as_str());
        let from_steps = self
            .analyzed_instructions
            .iter()
            .flat_map(|set| set.steps.iter())
            .flat_map(|step| step.ingredients.iter().map(|i| i.name.as_str()));

        let mut names: Vec<String> = Vec::new();
        for name in from_extended.chain(from_nutrition).chain(from_steps) {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// The HTML summary reduced to plain text
    pub fn summary_text(&self) -> Option<String> {
        let summary = self.summary.as_deref()?;
        let fragment = Html::parse_fragment(summary);
        let text = fragment
            .root_element()
            .text()
            .collect::<Vec<_>>()
            .join("");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    pub fn key(&self) -> RecipeKey {
        RecipeKey::for_recipe(self)
    }

    /// Whether the title has letters or digits to build a key from
    pub fn has_keyable_title(&self) -> bool {
        !slugify(&self.title).is_empty()
    }
}

/// Canonical identity of a recipe across the `recipes` and `savedRecipes` collections.
///
/// Recipes from the search API carry a numeric id; generated recipes do not and
/// are identified by their title, so two generated recipes with the same title
/// share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeKey(String);

impl RecipeKey {
    pub fn for_recipe(recipe: &Recipe) -> Self {
        match recipe.id {
            Some(id) => RecipeKey(format!("spoonacular-{}", id)),
            None => RecipeKey(format!("title-{}", slugify(&recipe.title))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RecipeKey {
    fn from(key: String) -> Self {
        RecipeKey(key)
    }
}

impl From<&str> for RecipeKey {
    fn from(key: &str) -> Self {
        RecipeKey(key.to_string())
    }
}

impl fmt::Display for RecipeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// A recipe document in the `recipes` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecipe {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub recipe_key: RecipeKey,
    #[serde(with = "timestamp")]
    pub created_on: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

/// Join record linking a user to a snapshot of a recipe they saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipeRecord {
    /// Store-assigned document id, only present on records read back
    #[serde(skip)]
    pub id: Option<String>,
    pub recipe_data: Recipe,
    pub recipe_title: String,
    pub recipe_key: RecipeKey,
    /// Email of the owning user
    pub user: String,
    #[serde(with = "timestamp")]
    pub saved_on: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub member: bool,
    pub uid: String,
}

/// RFC 3339 with fixed millisecond precision, so string order equals time order.
pub(crate) mod timestamp {
    use super::*;
    use serde::Serializer;

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ingredient_accepts_numeric_quantity() {
        let ingredient: Ingredient =
            serde_json::from_value(json!({"name": "egg", "quantity": 2, "unit": "piece"}))
                .unwrap();
        assert_eq!(ingredient.quantity, "2");
        assert!(ingredient.preparation.is_none());
    }

    #[test]
    fn test_manual_ingredient_defaults() {
        let ingredient = Ingredient::manual("Tomato", "", " ").unwrap();
        assert_eq!(ingredient.quantity, "1");
        assert_eq!(ingredient.unit, "piece");
        assert!(Ingredient::manual("   ", "2", "cups").is_none());
    }

    #[test]
    fn test_recipe_key() {
        let search_result = Recipe {
            id: Some(716429),
            title: "Pasta with Garlic".to_string(),
            ..Default::default()
        };
        assert_eq!(search_result.key().as_str(), "spoonacular-716429");

        let generated = Recipe {
            title: "Egg & Tomato Scramble!".to_string(),
            ..Default::default()
        };
        assert_eq!(generated.key().as_str(), "title-egg-tomato-scramble");
    }

    #[test]
    fn test_recipe_from_search_shape() {
        let recipe: Recipe = serde_json::from_value(json!({
            "id": 1,
            "title": "Shakshuka",
            "readyInMinutes": 25,
            "glutenFree": true,
            "summary": "A <b>spicy</b> egg dish &amp; more",
            "nutrition": {
                "nutrients": [
                    {"name": "Protein", "amount": 18.5, "unit": "g", "percentOfDailyNeeds": 37.0}
                ],
                "ingredients": [{"id": 5, "name": "eggs", "amount": 4, "unit": ""}]
            },
            "analyzedInstructions": [{
                "name": "",
                "steps": [{
                    "number": 1,
                    "step": "Simmer tomatoes.",
                    "ingredients": [{"id": 9, "name": "tomatoes", "image": "tomato.png"}],
                    "equipment": [{"id": 3, "name": "pan", "image": "pan.png"}]
                }]
            }]
        }))
        .unwrap();

        assert!(recipe.gluten_free);
        assert_eq!(recipe.ready_in_minutes, Some(25));
        assert_eq!(recipe.nutrient("protein").unwrap().amount, 18.5);
        assert_eq!(recipe.steps().len(), 1);
        assert_eq!(recipe.ingredient_names(), vec!["eggs", "tomatoes"]);
        assert_eq!(
            recipe.summary_text().as_deref(),
            Some("A spicy egg dish & more")
        );
    }

    #[test]
    fn test_saved_record_timestamp_format() {
        let saved_on = DateTime::parse_from_rfc3339("2025-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let record = SavedRecipeRecord {
            id: None,
            recipe_data: Recipe::default(),
            recipe_title: "Soup".to_string(),
            recipe_key: RecipeKey::from("title-soup"),
            user: "cook@example.com".to_string(),
            saved_on,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["savedOn"], "2025-03-01T10:00:00.000Z");
        assert_eq!(value["recipeKey"], "title-soup");

        let back: SavedRecipeRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back.saved_on, saved_on);
    }
}
