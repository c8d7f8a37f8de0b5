//! Pulls the JSON payload out of free-form model answers.
//!
//! Models are asked to answer with a single JSON object but routinely wrap it in
//! prose or markdown fences. The payload is taken to be everything from the first
//! `{` to the last `}` of the answer.

use crate::error::ExtractionError;
use crate::model::{Ingredient, Recipe};
use log::{debug, warn};
use serde_json::Value;

/// Return the span from the first `{` to the last `}`, if there is one
pub fn json_span(text: &str) -> Result<&str, ExtractionError> {
    let start = text.find('{').ok_or(ExtractionError::NoPayload)?;
    let end = text.rfind('}').ok_or(ExtractionError::NoPayload)?;
    if end < start {
        return Err(ExtractionError::NoPayload);
    }
    Ok(&text[start..=end])
}

/// Parse the embedded JSON object and return the value stored under `field`
pub fn extract_field(text: &str, field: &str) -> Result<Value, ExtractionError> {
    let span = json_span(text)?;
    let mut payload: Value = serde_json::from_str(span)
        .map_err(|e| ExtractionError::MalformedPayload(e.to_string()))?;

    match payload.get_mut(field) {
        Some(value) => Ok(value.take()),
        None => {
            debug!("Payload without '{}': {}", field, span);
            Err(ExtractionError::SchemaMismatch(format!(
                "missing '{}' field",
                field
            )))
        }
    }
}

/// Parse an ingredient-identification answer into its `ingredients` list.
///
/// Entries with a blank name are dropped.
pub fn parse_ingredients(text: &str) -> Result<Vec<Ingredient>, ExtractionError> {
    let value = extract_field(text, "ingredients")?;
    let ingredients: Vec<Ingredient> = serde_json::from_value(value).map_err(|e| {
        ExtractionError::SchemaMismatch(format!("'ingredients' is not a list of ingredients: {}", e))
    })?;

    let total = ingredients.len();
    let ingredients: Vec<Ingredient> = ingredients
        .into_iter()
        .filter(|i| !i.name.trim().is_empty())
        .collect();
    if ingredients.len() < total {
        warn!(
            "Dropped {} ingredient(s) without a name",
            total - ingredients.len()
        );
    }

    Ok(ingredients)
}

/// Parse a recipe-generation answer into its `recipe` object
pub fn parse_recipe(text: &str) -> Result<Recipe, ExtractionError> {
    let value = extract_field(text, "recipe")?;
    let recipe: Recipe = serde_json::from_value(value)
        .map_err(|e| ExtractionError::SchemaMismatch(format!("'recipe' is not a recipe: {}", e)))?;

    if recipe.title.trim().is_empty() {
        return Err(ExtractionError::SchemaMismatch(
            "recipe has no title".to_string(),
        ));
    }
    if !recipe.has_keyable_title() {
        return Err(ExtractionError::SchemaMismatch(format!(
            "recipe title '{}' has no letters or digits",
            recipe.title
        )));
    }

    Ok(recipe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingredients_surrounded_by_prose() {
        let answer = r#"Sure! Here is what I can see in the picture:

```json
{
  "ingredients": [
    {"name": "cherry tomatoes", "quantity": "12", "unit": "pieces", "preparation": "whole", "location": "in the bowl"},
    {"name": "olive oil", "quantity": "100", "unit": "ml"}
  ]
}
```

Let me know if you need anything else."#;

        let ingredients = parse_ingredients(answer).unwrap();
        assert_eq!(ingredients.len(), 2);
        assert_eq!(ingredients[0].name, "cherry tomatoes");
        assert_eq!(ingredients[0].quantity, "12");
        assert_eq!(ingredients[0].location.as_deref(), Some("in the bowl"));
        assert_eq!(ingredients[1].unit, "ml");
        assert!(ingredients[1].preparation.is_none());
    }

    #[test]
    fn test_no_payload() {
        let result = parse_ingredients("I could not find any food in this image.");
        assert!(matches!(result, Err(ExtractionError::NoPayload)));

        // A closing brace before the opening one is not a span
        let result = parse_ingredients("} nothing here {");
        assert!(matches!(result, Err(ExtractionError::NoPayload)));
    }

    #[test]
    fn test_malformed_payload() {
        let result = parse_ingredients(r#"{"ingredients": [{"name": "egg",},]}"#);
        assert!(matches!(result, Err(ExtractionError::MalformedPayload(_))));
    }

    #[test]
    fn test_schema_mismatch() {
        let result = parse_ingredients(r#"Result: {"items": [{"name": "egg"}]}"#);
        match result {
            Err(ExtractionError::SchemaMismatch(msg)) => assert!(msg.contains("ingredients")),
            other => panic!("expected schema mismatch, got {:?}", other),
        }

        let result = parse_ingredients(r#"{"ingredients": "egg, flour"}"#);
        assert!(matches!(result, Err(ExtractionError::SchemaMismatch(_))));
    }

    #[test]
    fn test_greedy_span_covers_nested_objects() {
        let answer = r#"{"ingredients": [{"name": "rice", "quantity": "1", "unit": "cup"}]} and a note {sic}"#;
        // The greedy span swallows the trailing note and no longer parses
        assert!(matches!(
            parse_ingredients(answer),
            Err(ExtractionError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_blank_names_are_dropped() {
        let answer = r#"{"ingredients": [{"name": " ", "quantity": "1", "unit": ""}, {"name": "leek", "quantity": 2, "unit": "piece"}]}"#;
        let ingredients = parse_ingredients(answer).unwrap();
        assert_eq!(ingredients.len(), 1);
        assert_eq!(ingredients[0].name, "leek");
        assert_eq!(ingredients[0].quantity, "2");
    }

    #[test]
    fn test_parse_recipe() {
        let answer = r#"Here you go: {"recipe": {"title": "Egg Fried Rice", "servings": 2, "readyInMinutes": 15,
            "extendedIngredients": [{"name": "egg", "amount": 2, "unit": "piece"}]}}"#;
        let recipe = parse_recipe(answer).unwrap();
        assert_eq!(recipe.title, "Egg Fried Rice");
        assert_eq!(recipe.servings, Some(2));
        assert_eq!(recipe.extended_ingredients[0].name, "egg");
    }

    #[test]
    fn test_parse_recipe_requires_title() {
        let result = parse_recipe(r#"{"recipe": {"servings": 2}}"#);
        assert!(matches!(result, Err(ExtractionError::SchemaMismatch(_))));

        let result = parse_recipe(r#"{"title": "Soup"}"#);
        assert!(matches!(result, Err(ExtractionError::SchemaMismatch(_))));
    }

    #[test]
    fn test_parse_recipe_rejects_punctuation_title() {
        let result = parse_recipe(r#"{"recipe": {"title": "!!!", "servings": 2}}"#);
        assert!(matches!(result, Err(ExtractionError::SchemaMismatch(_))));

        let recipe = parse_recipe(r#"{"recipe": {"title": "Pho!", "servings": 2}}"#).unwrap();
        assert_eq!(recipe.key().as_str(), "title-pho");
    }
}
