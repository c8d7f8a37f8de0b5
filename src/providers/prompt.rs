use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CookmateError;
use crate::model::Ingredient;

/// The prompt sent alongside a photo to identify the ingredients in it.
///
/// Loaded from `caption_prompt.txt` at compile time.
pub const INGREDIENT_CAPTION_PROMPT: &str = include_str!("caption_prompt.txt");

/// System instruction for recipe generation, loaded from `recipe_system_prompt.txt`.
pub const RECIPE_SYSTEM_INSTRUCTION: &str = include_str!("recipe_system_prompt.txt");

const RECIPE_SHAPE: &str = r#"{
  "recipe": {
    "title": "string",
    "summary": "string",
    "readyInMinutes": number,
    "servings": number,
    "vegetarian": boolean,
    "vegan": boolean,
    "glutenFree": boolean,
    "dairyFree": boolean,
    "cuisines": ["string"],
    "dishTypes": ["string"],
    "diets": ["string"],
    "extendedIngredients": [
      { "name": "string", "amount": number, "unit": "string" }
    ],
    "nutrition": {
      "nutrients": [
        { "name": "Calories" | "Protein" | "Fat" | "Carbohydrates", "amount": number, "unit": "string", "percentOfDailyNeeds": number }
      ]
    },
    "analyzedInstructions": [
      {
        "name": "",
        "steps": [
          {
            "number": number,
            "step": "string",
            "ingredients": [{ "name": "string" }],
            "equipment": [{ "name": "string" }]
          }
        ]
      }
    ]
  }
}"#;

/// How well equipped the cook's kitchen is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipmentLevel {
    #[default]
    Basic,
    Intermediate,
    Advanced,
}

impl EquipmentLevel {
    fn description(&self) -> &'static str {
        match self {
            EquipmentLevel::Basic => "a stovetop, one pan, one pot, a knife and a cutting board",
            EquipmentLevel::Intermediate => {
                "a standard home kitchen with an oven, a blender and common pans and bakeware"
            }
            EquipmentLevel::Advanced => {
                "a fully equipped kitchen, including specialist tools such as a stand mixer, food processor or sous-vide"
            }
        }
    }
}

impl fmt::Display for EquipmentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquipmentLevel::Basic => f.write_str("Basic"),
            EquipmentLevel::Intermediate => f.write_str("Intermediate"),
            EquipmentLevel::Advanced => f.write_str("Advanced"),
        }
    }
}

impl std::str::FromStr for EquipmentLevel {
    type Err = CookmateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(EquipmentLevel::Basic),
            "intermediate" => Ok(EquipmentLevel::Intermediate),
            "advanced" => Ok(EquipmentLevel::Advanced),
            other => Err(CookmateError::InvalidInput(format!(
                "unknown equipment level '{}'",
                other
            ))),
        }
    }
}

/// User preferences a generated recipe has to honour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeConstraints {
    pub cuisines: Vec<String>,
    pub dish_types: Vec<String>,
    pub intolerances: Vec<String>,
    pub diets: Vec<String>,
    pub servings: u32,
    pub max_cooking_minutes: Option<u32>,
    pub min_protein_grams: Option<u32>,
    pub min_fat_grams: Option<u32>,
    pub min_carbs_grams: Option<u32>,
    pub equipment_level: EquipmentLevel,
}

impl Default for RecipeConstraints {
    fn default() -> Self {
        RecipeConstraints {
            cuisines: Vec::new(),
            dish_types: Vec::new(),
            intolerances: Vec::new(),
            diets: Vec::new(),
            servings: 1,
            max_cooking_minutes: None,
            min_protein_grams: None,
            min_fat_grams: None,
            min_carbs_grams: None,
            equipment_level: EquipmentLevel::Basic,
        }
    }
}

impl RecipeConstraints {
    pub fn validate(&self) -> Result<(), CookmateError> {
        if self.servings == 0 {
            return Err(CookmateError::InvalidInput(
                "servings must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Build the recipe-generation prompt.
///
/// Every ingredient is listed verbatim with its name quoted, followed by the
/// constraints that were set. Unset constraints are left out entirely.
pub fn build_recipe_prompt(
    ingredients: &[Ingredient],
    constraints: &RecipeConstraints,
) -> Result<String, CookmateError> {
    constraints.validate()?;
    if ingredients.is_empty() {
        return Err(CookmateError::InvalidInput(
            "at least one ingredient is required".to_string(),
        ));
    }

    let mut prompt = String::new();
    prompt.push_str("Create one recipe using only these ingredients:\n");
    for ingredient in ingredients {
        prompt.push_str(&format!(
            "- \"{}\": {} {}",
            ingredient.name, ingredient.quantity, ingredient.unit
        ));
        if let Some(preparation) = ingredient.preparation.as_deref() {
            prompt.push_str(&format!(" ({})", preparation));
        }
        prompt.push('\n');
    }
    prompt.push_str(
        "Do not introduce any ingredient that is not in this list, apart from salt, pepper and water.\n\n",
    );

    prompt.push_str("Requirements:\n");
    let servings = match constraints.servings {
        1 => "1 serving".to_string(),
        n => format!("{} servings", n),
    };
    prompt.push_str(&format!("- The recipe makes {}.\n", servings));
    if !constraints.cuisines.is_empty() {
        prompt.push_str(&format!("- Cuisine: {}.\n", constraints.cuisines.join(", ")));
    }
    if !constraints.dish_types.is_empty() {
        prompt.push_str(&format!("- Dish type: {}.\n", constraints.dish_types.join(", ")));
    }
    if !constraints.diets.is_empty() {
        prompt.push_str(&format!(
            "- It must fit these diets: {}.\n",
            constraints.diets.join(", ")
        ));
    }
    if !constraints.intolerances.is_empty() {
        prompt.push_str(&format!(
            "- It must be safe for these intolerances: {}.\n",
            constraints.intolerances.join(", ")
        ));
    }
    if let Some(minutes) = constraints.max_cooking_minutes {
        prompt.push_str(&format!(
            "- Total cooking time of at most {} minutes.\n",
            minutes
        ));
    }
    let macros: Vec<String> = [
        ("protein", constraints.min_protein_grams),
        ("fat", constraints.min_fat_grams),
        ("carbohydrates", constraints.min_carbs_grams),
    ]
    .into_iter()
    .filter_map(|(name, grams)| grams.map(|g| format!("{}g {}", g, name)))
    .collect();
    if !macros.is_empty() {
        prompt.push_str(&format!(
            "- Each serving provides at least {}.\n",
            macros.join(", ")
        ));
    }
    prompt.push_str(&format!(
        "- Equipment level: {} ({}).\n",
        constraints.equipment_level,
        constraints.equipment_level.description()
    ));

    prompt.push_str("\nAnswer with a single JSON object structured as follows:\n\n");
    prompt.push_str(RECIPE_SHAPE);
    prompt.push('\n');

    Ok(prompt)
}
