use clap::{Args, Parser, Subcommand};
use log::{error, info};
use serde::Serialize;
use std::process::ExitCode;

use cookmate::search::{RecipeSearch, SearchClient};
use cookmate::store::open_store;
use cookmate::{
    AppConfig, Cookmate, CookmateError, EquipmentLevel, ImageSource, Ingredient,
    RecipeConstraints, RecipeKey, RecipeRepository, SearchFilters,
};

#[derive(Parser, Debug)]
#[command(name = "cookmate")]
#[command(author, version, about = "Turn a photo of your ingredients into a recipe", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the ingredients visible in a photo
    Identify {
        /// Path to the photo
        image: String,
    },
    /// Write a recipe from a list of ingredients
    Generate {
        /// Ingredient as name[:quantity[:unit]], repeatable
        #[arg(short, long = "ingredient", value_parser = parse_ingredient, required = true)]
        ingredients: Vec<Ingredient>,
        #[arg(long, default_value_t = 1)]
        servings: u32,
        #[arg(long = "cuisine")]
        cuisines: Vec<String>,
        #[arg(long = "dish-type")]
        dish_types: Vec<String>,
        #[arg(long = "diet")]
        diets: Vec<String>,
        #[arg(long = "intolerance")]
        intolerances: Vec<String>,
        /// Maximum total cooking time in minutes
        #[arg(long)]
        max_minutes: Option<u32>,
        #[arg(long)]
        min_protein: Option<u32>,
        #[arg(long)]
        min_fat: Option<u32>,
        #[arg(long)]
        min_carbs: Option<u32>,
        /// basic, intermediate or advanced
        #[arg(long, default_value = "basic")]
        equipment: EquipmentLevel,
        /// Save the recipe for this user
        #[arg(long)]
        save_for: Option<String>,
    },
    /// Search recipes
    Search {
        query: String,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Recipes saved by a user, newest first
    Saved { email: String },
    /// Every stored recipe, newest first
    Recipes {
        /// Only recipes first stored by this user
        #[arg(long)]
        created_by: Option<String>,
    },
    /// Remove a saved recipe for a user
    Unsave { recipe_key: String, email: String },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    #[arg(long = "cuisine")]
    cuisines: Vec<String>,
    #[arg(long = "diet")]
    diets: Vec<String>,
    #[arg(long = "intolerance")]
    intolerances: Vec<String>,
    #[arg(long = "dish-type")]
    dish_types: Vec<String>,
    /// Grams per serving
    #[arg(long)]
    min_carbs: Option<u32>,
    #[arg(long)]
    max_carbs: Option<u32>,
    #[arg(long)]
    min_protein: Option<u32>,
    #[arg(long)]
    max_protein: Option<u32>,
    #[arg(long)]
    min_fat: Option<u32>,
    #[arg(long)]
    max_fat: Option<u32>,
}

impl From<FilterArgs> for SearchFilters {
    fn from(args: FilterArgs) -> Self {
        SearchFilters {
            cuisines: args.cuisines,
            diets: args.diets,
            intolerances: args.intolerances,
            dish_types: args.dish_types,
            min_carbs: args.min_carbs,
            max_carbs: args.max_carbs,
            min_protein: args.min_protein,
            max_protein: args.max_protein,
            min_fat: args.min_fat,
            max_fat: args.max_fat,
        }
    }
}

fn parse_ingredient(raw: &str) -> Result<Ingredient, String> {
    let mut parts = raw.splitn(3, ':');
    let name = parts.next().unwrap_or_default();
    let quantity = parts.next().unwrap_or_default();
    let unit = parts.next().unwrap_or_default();
    Ingredient::manual(name, quantity, unit)
        .ok_or_else(|| format!("ingredient '{}' has no name", raw))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CookmateError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn repository(config: &AppConfig) -> Result<RecipeRepository, CookmateError> {
    let store = open_store(&config.store, config.http_client()?)?;
    Ok(RecipeRepository::new(store))
}

async fn run(cli: Cli) -> Result<(), CookmateError> {
    let config = AppConfig::load()?;

    match cli.command {
        Command::Identify { image } => {
            let cookmate = Cookmate::from_config(&config)?;
            let ingredients = cookmate
                .identify_ingredients(&ImageSource::Path(image))
                .await?;
            print_json(&ingredients)
        }
        Command::Generate {
            ingredients,
            servings,
            cuisines,
            dish_types,
            diets,
            intolerances,
            max_minutes,
            min_protein,
            min_fat,
            min_carbs,
            equipment,
            save_for,
        } => {
            let constraints = RecipeConstraints {
                cuisines,
                dish_types,
                intolerances,
                diets,
                servings,
                max_cooking_minutes: max_minutes,
                min_protein_grams: min_protein,
                min_fat_grams: min_fat,
                min_carbs_grams: min_carbs,
                equipment_level: equipment,
            };
            let cookmate = Cookmate::from_config(&config)?;
            let generated = cookmate.generate_recipe(&ingredients, &constraints).await?;
            if !generated.unlisted_ingredients.is_empty() {
                eprintln!(
                    "Note: the recipe also uses {}",
                    generated.unlisted_ingredients.join(", ")
                );
            }
            if let Some(email) = save_for {
                let record = cookmate
                    .repository()
                    .save_generated_recipe(&generated.recipe, &email)
                    .await?;
                info!("Saved as {}", record.recipe_key);
            }
            print_json(&generated.recipe)
        }
        Command::Search { query, filters } => {
            let filters = SearchFilters::from(filters);
            let client = SearchClient::new(&config.search, config.http_client()?)?;
            let recipes = client.search(&query, &filters).await?;
            print_json(&recipes)
        }
        Command::Saved { email } => {
            let saved = repository(&config)?.list_saved_recipes(&email).await?;
            print_json(&saved)
        }
        Command::Recipes { created_by } => {
            let repository = repository(&config)?;
            let recipes = match created_by {
                Some(email) => repository.list_recipes_created_by(&email).await?,
                None => repository.list_all_recipes().await?,
            };
            print_json(&recipes)
        }
        Command::Unsave { recipe_key, email } => {
            let removed = repository(&config)?
                .unsave_recipe(&RecipeKey::from(recipe_key), &email)
                .await?;
            println!("Removed {} saved record(s)", removed);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
