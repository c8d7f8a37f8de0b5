use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::validation::UnlistedIngredientPolicy;

/// Main application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// Generative model settings
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Recipe search API settings
    #[serde(default)]
    pub search: SearchConfig,
    /// Document database settings
    #[serde(default)]
    pub store: StoreConfig,
    /// Recipe generation settings
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Request timeout in seconds; requests wait indefinitely when unset
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Configuration for the Gemini generative model
#[derive(Debug, Deserialize, Clone)]
pub struct GeminiConfig {
    /// API key (can also be set via GEMINI_API_KEY)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for proxies and tests)
    pub base_url: Option<String>,
    /// Model used to identify ingredients in photos
    #[serde(default = "default_model")]
    pub caption_model: String,
    /// Model used to write recipes
    #[serde(default = "default_model")]
    pub recipe_model: String,
    /// Temperature for recipe generation (0.0-1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Ask the model for a JSON-only answer
    #[serde(default)]
    pub structured_output: bool,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            caption_model: default_model(),
            recipe_model: default_model(),
            temperature: default_temperature(),
            structured_output: false,
        }
    }
}

/// Configuration for the recipe search API
#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// API key (can also be set via SPOONACULAR_API_KEY)
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Quiet period after the last keystroke before a search is sent
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            debounce_ms: default_debounce_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store, lost when the process exits
    #[default]
    Memory,
    /// Firestore over its REST API
    Firestore,
}

/// Configuration for the document database
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Firebase project id (required for firestore)
    pub project_id: Option<String>,
    /// Web API key (can also be set via FIREBASE_API_KEY)
    pub api_key: Option<String>,
    /// ID token of the signed-in user, sent as bearer token
    pub id_token: Option<String>,
    pub base_url: Option<String>,
}

/// Configuration for recipe generation
#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    /// What to do when a generated recipe uses ingredients that were not provided
    #[serde(default)]
    pub unlisted_ingredients: UnlistedIngredientPolicy,
    /// Ingredients assumed to be available in every kitchen
    #[serde(default = "default_pantry_staples")]
    pub pantry_staples: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            unlisted_ingredients: UnlistedIngredientPolicy::default(),
            pantry_staples: default_pantry_staples(),
        }
    }
}

// Default value functions
fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_pantry_staples() -> Vec<String> {
    vec!["salt".to_string(), "pepper".to_string(), "water".to_string()]
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with COOKMATE__ prefix
    /// 2. cookmate.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: COOKMATE__GEMINI__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    /// HTTP client shared by every external service
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build()
    }
}

/// Load configuration from file and environment variables
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("cookmate").required(false))
        // Use double underscore for nested: COOKMATE__GEMINI__API_KEY
        .add_source(
            Environment::with_prefix("COOKMATE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("generation.pantry_staples"),
        )
        .build()?;

    settings.try_deserialize()
}
