use log::debug;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::CookmateError;
use crate::media::ImageSource;
use crate::model::Ingredient;
use crate::pipelines::generate::GenerationSettings;
use crate::pipelines::{caption, generate, GeneratedRecipe};
use crate::providers::{GeminiProvider, GenerativeModel, RecipeConstraints, ResponseFormat};
use crate::repository::RecipeRepository;
use crate::search::{DebouncedSearch, RecipeSearch, SearchClient, SearchFilters, SearchOutcome};
use crate::store::{open_store, DocumentStore, MemoryStore};
use crate::validation::IngredientValidator;

/// Entry point tying the models, search and persistence together
pub struct Cookmate {
    captioner: Arc<dyn GenerativeModel>,
    writer: Arc<dyn GenerativeModel>,
    search: Option<DebouncedSearch>,
    repository: RecipeRepository,
    validator: IngredientValidator,
    settings: GenerationSettings,
}

impl Cookmate {
    pub fn builder() -> CookmateBuilder {
        CookmateBuilder::default()
    }

    /// Wire everything from configuration.
    ///
    /// Search is left out when no Spoonacular key is available.
    pub fn from_config(config: &AppConfig) -> Result<Self, CookmateError> {
        let client = config.http_client()?;

        let captioner =
            GeminiProvider::new(&config.gemini, &config.gemini.caption_model, client.clone())?;
        let writer =
            GeminiProvider::new(&config.gemini, &config.gemini.recipe_model, client.clone())?;

        let mut builder = CookmateBuilder::default()
            .caption_model(Arc::new(captioner))
            .recipe_model(Arc::new(writer))
            .store(open_store(&config.store, client.clone())?)
            .validator(IngredientValidator::new(
                config.generation.unlisted_ingredients,
                config.generation.pantry_staples.clone(),
            ))
            .settings(GenerationSettings {
                temperature: config.gemini.temperature,
                response_format: if config.gemini.structured_output {
                    ResponseFormat::Json
                } else {
                    ResponseFormat::Text
                },
            })
            .debounce(Duration::from_millis(config.search.debounce_ms));

        match SearchClient::new(&config.search, client) {
            Ok(search) => builder = builder.search(Arc::new(search)),
            Err(e) => debug!("Recipe search disabled: {}", e),
        }

        builder.build()
    }

    /// Identify the ingredients in a photo
    pub async fn identify_ingredients(
        &self,
        image: &ImageSource,
    ) -> Result<Vec<Ingredient>, CookmateError> {
        caption::identify_ingredients(self.captioner.as_ref(), image).await
    }

    /// Write a recipe from confirmed ingredients
    pub async fn generate_recipe(
        &self,
        ingredients: &[Ingredient],
        constraints: &RecipeConstraints,
    ) -> Result<GeneratedRecipe, CookmateError> {
        generate::generate_recipe(
            self.writer.as_ref(),
            ingredients,
            constraints,
            &self.settings,
            &self.validator,
        )
        .await
    }

    /// Debounced search for search-as-you-type callers
    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<SearchOutcome, CookmateError> {
        self.search_client()?.search(query, filters).await
    }

    /// Search immediately, skipping the debounce delay
    pub async fn search_now(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<crate::model::Recipe>, CookmateError> {
        self.search_client()?.search_now(query, filters).await
    }

    fn search_client(&self) -> Result<&DebouncedSearch, CookmateError> {
        self.search.as_ref().ok_or_else(|| {
            CookmateError::InvalidInput(
                "recipe search is not configured (set SPOONACULAR_API_KEY)".to_string(),
            )
        })
    }

    pub fn repository(&self) -> &RecipeRepository {
        &self.repository
    }
}

/// Builder for [`Cookmate`]
pub struct CookmateBuilder {
    captioner: Option<Arc<dyn GenerativeModel>>,
    writer: Option<Arc<dyn GenerativeModel>>,
    search: Option<Arc<dyn RecipeSearch>>,
    debounce: Duration,
    store: Option<Arc<dyn DocumentStore>>,
    validator: IngredientValidator,
    settings: GenerationSettings,
}

impl Default for CookmateBuilder {
    fn default() -> Self {
        CookmateBuilder {
            captioner: None,
            writer: None,
            search: None,
            debounce: crate::search::DEFAULT_DEBOUNCE,
            store: None,
            validator: IngredientValidator::default(),
            settings: GenerationSettings::default(),
        }
    }
}

impl CookmateBuilder {
    /// Use the same model for ingredient identification and recipe writing
    pub fn model(self, model: Arc<dyn GenerativeModel>) -> Self {
        self.caption_model(model.clone()).recipe_model(model)
    }

    pub fn caption_model(mut self, model: Arc<dyn GenerativeModel>) -> Self {
        self.captioner = Some(model);
        self
    }

    pub fn recipe_model(mut self, model: Arc<dyn GenerativeModel>) -> Self {
        self.writer = Some(model);
        self
    }

    pub fn search(mut self, search: Arc<dyn RecipeSearch>) -> Self {
        self.search = Some(search);
        self
    }

    /// Quiet period before a debounced search is sent
    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce = delay;
        self
    }

    /// Document store backing the repository (in-memory when not set)
    pub fn store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn validator(mut self, validator: IngredientValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Result<Cookmate, CookmateError> {
        let captioner = self.captioner.ok_or_else(|| {
            CookmateError::InvalidInput(
                "No caption model specified. Use .model() or .caption_model()".to_string(),
            )
        })?;
        let writer = self.writer.ok_or_else(|| {
            CookmateError::InvalidInput(
                "No recipe model specified. Use .model() or .recipe_model()".to_string(),
            )
        })?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn DocumentStore>);
        let debounce = self.debounce;

        Ok(Cookmate {
            captioner,
            writer,
            search: self
                .search
                .map(|search| DebouncedSearch::new(search, debounce)),
            repository: RecipeRepository::new(store),
            validator: self.validator,
            settings: self.settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::GenerationRequest;
    use async_trait::async_trait;

    struct EchoModel;

    #[async_trait]
    impl GenerativeModel for EchoModel {
        fn provider_name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String, CookmateError> {
            Ok(request.prompt.clone())
        }
    }

    #[test]
    fn test_build_without_model_fails() {
        let result = Cookmate::builder().build();
        assert!(matches!(result, Err(CookmateError::InvalidInput(_))));

        let result = Cookmate::builder()
            .caption_model(Arc::new(EchoModel))
            .build();
        assert!(matches!(result, Err(CookmateError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_search_requires_client() {
        let cookmate = Cookmate::builder().model(Arc::new(EchoModel)).build().unwrap();
        let result = cookmate.search("pasta", &SearchFilters::default()).await;
        assert!(matches!(result, Err(CookmateError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_default_store_is_memory() {
        let cookmate = Cookmate::builder().model(Arc::new(EchoModel)).build().unwrap();
        assert_eq!(cookmate.repository().store().backend_name(), "memory");
    }

    #[test]
    fn test_from_config_without_key_fails() {
        let config = AppConfig {
            gemini: crate::config::GeminiConfig {
                api_key: None,
                ..Default::default()
            },
            ..Default::default()
        };
        if std::env::var("GEMINI_API_KEY").is_err() {
            assert!(Cookmate::from_config(&config).is_err());
        }
    }
}
