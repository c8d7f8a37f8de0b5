mod google;
mod prompt;

pub use google::GeminiProvider;
pub use prompt::{
    build_recipe_prompt, EquipmentLevel, RecipeConstraints, INGREDIENT_CAPTION_PROMPT,
    RECIPE_SYSTEM_INSTRUCTION,
};

use async_trait::async_trait;

use crate::error::CookmateError;
use crate::media::InlineImage;

/// Format the model is asked to answer in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Free text that is expected to embed a JSON object
    #[default]
    Text,
    /// Schema-constrained JSON-only output
    Json,
}

/// One call to a generative model
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image: Option<InlineImage>,
    pub system_instruction: Option<String>,
    pub temperature: Option<f32>,
    pub response_format: ResponseFormat,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        GenerationRequest {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }
}

/// Unified trait for generative model providers
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Get the provider name (e.g., "google")
    fn provider_name(&self) -> &str;

    /// Send the request and return the model's answer text
    async fn generate(&self, request: &GenerationRequest) -> Result<String, CookmateError>;
}
