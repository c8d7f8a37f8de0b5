use crate::config::GeminiConfig;
use crate::error::CookmateError;
use crate::providers::{GenerationRequest, GenerativeModel, ResponseFormat};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Map, Value};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider for `model` from configuration
    pub fn new(config: &GeminiConfig, model: &str, client: Client) -> Result<Self, CookmateError> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                CookmateError::InvalidInput(
                    "GEMINI_API_KEY not found in config or environment".to_string(),
                )
            })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(GeminiProvider {
            client,
            api_key,
            base_url,
            model: model.to_string(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        GeminiProvider {
            client: Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(request: &GenerationRequest) -> Value {
        let mut parts = Vec::new();
        if let Some(image) = &request.image {
            parts.push(json!({
                "inlineData": {
                    "mimeType": image.mime_type,
                    "data": image.data
                }
            }));
        }
        parts.push(json!({ "text": request.prompt }));

        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": parts
            }]
        });

        if let Some(instruction) = &request.system_instruction {
            body["systemInstruction"] = json!({ "parts": [{ "text": instruction }] });
        }

        let mut generation_config = Map::new();
        if let Some(temperature) = request.temperature {
            generation_config.insert("temperature".to_string(), json!(temperature));
        }
        if request.response_format == ResponseFormat::Json {
            generation_config.insert("responseMimeType".to_string(), json!("application/json"));
        }
        if !generation_config.is_empty() {
            body["generationConfig"] = Value::Object(generation_config);
        }

        body
    }
}

#[async_trait]
impl GenerativeModel for GeminiProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, CookmateError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        debug!(
            "Sending generateContent request to {} (image: {})",
            self.model,
            request.image.is_some()
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(request))
            .send()
            .await?;

        let status = response.status();
        let response_body: Value = response.json().await?;
        debug!("Gemini response: {:?}", response_body);

        // Check for API error response
        if let Some(error) = response_body.get("error") {
            let error_code = error["code"].as_u64().unwrap_or(status.as_u16() as u64);
            let error_message = error["message"].as_str().unwrap_or("Unknown error");
            return Err(CookmateError::Api {
                service: "Gemini",
                status: error_code as u16,
                message: error_message.to_string(),
            });
        }
        if !status.is_success() {
            return Err(CookmateError::Api {
                service: "Gemini",
                status: status.as_u16(),
                message: response_body.to_string(),
            });
        }

        let text = response_body["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(CookmateError::EmptyResponse(format!(
                "Gemini model {}",
                self.model
            )));
        }

        Ok(text)
    }
}
