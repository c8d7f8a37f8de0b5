use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use super::{RecipeSearch, SearchFilters};
use crate::config::SearchConfig;
use crate::error::CookmateError;
use crate::model::Recipe;

const DEFAULT_BASE_URL: &str = "https://api.spoonacular.com";

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Recipe>,
}

pub struct SearchClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl SearchClient {
    pub fn new(config: &SearchConfig, client: Client) -> Result<Self, CookmateError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("SPOONACULAR_API_KEY").ok())
            .ok_or_else(|| {
                CookmateError::InvalidInput(
                    "SPOONACULAR_API_KEY not found in config or environment".to_string(),
                )
            })?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(SearchClient {
            client,
            api_key,
            base_url,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        SearchClient {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    fn query_params(&self, query: &str, filters: &SearchFilters) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("apiKey", self.api_key.clone()),
            ("query", query.to_string()),
            ("instructionsRequired", "true".to_string()),
            ("addRecipeInformation", "true".to_string()),
            ("addRecipeInstructions", "true".to_string()),
            ("addRecipeNutrition", "true".to_string()),
        ];

        let lists = [
            ("cuisine", &filters.cuisines, ","),
            ("diet", &filters.diets, ","),
            ("intolerances", &filters.intolerances, ","),
            ("type", &filters.dish_types, "|"),
        ];
        for (name, values, separator) in lists {
            if !values.is_empty() {
                params.push((name, values.join(separator)));
            }
        }

        let bounds = [
            ("minCarbs", filters.min_carbs),
            ("maxCarbs", filters.max_carbs),
            ("minProtein", filters.min_protein),
            ("maxProtein", filters.max_protein),
            ("minFat", filters.min_fat),
            ("maxFat", filters.max_fat),
        ];
        for (name, bound) in bounds {
            if let Some(value) = bound {
                params.push((name, value.to_string()));
            }
        }

        params
    }
}

#[async_trait]
impl RecipeSearch for SearchClient {
    async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<Recipe>, CookmateError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/recipes/complexSearch",
            self.base_url.trim_end_matches('/')
        );
        debug!("Searching recipes for '{}'", query);

        let response = self
            .client
            .get(&url)
            .query(&self.query_params(query, filters))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CookmateError::Api {
                service: "Spoonacular",
                status: status.as_u16(),
                message: format!("Failed to fetch: {}", body),
            });
        }

        let body: SearchResponse = response.json().await?;
        debug!("Search for '{}' returned {} recipes", query, body.results.len());
        Ok(body.results)
    }
}
