use thiserror::Error;

/// Why a structured payload could not be pulled out of a model answer
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The answer contains no `{...}` span at all
    #[error("No JSON object found in model response")]
    NoPayload,

    /// A `{...}` span was found but it is not valid JSON
    #[error("Model response contains malformed JSON: {0}")]
    MalformedPayload(String),

    /// Valid JSON, but the expected field is missing or has the wrong shape
    #[error("Model response does not match the expected schema: {0}")]
    SchemaMismatch(String),
}

/// Errors that can occur in the Cookmate core
#[derive(Error, Debug)]
pub enum CookmateError {
    /// Access to the photo or camera roll was refused by the OS
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The model answer could not be turned into ingredients or a recipe
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Transport-level failure talking to an external service
    #[error("Failed to fetch: {0}")]
    Http(#[from] reqwest::Error),

    /// An external service answered with an error
    #[error("{service} API error ({status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// The generative model answered without any text
    #[error("Empty response from {0}")]
    EmptyResponse(String),

    /// Document database failure
    #[error("Store error: {0}")]
    Store(String),

    /// Caller supplied something the pipeline cannot work with
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generated recipe uses ingredients that were not requested
    #[error("Recipe uses ingredients that were not provided: {}", .0.join(", "))]
    UnlistedIngredients(Vec<String>),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A spawned request task failed without being cancelled
    #[error("Background task failed: {0}")]
    Task(String),
}

pub type Result<T, E = CookmateError> = std::result::Result<T, E>;
