//! Document database access.
//!
//! The repository only needs a handful of collection operations, so the
//! database sits behind the small [`DocumentStore`] trait. Documents are plain
//! JSON objects.

mod firestore;
mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::CookmateError;

/// A document read back from a collection
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Equality filters (all must hold), an optional ordering and an optional limit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Query::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document satisfies every filter
    pub fn matches(&self, data: &Value) -> bool {
        self.filters
            .iter()
            .all(|f| data.get(&f.field) == Some(&f.value))
    }
}

/// Unified trait for document database backends
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get the backend name (e.g., "memory", "firestore")
    fn backend_name(&self) -> &str;

    /// Insert a document with a generated id and return the id
    async fn add(&self, collection: &str, data: Value) -> Result<String, CookmateError>;

    /// Create or replace the document with the given id
    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), CookmateError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, CookmateError>;

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, CookmateError>;

    /// Delete a document; deleting a missing document is not an error
    async fn delete(&self, collection: &str, id: &str) -> Result<(), CookmateError>;
}

/// Open the configured backend
pub fn open_store(
    config: &StoreConfig,
    client: Client,
) -> Result<Arc<dyn DocumentStore>, CookmateError> {
    debug!("Opening {:?} document store", config.backend);
    let store: Arc<dyn DocumentStore> = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Firestore => Arc::new(FirestoreStore::new(config, client)?),
    };
    Ok(store)
}

/// Order two field values the way the database orders them: missing values
/// first, then booleans, numbers and strings.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_matches() {
        let query = Query::new()
            .where_eq("user", "cook@example.com")
            .where_eq("recipeKey", "title-soup");

        assert!(query.matches(&json!({"user": "cook@example.com", "recipeKey": "title-soup"})));
        assert!(!query.matches(&json!({"user": "cook@example.com", "recipeKey": "title-stew"})));
        assert!(!query.matches(&json!({"user": "cook@example.com"})));
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(
            compare_values(Some(&json!(2)), Some(&json!(10))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(
                Some(&json!("2025-01-02T00:00:00.000Z")),
                Some(&json!("2025-01-01T00:00:00.000Z"))
            ),
            Ordering::Greater
        );
        assert_eq!(compare_values(None, Some(&json!("a"))), Ordering::Less);
    }

    #[test]
    fn test_open_store() {
        let store = open_store(&StoreConfig::default(), Client::new()).unwrap();
        assert_eq!(store.backend_name(), "memory");

        let firestore = StoreConfig {
            backend: StoreBackend::Firestore,
            ..Default::default()
        };
        assert!(matches!(
            open_store(&firestore, Client::new()),
            Err(CookmateError::InvalidInput(_))
        ));
    }
}
