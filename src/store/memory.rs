use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::{compare_values, Direction, Document, DocumentStore, Query};
use crate::error::CookmateError;

/// In-process document store.
///
/// Documents keep their insertion order, which is also the order of query
/// results when no ordering is requested.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

fn poisoned() -> CookmateError {
    CookmateError::Store("memory store lock poisoned".to_string())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn add(&self, collection: &str, data: Value) -> Result<String, CookmateError> {
        let id = Uuid::new_v4().simple().to_string();
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                data,
            });
        debug!("Added {}/{}", collection, id);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), CookmateError> {
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        let documents = collections.entry(collection.to_string()).or_default();
        match documents.iter_mut().find(|d| d.id == id) {
            Some(existing) => existing.data = data,
            None => documents.push(Document {
                id: id.to_string(),
                data,
            }),
        }
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, CookmateError> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, CookmateError> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        let mut results: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| query.matches(&d.data))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(collections);

        if let Some(order) = &query.order_by {
            // Stable sort keeps insertion order between equal keys
            results.sort_by(|a, b| {
                let ordering = compare_values(a.data.get(&order.field), b.data.get(&order.field));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }

        Ok(results)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), CookmateError> {
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        if let Some(documents) = collections.get_mut(collection) {
            documents.retain(|d| d.id != id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_get_delete() {
        let store = MemoryStore::new();
        let id = store.add("recipes", json!({"title": "Soup"})).await.unwrap();

        let doc = store.get("recipes", &id).await.unwrap().unwrap();
        assert_eq!(doc.data["title"], "Soup");
        assert_eq!(store.count("recipes"), 1);

        store.delete("recipes", &id).await.unwrap();
        assert!(store.get("recipes", &id).await.unwrap().is_none());
        // Deleting twice is fine
        store.delete("recipes", &id).await.unwrap();
    }

    #[tokio::test]
    async fn test_set_replaces() {
        let store = MemoryStore::new();
        store
            .set("users", "cook@example.com", json!({"name": "A"}))
            .await
            .unwrap();
        store
            .set("users", "cook@example.com", json!({"name": "B"}))
            .await
            .unwrap();

        assert_eq!(store.count("users"), 1);
        let doc = store.get("users", "cook@example.com").await.unwrap().unwrap();
        assert_eq!(doc.data["name"], "B");
    }

    #[tokio::test]
    async fn test_query_filters_orders_and_limits() {
        let store = MemoryStore::new();
        for (user, n) in [("a", 1), ("b", 2), ("a", 3), ("a", 2)] {
            store
                .add("savedRecipes", json!({"user": user, "n": n}))
                .await
                .unwrap();
        }

        let query = Query::new()
            .where_eq("user", "a")
            .order_by("n", Direction::Descending);
        let docs = store.query("savedRecipes", &query).await.unwrap();
        let ns: Vec<i64> = docs.iter().map(|d| d.data["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![3, 2, 1]);

        let docs = store.query("savedRecipes", &query.limit(1)).await.unwrap();
        assert_eq!(docs.len(), 1);

        let docs = store.query("missing", &Query::new()).await.unwrap();
        assert!(docs.is_empty());
    }
}
