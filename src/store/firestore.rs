use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Map, Number, Value};

use super::{Direction, Document, DocumentStore, Query};
use crate::config::StoreConfig;
use crate::error::CookmateError;

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";

/// Firestore through its REST API
pub struct FirestoreStore {
    client: Client,
    documents_url: String,
    api_key: Option<String>,
    id_token: Option<String>,
}

impl FirestoreStore {
    /// Create a new Firestore store from configuration
    pub fn new(config: &StoreConfig, client: Client) -> Result<Self, CookmateError> {
        let project_id = config.project_id.as_deref().ok_or_else(|| {
            CookmateError::InvalidInput("store.project_id is required for firestore".to_string())
        })?;
        let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("FIREBASE_API_KEY").ok());

        Ok(FirestoreStore {
            client,
            documents_url: documents_url(base_url, project_id),
            api_key,
            id_token: config.id_token.clone(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(project_id: &str, base_url: &str) -> Self {
        FirestoreStore {
            client: Client::new(),
            documents_url: documents_url(base_url, project_id),
            api_key: None,
            id_token: None,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.api_key {
            Some(key) => request.header("x-goog-api-key", key),
            None => request,
        };
        match &self.id_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn documents_url(base_url: &str, project_id: &str) -> String {
    format!(
        "{}/v1/projects/{}/databases/(default)/documents",
        base_url.trim_end_matches('/'),
        project_id
    )
}

async fn check_status(response: Response, action: &str) -> Result<Response, CookmateError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CookmateError::Api {
        service: "Firestore",
        status: status.as_u16(),
        message: format!("{} failed: {}", action, body),
    })
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn backend_name(&self) -> &str {
        "firestore"
    }

    async fn add(&self, collection: &str, data: Value) -> Result<String, CookmateError> {
        let url = format!("{}/{}", self.documents_url, collection);
        let response = self
            .authorize(self.client.post(&url))
            .json(&json!({ "fields": encode_fields(&data)? }))
            .send()
            .await?;
        let response = check_status(response, "create document").await?;

        let created: Value = response.json().await?;
        let document = decode_document(&created)?;
        debug!("Created {}/{}", collection, document.id);
        Ok(document.id)
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), CookmateError> {
        let url = format!("{}/{}/{}", self.documents_url, collection, id);
        let response = self
            .authorize(self.client.patch(&url))
            .json(&json!({ "fields": encode_fields(&data)? }))
            .send()
            .await?;
        check_status(response, "write document").await?;
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, CookmateError> {
        let url = format!("{}/{}/{}", self.documents_url, collection, id);
        let response = self.authorize(self.client.get(&url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response, "read document").await?;
        let body: Value = response.json().await?;
        decode_document(&body).map(Some)
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, CookmateError> {
        let url = format!("{}:runQuery", self.documents_url);
        let body = json!({ "structuredQuery": structured_query(collection, query) });
        debug!("runQuery on {}: {}", collection, body);

        let response = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await?;
        let response = check_status(response, "query").await?;

        // One entry per result; entries without a document only carry a read time
        let rows: Vec<Value> = response.json().await?;
        rows.iter()
            .filter_map(|row| row.get("document"))
            .map(decode_document)
            .collect()
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), CookmateError> {
        let url = format!("{}/{}/{}", self.documents_url, collection, id);
        let response = self.authorize(self.client.delete(&url)).send().await?;
        check_status(response, "delete document").await?;
        Ok(())
    }
}

fn structured_query(collection: &str, query: &Query) -> Value {
    let mut structured = json!({ "from": [{ "collectionId": collection }] });

    let mut filters: Vec<Value> = query
        .filters
        .iter()
        .map(|f| {
            json!({
                "fieldFilter": {
                    "field": { "fieldPath": f.field },
                    "op": "EQUAL",
                    "value": encode_value(&f.value)
                }
            })
        })
        .collect();
    match filters.len() {
        0 => {}
        1 => structured["where"] = filters.remove(0),
        _ => {
            structured["where"] = json!({
                "compositeFilter": { "op": "AND", "filters": filters }
            })
        }
    }

    if let Some(order) = &query.order_by {
        let direction = match order.direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        structured["orderBy"] = json!([{
            "field": { "fieldPath": order.field },
            "direction": direction
        }]);
    }
    if let Some(limit) = query.limit {
        structured["limit"] = json!(limit);
    }

    structured
}

/// Encode a JSON object as Firestore document fields
pub(crate) fn encode_fields(data: &Value) -> Result<Value, CookmateError> {
    match data {
        Value::Object(map) => Ok(Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), encode_value(v)))
                .collect(),
        )),
        _ => Err(CookmateError::Store(
            "documents must be JSON objects".to_string(),
        )),
    }
}

/// Encode a JSON value as a Firestore typed value
pub(crate) fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({
            "mapValue": {
                "fields": map
                    .iter()
                    .map(|(k, v)| (k.clone(), encode_value(v)))
                    .collect::<Map<String, Value>>()
            }
        }),
    }
}

/// Decode a Firestore typed value back to plain JSON
pub(crate) fn decode_value(value: &Value) -> Result<Value, CookmateError> {
    let typed = value
        .as_object()
        .and_then(|o| o.iter().next())
        .map(|(kind, inner)| (kind.as_str(), inner))
        .ok_or_else(|| CookmateError::Store(format!("unexpected Firestore value: {}", value)))?;

    let decoded = match typed {
        ("nullValue", _) => Value::Null,
        ("booleanValue", b) => Value::Bool(b.as_bool().unwrap_or(false)),
        ("integerValue", raw) => {
            let parsed = match raw {
                Value::String(s) => s.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            parsed
                .map(|i| Value::Number(i.into()))
                .ok_or_else(|| CookmateError::Store(format!("bad integerValue: {}", raw)))?
        }
        ("doubleValue", raw) => raw
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ("stringValue", s)
        | ("timestampValue", s)
        | ("referenceValue", s)
        | ("bytesValue", s) => s.clone(),
        ("geoPointValue", point) => point.clone(),
        ("arrayValue", array) => Value::Array(
            array
                .get("values")
                .and_then(Value::as_array)
                .map(|values| {
                    values
                        .iter()
                        .map(decode_value)
                        .collect::<Result<Vec<Value>, CookmateError>>()
                })
                .transpose()?
                .unwrap_or_default(),
        ),
        ("mapValue", map) => decode_fields(map.get("fields"))?,
        (kind, _) => {
            return Err(CookmateError::Store(format!(
                "unsupported Firestore value type: {}",
                kind
            )))
        }
    };
    Ok(decoded)
}

fn decode_fields(fields: Option<&Value>) -> Result<Value, CookmateError> {
    let mut object = Map::new();
    if let Some(fields) = fields.and_then(Value::as_object) {
        for (key, value) in fields {
            object.insert(key.clone(), decode_value(value)?);
        }
    }
    Ok(Value::Object(object))
}

fn decode_document(document: &Value) -> Result<Document, CookmateError> {
    let name = document["name"]
        .as_str()
        .ok_or_else(|| CookmateError::Store("Firestore document without name".to_string()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();

    Ok(Document {
        id,
        data: decode_fields(document.get("fields"))?,
    })
}
