//! Appwrite REST document store
//!
//! Talks to `{endpoint}/databases/{database}/collections/{collection}/documents`
//! with server API-key authentication. Filters are sent as JSON-encoded
//! `queries[]` parameters.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::AppwriteConfig;
use crate::domain::{
    Document, DocumentId, DocumentStore, DomainError, DomainResult, Fields, Filter,
};

/// Document store backed by an Appwrite project
pub struct AppwriteStore {
    client: Client,
    base_url: String,
    project: String,
    api_key: String,
    database_id: String,
}

impl AppwriteStore {
    pub fn new(config: &AppwriteConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            project: config.project.clone(),
            api_key: config.api_key.clone(),
            database_id: config.database_id.clone(),
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url, self.database_id, collection
        )
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("X-Appwrite-Project", &self.project)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Response-Format", "1.5.0")
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        collection: &str,
        id: Option<&str>,
    ) -> DomainResult<Value> {
        let response = builder
            .send()
            .await
            .map_err(|e| DomainError::RemoteUnavailable(e.to_string()))?;
        read_body(response, collection, id).await
    }
}

async fn read_body(response: Response, collection: &str, id: Option<&str>) -> DomainResult<Value> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(DomainError::not_found(collection, id.unwrap_or("")));
    }
    if !status.is_success() {
        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("message").and_then(Value::as_str).map(String::from))
            .unwrap_or_else(|| status.to_string());
        return Err(DomainError::RemoteUnavailable(format!(
            "{collection}: HTTP {}: {message}",
            status.as_u16()
        )));
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| DomainError::RemoteUnavailable(format!("{collection}: bad response body: {e}")))
}

/// Split an Appwrite document into its `$id` and user fields
fn into_document(collection: &str, value: Value) -> DomainResult<Document> {
    let Value::Object(mut map) = value else {
        return Err(DomainError::invalid_document(collection, "?", "response is not an object"));
    };
    let id = match map.remove("$id") {
        Some(Value::String(id)) => id,
        _ => return Err(DomainError::invalid_document(collection, "?", "missing $id")),
    };
    map.retain(|key, _| !key.starts_with('$'));
    Ok(Document::new(id, map))
}

/// JSON query strings understood by Appwrite 1.5+
fn encode_queries(filter: Option<&Filter>, limit: Option<usize>) -> Vec<String> {
    let mut queries: Vec<String> = filter
        .map(|f| {
            f.conditions()
                .iter()
                .map(|(field, value)| {
                    json!({"method": "equal", "attribute": field, "values": [value]}).to_string()
                })
                .collect()
        })
        .unwrap_or_default();
    if let Some(limit) = limit {
        queries.push(json!({"method": "limit", "values": [limit]}).to_string());
    }
    queries
}

#[async_trait]
impl DocumentStore for AppwriteStore {
    async fn create(
        &self,
        collection: &str,
        id: DocumentId,
        fields: Fields,
    ) -> DomainResult<Document> {
        let body = json!({"documentId": id.as_request(), "data": fields});
        let builder = self
            .request(Method::POST, self.documents_url(collection))
            .json(&body);
        let value = self.send(builder, collection, None).await?;
        into_document(collection, value)
    }

    async fn get(&self, collection: &str, id: &str) -> DomainResult<Document> {
        let url = format!("{}/{}", self.documents_url(collection), id);
        let value = self
            .send(self.request(Method::GET, url), collection, Some(id))
            .await?;
        into_document(collection, value)
    }

    async fn list(
        &self,
        collection: &str,
        filter: Option<&Filter>,
        limit: Option<usize>,
    ) -> DomainResult<Vec<Document>> {
        let params: Vec<(&str, String)> = encode_queries(filter, limit)
            .into_iter()
            .map(|q| ("queries[]", q))
            .collect();
        let builder = self
            .request(Method::GET, self.documents_url(collection))
            .query(&params);
        let value = self.send(builder, collection, None).await?;

        let documents = match value {
            Value::Object(mut map) => match map.remove("documents") {
                Some(Value::Array(docs)) => docs,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        debug!(collection, count = documents.len(), "Listed documents");
        documents
            .into_iter()
            .map(|doc| into_document(collection, doc))
            .collect()
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> DomainResult<Document> {
        let url = format!("{}/{}", self.documents_url(collection), id);
        let builder = self
            .request(Method::PATCH, url)
            .json(&json!({"data": fields}));
        let value = self.send(builder, collection, Some(id)).await?;
        into_document(collection, value)
    }
}
