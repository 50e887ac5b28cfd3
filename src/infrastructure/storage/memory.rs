//! In-memory document store for offline demos and testing

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::{
    Document, DocumentId, DocumentStore, DomainError, DomainResult, Fields, Filter,
};

/// Collections keep insertion order so `list` is stable
pub struct InMemoryStore {
    collections: DashMap<String, Vec<Document>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: DashMap::new(),
        }
    }

    /// Number of documents in `collection`
    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, |c| c.len())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn create(
        &self,
        collection: &str,
        id: DocumentId,
        fields: Fields,
    ) -> DomainResult<Document> {
        let id = match id {
            DocumentId::Unique => Uuid::new_v4().simple().to_string(),
            DocumentId::Custom(id) => id,
        };

        let mut docs = self.collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|d| d.id == id) {
            return Err(DomainError::invalid_document(
                collection,
                id,
                "document already exists",
            ));
        }
        let doc = Document::new(id, fields);
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn get(&self, collection: &str, id: &str) -> DomainResult<Document> {
        self.collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned())
            .ok_or_else(|| DomainError::not_found(collection, id))
    }

    async fn list(
        &self,
        collection: &str,
        filter: Option<&Filter>,
        limit: Option<usize>,
    ) -> DomainResult<Vec<Document>> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };
        let listed = docs
            .iter()
            .filter(|d| filter.map_or(true, |f| d.matches(f)))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(listed)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> DomainResult<Document> {
        let mut docs = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| DomainError::not_found(collection, id))?;
        let doc = docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| DomainError::not_found(collection, id))?;
        doc.merge(fields);
        Ok(doc.clone())
    }
}
