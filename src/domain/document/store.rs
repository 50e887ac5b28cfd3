//! Document store interface

use async_trait::async_trait;

use super::model::{Document, DocumentId, Fields, Filter};
use crate::domain::DomainResult;

/// Minimal CRUD contract the simulator needs from the external database.
///
/// `get` and `update` report a missing document as `DomainError::NotFound`;
/// transport failures surface as `DomainError::RemoteUnavailable`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document in `collection`
    async fn create(&self, collection: &str, id: DocumentId, fields: Fields)
        -> DomainResult<Document>;

    /// Fetch one document by ID
    async fn get(&self, collection: &str, id: &str) -> DomainResult<Document>;

    /// List documents in store order, optionally filtered and capped
    async fn list(
        &self,
        collection: &str,
        filter: Option<&Filter>,
        limit: Option<usize>,
    ) -> DomainResult<Vec<Document>>;

    /// Apply a partial update and return the resulting document
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> DomainResult<Document>;
}
