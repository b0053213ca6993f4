use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use pawmart_core::{Collection, Document};

use super::filter::{Filter, FindOptions};

/// Outcome of a single-document insert.
///
/// Serialized with the field names MongoDB drivers report (`insertedId`), since
/// handlers return it to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: JsonValue,
}

/// Outcome of a single-document `$set` update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<JsonValue>,
}

impl UpdateResult {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_count: 0,
            upserted_id: None,
        }
    }
}

/// Outcome of a single-document delete.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing database reported a failure (connection, command, server error).
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A document could not be converted between JSON and the backend's format.
    #[error("document conversion failed: {0}")]
    Conversion(String),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Storage operations over a named collection.
///
/// Every call is a single pass-through operation; implementations do not retry
/// and do not add timeouts.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<Option<Document>, StoreError>;

    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    /// Insert a document, generating an ObjectId `_id` when it has none.
    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertOneResult, StoreError>;

    /// Apply `$set` semantics to the first matching document.
    ///
    /// `modified_count` stays 0 when every field already holds the given value.
    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        set: Document,
    ) -> Result<UpdateResult, StoreError>;

    async fn delete_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<DeleteResult, StoreError>;
}

#[async_trait]
impl<S> DocumentStore for std::sync::Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<Option<Document>, StoreError> {
        (**self).find_one(collection, filter).await
    }

    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        (**self).find(collection, filter, options).await
    }

    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertOneResult, StoreError> {
        (**self).insert_one(collection, document).await
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        set: Document,
    ) -> Result<UpdateResult, StoreError> {
        (**self).update_one(collection, filter, set).await
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<DeleteResult, StoreError> {
        (**self).delete_one(collection, filter).await
    }
}
