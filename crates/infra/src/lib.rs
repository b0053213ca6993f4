//! Infrastructure layer: document storage adapters.

pub mod document_store;

pub use document_store::{
    DeleteResult, DocumentStore, Filter, FindOptions, InMemoryDocumentStore, InsertOneResult,
    MongoDocumentStore, Sort, SortOrder, StoreError, UpdateResult,
};
