//! Document storage boundary.
//!
//! Handlers talk to a [`DocumentStore`] and never to a driver directly. Two
//! implementations exist: an in-memory store for tests/dev and a MongoDB-backed
//! store for deployments.

pub mod filter;
pub mod in_memory;
pub mod mongo;
pub mod r#trait;

pub use filter::{Filter, FindOptions, Sort, SortOrder};
pub use in_memory::InMemoryDocumentStore;
pub use mongo::{MongoConnectOptions, MongoDocumentStore};
pub use r#trait::{DeleteResult, DocumentStore, InsertOneResult, StoreError, UpdateResult};
