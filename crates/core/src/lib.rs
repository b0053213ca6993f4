//! `pawmart-core` — shared document primitives.
//!
//! This crate has no storage or HTTP concerns: it names the collections, the
//! document shape at the boundary, and the identifiers used to address documents.

pub mod document;
pub mod error;
pub mod id;

pub use document::{Collection, Document, fields};
pub use error::DomainError;
pub use id::{DocumentKey, ObjectId, ProductId};
