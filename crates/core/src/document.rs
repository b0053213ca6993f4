//! Schema-less documents and the collections that hold them.

use serde_json::{Map, Value};

/// A stored record: a JSON object kept as-is, identified by its `_id` field.
pub type Document = Map<String, Value>;

/// Field names the router addresses directly.
pub mod fields {
    pub const ID: &str = "_id";
    pub const PRODUCT_NAME: &str = "productName";
    pub const CATEGORY: &str = "category";
    pub const BUYER_EMAIL: &str = "buyerEmail";
    pub const DATE: &str = "date";
}

/// The two collections of the store namespace.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Orders,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Orders => "orders",
        }
    }
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Read the `_id` of a document, if any.
pub fn document_id(doc: &Document) -> Option<&Value> {
    doc.get(fields::ID)
}
