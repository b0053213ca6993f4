//! Identifiers used to address documents.
//!
//! Products are always addressed by a storage-generated [`ObjectId`]. Orders may
//! carry either a generated id or a caller-assigned string, so lookups on them
//! go through [`DocumentKey::lenient_candidates`].

use core::str::FromStr;

pub use bson::oid::ObjectId;
use serde_json::Value;

use crate::error::DomainError;

/// Identifier of a product document.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ProductId(ObjectId);

impl ProductId {
    pub fn as_object_id(&self) -> &ObjectId {
        &self.0
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let oid = ObjectId::parse_str(s)
            .map_err(|e| DomainError::invalid_id(format!("ProductId: {e}")))?;
        Ok(Self(oid))
    }
}

impl From<ProductId> for DocumentKey {
    fn from(value: ProductId) -> Self {
        DocumentKey::ObjectId(value.0)
    }
}

/// Value matched against a document's `_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentKey {
    ObjectId(ObjectId),
    Raw(String),
}

impl DocumentKey {
    /// Every key a raw path segment may refer to.
    ///
    /// A 24-hex-char segment may be a generated ObjectId or a caller-assigned
    /// string that happens to look like one; both are returned.
    pub fn lenient_candidates(raw: &str) -> Vec<DocumentKey> {
        match ObjectId::parse_str(raw) {
            Ok(oid) => vec![DocumentKey::ObjectId(oid), DocumentKey::Raw(raw.to_string())],
            Err(_) => vec![DocumentKey::Raw(raw.to_string())],
        }
    }

    /// JSON rendering of the key, as it appears in a document's `_id`.
    pub fn to_json(&self) -> Value {
        match self {
            DocumentKey::ObjectId(oid) => Value::String(oid.to_hex()),
            DocumentKey::Raw(s) => Value::String(s.clone()),
        }
    }
}

impl core::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DocumentKey::ObjectId(oid) => f.write_str(&oid.to_hex()),
            DocumentKey::Raw(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_requires_object_id_hex() {
        let oid = ObjectId::new();
        let parsed: ProductId = oid.to_hex().parse().unwrap();
        assert_eq!(parsed.as_object_id(), &oid);

        let err = "not-an-id".parse::<ProductId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }

    #[test]
    fn lenient_candidates_keep_raw_strings() {
        let keys = DocumentKey::lenient_candidates("order-42");
        assert_eq!(keys, vec![DocumentKey::Raw("order-42".to_string())]);
    }

    #[test]
    fn lenient_candidates_cover_both_forms_of_hex_ids() {
        let oid = ObjectId::new();
        let hex = oid.to_hex();
        let keys = DocumentKey::lenient_candidates(&hex);
        assert_eq!(keys, vec![DocumentKey::ObjectId(oid), DocumentKey::Raw(hex.clone())]);
        assert_eq!(keys[0].to_json(), Value::String(hex));
    }
}
