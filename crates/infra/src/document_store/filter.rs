//! Backend-neutral query model.
//!
//! Only the shapes the router needs are expressible. The in-memory store
//! evaluates them directly; the MongoDB store translates them to query documents.

use std::cmp::Ordering;

use serde_json::Value as JsonValue;

use pawmart_core::{Document, DocumentKey, fields};

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every document.
    All,
    /// `_id` equals the key.
    Key(DocumentKey),
    /// `_id` equals any of the keys.
    AnyKey(Vec<DocumentKey>),
    /// Field equals the value exactly (array fields match on any element).
    Eq(String, JsonValue),
    /// String field contains the text, ignoring case. The text is literal.
    ContainsIgnoreCase(String, String),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn contains_ignore_case(field: impl Into<String>, text: impl Into<String>) -> Self {
        Filter::ContainsIgnoreCase(field.into(), text.into())
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Key(key) => key_matches(doc, key),
            Filter::AnyKey(keys) => keys.iter().any(|k| key_matches(doc, k)),
            Filter::Eq(field, expected) => match doc.get(field) {
                Some(JsonValue::Array(items)) if !expected.is_array() => items.contains(expected),
                Some(actual) => actual == expected,
                // `{field: null}` also matches documents lacking the field.
                None => expected.is_null(),
            },
            Filter::ContainsIgnoreCase(field, text) => match doc.get(field) {
                Some(JsonValue::String(s)) => s.to_lowercase().contains(&text.to_lowercase()),
                _ => false,
            },
        }
    }
}

fn key_matches(doc: &Document, key: &DocumentKey) -> bool {
    pawmart_core::document::document_id(doc) == Some(&key.to_json())
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Descending,
        }
    }

    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Ascending,
        }
    }

    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ord = compare_values(a.get(&self.field), b.get(&self.field));
        match self.order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: Option<Sort>,
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn sorted(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Rank of a JSON type in MongoDB's cross-type sort order.
///
/// Missing fields sort as null.
fn type_rank(value: Option<&JsonValue>) -> u8 {
    match value {
        None | Some(JsonValue::Null) => 1,
        Some(JsonValue::Number(_)) => 2,
        Some(JsonValue::String(_)) => 3,
        Some(JsonValue::Object(_)) => 4,
        Some(JsonValue::Array(_)) => 5,
        Some(JsonValue::Bool(_)) => 8,
    }
}

/// Total order over optional JSON values, following MongoDB's comparison rules
/// for the JSON subset of BSON.
pub fn compare_values(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    let (ra, rb) = (type_rank(a), type_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }

    match (a, b) {
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        (Some(JsonValue::Bool(x)), Some(JsonValue::Bool(y))) => x.cmp(y),
        (Some(JsonValue::Array(x)), Some(JsonValue::Array(y))) => {
            for (ex, ey) in x.iter().zip(y.iter()) {
                let ord = compare_values(Some(ex), Some(ey));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Some(JsonValue::Object(x)), Some(JsonValue::Object(y))) => {
            for ((kx, vx), (ky, vy)) in x.iter().zip(y.iter()) {
                let ord = kx
                    .cmp(ky)
                    .then_with(|| compare_values(Some(vx), Some(vy)));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => Ordering::Equal,
    }
}

/// The `_id`-less view of a `$set` document; `_id` is immutable.
pub fn settable_fields(set: Document) -> Document {
    set.into_iter().filter(|(k, _)| k != fields::ID).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawmart_core::ObjectId;
    use serde_json::json;

    fn doc(value: JsonValue) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn eq_matches_exact_values_only() {
        let d = doc(json!({ "category": "accessories", "buyerEmail": "a@x.io" }));
        assert!(Filter::eq("category", "accessories").matches(&d));
        assert!(!Filter::eq("category", "Accessories").matches(&d));
        assert!(!Filter::eq("category", "access").matches(&d));
        assert!(!Filter::eq("missing", "accessories").matches(&d));
    }

    #[test]
    fn eq_matches_array_elements() {
        let d = doc(json!({ "tags": ["dog", "cat"] }));
        assert!(Filter::eq("tags", "cat").matches(&d));
        assert!(!Filter::eq("tags", "bird").matches(&d));
    }

    #[test]
    fn contains_ignore_case_is_literal() {
        let d = doc(json!({ "productName": "Leash Deluxe (v2)" }));
        assert!(Filter::contains_ignore_case("productName", "leash").matches(&d));
        assert!(Filter::contains_ignore_case("productName", "DELUXE").matches(&d));
        assert!(Filter::contains_ignore_case("productName", "(v2)").matches(&d));
        assert!(!Filter::contains_ignore_case("productName", "l.ash").matches(&d));
    }

    #[test]
    fn contains_ignore_case_skips_non_strings() {
        let d = doc(json!({ "productName": 42 }));
        assert!(!Filter::contains_ignore_case("productName", "4").matches(&d));
    }

    #[test]
    fn key_filters_compare_rendered_ids() {
        let oid = ObjectId::new();
        let d = doc(json!({ "_id": oid.to_hex() }));
        assert!(Filter::Key(DocumentKey::ObjectId(oid)).matches(&d));
        assert!(!Filter::Key(DocumentKey::ObjectId(ObjectId::new())).matches(&d));

        let raw = doc(json!({ "_id": "order-1" }));
        assert!(Filter::AnyKey(DocumentKey::lenient_candidates("order-1")).matches(&raw));
    }

    #[test]
    fn missing_fields_sort_below_values() {
        let dated = doc(json!({ "date": "2025-01-01" }));
        let undated = doc(json!({}));
        let sort = Sort::descending("date");
        assert_eq!(sort.compare(&dated, &undated), Ordering::Less);
        assert_eq!(Sort::ascending("date").compare(&dated, &undated), Ordering::Greater);
    }

    #[test]
    fn numbers_sort_before_strings() {
        assert_eq!(
            compare_values(Some(&json!(9000)), Some(&json!("1"))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&json!(2.5)), Some(&json!(2))),
            Ordering::Greater
        );
    }

    #[test]
    fn settable_fields_drop_id() {
        let set = doc(json!({ "_id": "x", "price": 10 }));
        let set = settable_fields(set);
        assert_eq!(set.len(), 1);
        assert!(set.contains_key("price"));
    }
}
