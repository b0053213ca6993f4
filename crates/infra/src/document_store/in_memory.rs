use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use pawmart_core::{Collection, Document, ObjectId, fields};

use super::filter::{Filter, FindOptions, settable_fields};
use super::r#trait::{DeleteResult, DocumentStore, InsertOneResult, StoreError, UpdateResult};

/// In-memory document store.
///
/// Intended for tests/dev. Documents are kept per collection in insertion order
/// and every query is a linear scan. Dotted field paths are not expanded.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in a collection.
    pub fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .map(|c| c.get(&collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)))
            .cloned())
    }

    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        let mut found: Vec<Document> = collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default();
        drop(collections);

        if let Some(sort) = &options.sort {
            found.sort_by(|a, b| sort.compare(a, b));
        }
        // A limit of 0 means "no limit", as with MongoDB cursors.
        if let Some(limit) = options.limit.filter(|l| *l > 0) {
            found.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        Ok(found)
    }

    async fn insert_one(
        &self,
        collection: Collection,
        mut document: Document,
    ) -> Result<InsertOneResult, StoreError> {
        let inserted_id = document
            .entry(fields::ID)
            .or_insert_with(|| JsonValue::String(ObjectId::new().to_hex()))
            .clone();

        let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        let docs = collections.entry(collection).or_default();
        if docs
            .iter()
            .any(|d| d.get(fields::ID) == Some(&inserted_id))
        {
            return Err(StoreError::Backend(format!(
                "duplicate key on {collection}._id: {inserted_id}"
            )));
        }
        docs.push(document);

        Ok(InsertOneResult {
            acknowledged: true,
            inserted_id,
        })
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        set: Document,
    ) -> Result<UpdateResult, StoreError> {
        let set = settable_fields(set);

        let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        let Some(target) = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| filter.matches(d)))
        else {
            return Ok(UpdateResult::new(0, 0));
        };

        let mut changed = false;
        for (field, value) in set {
            if target.get(&field) != Some(&value) {
                target.insert(field, value);
                changed = true;
            }
        }

        Ok(UpdateResult::new(1, u64::from(changed)))
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<DeleteResult, StoreError> {
        let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(DeleteResult::new(0));
        };

        match docs.iter().position(|d| filter.matches(d)) {
            Some(idx) => {
                docs.remove(idx);
                Ok(DeleteResult::new(1))
            }
            None => Ok(DeleteResult::new(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_store::Sort;
    use pawmart_core::DocumentKey;
    use proptest::prelude::*;
    use serde_json::json;

    fn doc(value: JsonValue) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn key_of(result: &InsertOneResult) -> DocumentKey {
        let hex = result.inserted_id.as_str().unwrap();
        DocumentKey::ObjectId(ObjectId::parse_str(hex).unwrap())
    }

    #[tokio::test]
    async fn insert_generates_object_id_and_find_one_returns_it() {
        let store = InMemoryDocumentStore::new();
        let res = store
            .insert_one(
                Collection::Products,
                doc(json!({ "productName": "Leash", "category": "accessories" })),
            )
            .await
            .unwrap();
        assert!(res.acknowledged);

        let found = store
            .find_one(Collection::Products, Filter::Key(key_of(&res)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found["productName"], "Leash");
        assert_eq!(found["_id"], res.inserted_id);
    }

    #[tokio::test]
    async fn caller_supplied_ids_are_kept_and_must_be_unique() {
        let store = InMemoryDocumentStore::new();
        let res = store
            .insert_one(Collection::Orders, doc(json!({ "_id": "order-1" })))
            .await
            .unwrap();
        assert_eq!(res.inserted_id, json!("order-1"));

        let err = store
            .insert_one(Collection::Orders, doc(json!({ "_id": "order-1" })))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let store = InMemoryDocumentStore::new();
        store
            .insert_one(Collection::Orders, doc(json!({ "buyerEmail": "a@x.io" })))
            .await
            .unwrap();

        let products = store
            .find(Collection::Products, Filter::All, FindOptions::default())
            .await
            .unwrap();
        assert!(products.is_empty());
        assert_eq!(store.len(Collection::Orders), 1);
    }

    #[tokio::test]
    async fn update_counts_follow_set_semantics() {
        let store = InMemoryDocumentStore::new();
        let res = store
            .insert_one(Collection::Products, doc(json!({ "price": 10 })))
            .await
            .unwrap();
        let key = key_of(&res);

        let changed = store
            .update_one(Collection::Products, Filter::Key(key.clone()), doc(json!({ "price": 12 })))
            .await
            .unwrap();
        assert_eq!((changed.matched_count, changed.modified_count), (1, 1));

        let unchanged = store
            .update_one(Collection::Products, Filter::Key(key.clone()), doc(json!({ "price": 12 })))
            .await
            .unwrap();
        assert_eq!((unchanged.matched_count, unchanged.modified_count), (1, 0));

        let missing = store
            .update_one(
                Collection::Products,
                Filter::Key(DocumentKey::ObjectId(ObjectId::new())),
                doc(json!({ "price": 1 })),
            )
            .await
            .unwrap();
        assert_eq!((missing.matched_count, missing.modified_count), (0, 0));
    }

    #[tokio::test]
    async fn update_never_rewrites_id() {
        let store = InMemoryDocumentStore::new();
        let res = store
            .insert_one(Collection::Products, doc(json!({ "price": 10 })))
            .await
            .unwrap();

        let out = store
            .update_one(Collection::Products, Filter::Key(key_of(&res)), doc(json!({ "_id": "hijack" })))
            .await
            .unwrap();
        assert_eq!(out.modified_count, 0);

        let found = store
            .find_one(Collection::Products, Filter::Key(key_of(&res)))
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn delete_removes_first_match_only() {
        let store = InMemoryDocumentStore::new();
        for _ in 0..2 {
            store
                .insert_one(Collection::Orders, doc(json!({ "buyerEmail": "a@x.io" })))
                .await
                .unwrap();
        }

        let res = store
            .delete_one(Collection::Orders, Filter::eq("buyerEmail", "a@x.io"))
            .await
            .unwrap();
        assert_eq!(res.deleted_count, 1);
        assert_eq!(store.len(Collection::Orders), 1);

        let none = store
            .delete_one(Collection::Orders, Filter::eq("buyerEmail", "b@x.io"))
            .await
            .unwrap();
        assert_eq!(none.deleted_count, 0);
    }

    fn run<F: std::future::Future>(f: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(f)
    }

    proptest! {
        #[test]
        fn sorted_limited_find_is_descending_and_bounded(
            dates in proptest::collection::vec(proptest::option::of(0i64..10_000), 0..30),
            limit in 1u64..10,
        ) {
            let found = run(async {
                let store = InMemoryDocumentStore::new();
                for date in &dates {
                    let d = match date {
                        Some(v) => doc(json!({ "date": v })),
                        None => doc(json!({})),
                    };
                    store.insert_one(Collection::Products, d).await.unwrap();
                }
                store
                    .find(
                        Collection::Products,
                        Filter::All,
                        FindOptions::default().sorted(Sort::descending("date")).limit(limit),
                    )
                    .await
                    .unwrap()
            });

            prop_assert_eq!(found.len(), dates.len().min(limit as usize));
            for pair in found.windows(2) {
                prop_assert_ne!(
                    compare_dates(&pair[0], &pair[1]),
                    std::cmp::Ordering::Less
                );
            }
        }
    }

    fn compare_dates(a: &Document, b: &Document) -> std::cmp::Ordering {
        crate::document_store::filter::compare_values(a.get("date"), b.get("date"))
    }
}
