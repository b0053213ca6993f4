//! MongoDB-backed document store.
//!
//! Documents cross this boundary as JSON objects. On the way in they are
//! serialized to BSON with `bson::to_document`; on the way out ObjectIds are
//! rendered as their hex string and datetimes as RFC 3339 strings, which is how
//! the stored documents look to HTTP callers.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Client, Database,
    bson::{self, Bson, Document as BsonDocument, doc},
    options::{ClientOptions, FindOptions as MongoFindOptions, ServerApi, ServerApiVersion},
};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info};

use pawmart_core::{Collection, Document, DocumentKey};

use super::filter::{Filter, FindOptions, SortOrder, settable_fields};
use super::r#trait::{DeleteResult, DocumentStore, InsertOneResult, StoreError, UpdateResult};

impl From<mongodb::error::Error> for StoreError {
    fn from(value: mongodb::error::Error) -> Self {
        StoreError::Backend(value.to_string())
    }
}

/// Connection settings for [`MongoDocumentStore::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoConnectOptions {
    pub uri: String,
    pub database: String,
    pub app_name: Option<String>,
}

/// Document store over one MongoDB database namespace.
///
/// Cloning is cheap; the driver's client pools connections internally.
#[derive(Debug, Clone)]
pub struct MongoDocumentStore {
    database: Database,
}

impl MongoDocumentStore {
    /// Build a client pinned to server API v1 (strict, with deprecation errors).
    ///
    /// The driver connects lazily; call [`MongoDocumentStore::ping`] to check
    /// reachability up front.
    pub async fn connect(options: MongoConnectOptions) -> Result<Self, StoreError> {
        let mut client_options = ClientOptions::parse(&options.uri).await?;
        client_options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );
        if options.app_name.is_some() {
            client_options.app_name = options.app_name;
        }

        let client = Client::with_options(client_options)?;
        debug!(database = %options.database, "mongodb client created");

        Ok(Self {
            database: client.database(&options.database),
        })
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        info!(database = %self.database.name(), "pinged mongodb deployment");
        Ok(())
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<BsonDocument> {
        self.database.collection::<BsonDocument>(collection.name())
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<Option<Document>, StoreError> {
        let found = self
            .collection(collection)
            .find_one(filter_to_bson(&filter)?, None)
            .await?;
        Ok(found.map(document_to_json))
    }

    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let cursor = self
            .collection(collection)
            .find(filter_to_bson(&filter)?, find_options_to_mongo(&options))
            .await?;
        let docs: Vec<BsonDocument> = cursor.try_collect().await?;

        Ok(docs.into_iter().map(document_to_json).collect())
    }

    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertOneResult, StoreError> {
        let document = json_to_document(&document)?;
        let res = self.collection(collection).insert_one(document, None).await?;

        Ok(InsertOneResult {
            acknowledged: true,
            inserted_id: bson_to_json(res.inserted_id),
        })
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        set: Document,
    ) -> Result<UpdateResult, StoreError> {
        let set = json_to_document(&settable_fields(set))?;
        let res = self
            .collection(collection)
            .update_one(filter_to_bson(&filter)?, doc! { "$set": set }, None)
            .await?;

        Ok(UpdateResult {
            acknowledged: true,
            matched_count: res.matched_count,
            modified_count: res.modified_count,
            upserted_count: u64::from(res.upserted_id.is_some()),
            upserted_id: res.upserted_id.map(bson_to_json),
        })
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<DeleteResult, StoreError> {
        let res = self
            .collection(collection)
            .delete_one(filter_to_bson(&filter)?, None)
            .await?;
        Ok(DeleteResult::new(res.deleted_count))
    }
}

fn key_to_bson(key: &DocumentKey) -> Bson {
    match key {
        DocumentKey::ObjectId(oid) => Bson::ObjectId(*oid),
        DocumentKey::Raw(s) => Bson::String(s.clone()),
    }
}

/// Translate [`FindOptions`] into driver options: `{field: 1 | -1}` sort, limit.
pub fn find_options_to_mongo(options: &FindOptions) -> MongoFindOptions {
    let mut find_options = MongoFindOptions::default();
    if let Some(sort) = &options.sort {
        let direction = match sort.order {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        };
        let mut sort_doc = BsonDocument::new();
        sort_doc.insert(sort.field.clone(), direction);
        find_options.sort = Some(sort_doc);
    }
    if let Some(limit) = options.limit {
        find_options.limit = Some(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    find_options
}

/// Translate a [`Filter`] into a MongoDB query document.
pub fn filter_to_bson(filter: &Filter) -> Result<BsonDocument, StoreError> {
    let query = match filter {
        Filter::All => BsonDocument::new(),
        Filter::Key(key) => doc! { "_id": key_to_bson(key) },
        Filter::AnyKey(keys) => {
            let keys: Vec<Bson> = keys.iter().map(key_to_bson).collect();
            doc! { "_id": { "$in": keys } }
        }
        Filter::Eq(field, value) => {
            let value = bson::to_bson(value).map_err(|e| StoreError::Conversion(e.to_string()))?;
            let mut query = BsonDocument::new();
            query.insert(field.clone(), value);
            query
        }
        Filter::ContainsIgnoreCase(field, text) => {
            let mut query = BsonDocument::new();
            query.insert(
                field.clone(),
                doc! { "$regex": regex::escape(text), "$options": "i" },
            );
            query
        }
    };
    Ok(query)
}

fn json_to_document(document: &Document) -> Result<BsonDocument, StoreError> {
    bson::to_document(document).map_err(|e| StoreError::Conversion(e.to_string()))
}

fn document_to_json(document: BsonDocument) -> Document {
    document
        .into_iter()
        .map(|(k, v)| (k, bson_to_json(v)))
        .collect::<Map<String, JsonValue>>()
}

/// Render a BSON value the way callers see stored documents.
pub fn bson_to_json(value: Bson) -> JsonValue {
    match value {
        Bson::ObjectId(oid) => JsonValue::String(oid.to_hex()),
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(s) => JsonValue::String(s),
            Err(_) => JsonValue::from(dt.timestamp_millis()),
        },
        Bson::Document(doc) => JsonValue::Object(document_to_json(doc)),
        Bson::Array(items) => JsonValue::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::String(s) => JsonValue::String(s),
        Bson::Boolean(b) => JsonValue::Bool(b),
        Bson::Null | Bson::Undefined => JsonValue::Null,
        Bson::Int32(i) => JsonValue::from(i),
        Bson::Int64(i) => JsonValue::from(i),
        Bson::Double(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        other => other.into_relaxed_extjson(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_store::filter::Sort;
    use pawmart_core::ObjectId;
    use serde_json::json;

    #[test]
    fn search_text_is_escaped_into_case_insensitive_regex() {
        let query = filter_to_bson(&Filter::contains_ignore_case("productName", "a.b*")).unwrap();
        let inner = query.get_document("productName").unwrap();
        assert_eq!(inner.get_str("$regex").unwrap(), r"a\.b\*");
        assert_eq!(inner.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn newest_first_listing_sorts_descending_with_limit() {
        let options = find_options_to_mongo(
            &FindOptions::default().sorted(Sort::descending("date")).limit(6),
        );
        assert_eq!(options.sort, Some(doc! { "date": -1 }));
        assert_eq!(options.limit, Some(6));

        let options =
            find_options_to_mongo(&FindOptions::default().sorted(Sort::ascending("price")));
        assert_eq!(options.sort, Some(doc! { "price": 1 }));
        assert_eq!(options.limit, None);
    }

    #[test]
    fn default_find_options_leave_driver_defaults() {
        let options = find_options_to_mongo(&FindOptions::default());
        assert_eq!(options.sort, None);
        assert_eq!(options.limit, None);
    }

    #[test]
    fn product_keys_become_object_ids() {
        let oid = ObjectId::new();
        let query = filter_to_bson(&Filter::Key(DocumentKey::ObjectId(oid))).unwrap();
        assert_eq!(query.get_object_id("_id").unwrap(), oid);
    }

    #[test]
    fn lenient_keys_match_either_form() {
        let oid = ObjectId::new();
        let query =
            filter_to_bson(&Filter::AnyKey(DocumentKey::lenient_candidates(&oid.to_hex()))).unwrap();
        let candidates = query.get_document("_id").unwrap().get_array("$in").unwrap();
        assert_eq!(candidates[0], Bson::ObjectId(oid));
        assert_eq!(candidates[1], Bson::String(oid.to_hex()));
    }

    #[test]
    fn eq_and_all_filters() {
        assert!(filter_to_bson(&Filter::All).unwrap().is_empty());
        let query = filter_to_bson(&Filter::eq("buyerEmail", "a@x.io")).unwrap();
        assert_eq!(query.get_str("buyerEmail").unwrap(), "a@x.io");
    }

    #[test]
    fn stored_documents_render_ids_and_dates_as_strings() {
        let oid = ObjectId::new();
        let stored = doc! {
            "_id": oid,
            "createdAt": bson::DateTime::from_millis(0),
            "price": 12.5,
            "qty": 3_i32,
            "tags": ["dog"],
        };
        let rendered = JsonValue::Object(document_to_json(stored));
        assert_eq!(
            rendered,
            json!({
                "_id": oid.to_hex(),
                "createdAt": "1970-01-01T00:00:00Z",
                "price": 12.5,
                "qty": 3,
                "tags": ["dog"],
            })
        );
    }

    #[test]
    fn json_bodies_convert_to_bson() {
        let body = json!({ "productName": "Leash", "price": 10, "meta": { "new": true } });
        let converted = json_to_document(body.as_object().unwrap()).unwrap();
        assert_eq!(converted.get_str("productName").unwrap(), "Leash");
        assert_eq!(converted.get_i64("price").unwrap(), 10);
        assert!(converted.get_document("meta").unwrap().get_bool("new").unwrap());
    }
}
