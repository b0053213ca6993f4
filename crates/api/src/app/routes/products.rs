use axum::{
    Json,
    extract::{Extension, Path, Query},
};
use tracing::debug;

use pawmart_core::{Collection, Document, ProductId, fields};
use pawmart_infra::{DeleteResult, Filter, FindOptions, InsertOneResult, Sort, UpdateResult};

use crate::app::dto::{EmailQuery, SearchQuery};
use crate::app::errors::ApiError;
use crate::state::StoreHandle;

/// Number of products shown on the home page.
pub const LATEST_PRODUCTS_LIMIT: u64 = 6;

pub async fn get_product(
    Extension(store): Extension<StoreHandle>,
    Path(id): Path<String>,
) -> Result<Json<Option<Document>>, ApiError> {
    let id: ProductId = id.parse()?;
    let found = store
        .find_one(Collection::Products, Filter::Key(id.into()))
        .await?;
    Ok(Json(found))
}

pub async fn all_products(
    Extension(store): Extension<StoreHandle>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let items = store
        .find(Collection::Products, Filter::All, FindOptions::default())
        .await?;
    Ok(Json(items))
}

pub async fn products_by_category(
    Extension(store): Extension<StoreHandle>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let items = store
        .find(
            Collection::Products,
            Filter::eq(fields::CATEGORY, category),
            FindOptions::default(),
        )
        .await?;
    Ok(Json(items))
}

/// Newest products first, by their `date` field.
pub async fn latest_products(
    Extension(store): Extension<StoreHandle>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let options = FindOptions::default()
        .sorted(Sort::descending(fields::DATE))
        .limit(LATEST_PRODUCTS_LIMIT);
    let items = store
        .find(Collection::Products, Filter::All, options)
        .await?;
    Ok(Json(items))
}

pub async fn create_product(
    Extension(store): Extension<StoreHandle>,
    Json(body): Json<Document>,
) -> Result<Json<InsertOneResult>, ApiError> {
    debug!(?body, "inserting product");
    let result = store.insert_one(Collection::Products, body).await?;
    Ok(Json(result))
}

pub async fn my_listing(
    Extension(store): Extension<StoreHandle>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let items = store
        .find(
            Collection::Products,
            Filter::eq(fields::BUYER_EMAIL, query.email),
            FindOptions::default(),
        )
        .await?;
    Ok(Json(items))
}

/// Replace the given fields of a product (`$set`); other fields are kept.
pub async fn update_product(
    Extension(store): Extension<StoreHandle>,
    Path(id): Path<String>,
    Json(body): Json<Document>,
) -> Result<Json<UpdateResult>, ApiError> {
    let id: ProductId = id.parse()?;
    let result = store
        .update_one(Collection::Products, Filter::Key(id.into()), body)
        .await?;
    Ok(Json(result))
}

pub async fn delete_product(
    Extension(store): Extension<StoreHandle>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    let id: ProductId = id.parse()?;
    let result = store
        .delete_one(Collection::Products, Filter::Key(id.into()))
        .await?;
    Ok(Json(result))
}

/// Case-insensitive substring match on the product name.
pub async fn search_products(
    Extension(store): Extension<StoreHandle>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let items = store
        .find(
            Collection::Products,
            Filter::contains_ignore_case(fields::PRODUCT_NAME, query.search),
            FindOptions::default(),
        )
        .await?;
    Ok(Json(items))
}
