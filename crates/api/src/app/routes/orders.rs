use axum::{
    Json,
    extract::{Extension, Path, Query},
};
use tracing::{debug, info};

use pawmart_core::{Collection, Document, DocumentKey, fields};
use pawmart_infra::{DeleteResult, Filter, FindOptions, InsertOneResult};

use crate::app::dto::EmailQuery;
use crate::app::errors::ApiError;
use crate::state::StoreHandle;

pub async fn create_order(
    Extension(store): Extension<StoreHandle>,
    Json(body): Json<Document>,
) -> Result<Json<InsertOneResult>, ApiError> {
    debug!(?body, "inserting order");
    let result = store.insert_one(Collection::Orders, body).await?;
    Ok(Json(result))
}

pub async fn my_orders(
    Extension(store): Extension<StoreHandle>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let items = store
        .find(
            Collection::Orders,
            Filter::eq(fields::BUYER_EMAIL, query.email),
            FindOptions::default(),
        )
        .await?;
    Ok(Json(items))
}

/// Delete an order by id.
///
/// Orders may carry generated ObjectIds or caller-assigned string ids, so the
/// path value is matched against both forms.
pub async fn delete_order(
    Extension(store): Extension<StoreHandle>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    info!(order_id = %id, "deleting order");
    let result = store
        .delete_one(Collection::Orders, Filter::AnyKey(DocumentKey::lenient_candidates(&id)))
        .await?;
    Ok(Json(result))
}
