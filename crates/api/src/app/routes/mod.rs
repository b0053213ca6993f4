use axum::{
    Router,
    routing::{delete, get},
};

use crate::middleware::{self, AuthState};

pub mod orders;
pub mod products;
pub mod system;

/// Router for the collection endpoints.
///
/// Only `GET /products/:id` passes through the access gate; the other methods
/// on that path are registered after the gate layer and stay open.
pub fn router(auth: AuthState) -> Router {
    let gate = axum::middleware::from_fn_with_state(auth, middleware::require_bearer);

    Router::new()
        .route("/allProducts", get(products::all_products))
        .route("/category/:category", get(products::products_by_category))
        .route(
            "/products",
            get(products::latest_products).post(products::create_product),
        )
        .route(
            "/products/:id",
            get(products::get_product)
                .route_layer(gate)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/my-listing", get(products::my_listing))
        .route("/search", get(products::search_products))
        .route(
            "/myOrders",
            get(orders::my_orders).post(orders::create_order),
        )
        .route("/myOrders/:id", delete(orders::delete_order))
}
