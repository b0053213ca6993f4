//! HTTP API application wiring (Axum router + shared handles).
//!
//! - `routes/`: HTTP routes + handlers (one file per collection)
//! - `dto.rs`: query-string DTOs
//! - `errors.rs`: consistent error responses

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::AuthState;
use crate::state::AppState;

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(state: AppState) -> Router {
    let auth_state = AuthState {
        verifier: state.verifier,
    };

    Router::new()
        .route("/", get(routes::system::banner))
        .route("/health", get(routes::system::health))
        .merge(routes::router(auth_state))
        .layer(Extension(state.store))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
