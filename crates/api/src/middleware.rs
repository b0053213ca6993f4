use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::app::errors::ApiError;
use crate::state::VerifierHandle;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: VerifierHandle,
}

/// Access gate: forward the request only if its bearer token verifies.
///
/// Every rejection (missing header, malformed header, failed verification)
/// ends the request with 401 before the handler runs.
pub async fn require_bearer(
    State(state): State<AuthState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?.to_owned();

    if let Err(e) = state.verifier.verify(&token).await {
        warn!(error = %e, path = %req.uri().path(), "bearer token rejected");
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        debug!("request without authorization header");
        return Err(ApiError::Unauthorized);
    };

    let header = header.to_str().map_err(|_| ApiError::Unauthorized)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(ApiError::Unauthorized);
    }

    Ok(token)
}
