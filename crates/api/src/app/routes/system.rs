use axum::http::StatusCode;

pub async fn banner() -> &'static str {
    "PawMart Server Running..."
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}
