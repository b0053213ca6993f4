use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: String,
}
