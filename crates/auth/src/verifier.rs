use async_trait::async_trait;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token rejected: {0}")]
    Rejected(String),

    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("token has no subject")]
    MissingSubject,

    #[error("no signing key for kid {0:?}")]
    UnknownKey(Option<String>),

    #[error("failed to fetch signing keys: {0}")]
    KeyFetch(String),
}

impl From<JwtError> for TokenError {
    fn from(value: JwtError) -> Self {
        match value.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::ImmatureSignature => TokenError::NotYetValid,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                TokenError::Malformed(value.to_string())
            }
            _ => TokenError::Rejected(value.to_string()),
        }
    }
}

/// Identity collaborator: decides whether a bearer token is valid.
///
/// Verification is boolean. Implementations must not cache results.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<(), TokenError>;
}
