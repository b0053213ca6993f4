use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::claims::{CLOCK_SKEW_SECS, IdTokenClaims, validate_claims};
use crate::verifier::{TokenError, TokenVerifier};

/// Verifies HS256-signed tokens against a shared secret.
///
/// For development deployments and tests, where no external identity service
/// is available.
pub struct Hs256TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256TokenVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        validation.leeway = CLOCK_SKEW_SECS.unsigned_abs();

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }

    fn decode(&self, token: &str) -> Result<IdTokenClaims, TokenError> {
        Ok(decode::<IdTokenClaims>(token, &self.key, &self.validation)?.claims)
    }
}

#[async_trait]
impl TokenVerifier for Hs256TokenVerifier {
    async fn verify(&self, token: &str) -> Result<(), TokenError> {
        let claims = self.decode(token)?;
        validate_claims(&claims, Utc::now())
    }
}
