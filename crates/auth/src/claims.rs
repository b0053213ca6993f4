use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::TokenError;

/// Allowed clock difference between the token issuer and this process.
pub const CLOCK_SKEW_SECS: i64 = 60;

/// Claims carried by an identity token.
///
/// Only the registered claims needed to decide validity are modelled; anything
/// else in the payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Subject / user identifier.
    pub sub: String,

    /// Issued-at, seconds since the epoch.
    pub iat: i64,

    /// Expiration, seconds since the epoch.
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Deterministically validate token claims.
///
/// Note: this validates the *claims* only. Signature verification happens in
/// the verifier that decoded the token.
pub fn validate_claims(claims: &IdTokenClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.sub.trim().is_empty() {
        return Err(TokenError::MissingSubject);
    }
    if claims.exp <= claims.iat {
        return Err(TokenError::InvalidTimeWindow);
    }

    let now = now.timestamp();
    if now + CLOCK_SKEW_SECS < claims.iat {
        return Err(TokenError::NotYetValid);
    }
    if now >= claims.exp + CLOCK_SKEW_SECS {
        return Err(TokenError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(iat: DateTime<Utc>, exp: DateTime<Utc>) -> IdTokenClaims {
        IdTokenClaims {
            sub: "user-1".to_string(),
            iat: iat.timestamp(),
            exp: exp.timestamp(),
            aud: None,
            iss: None,
            email: Some("a@x.io".to_string()),
        }
    }

    #[test]
    fn current_claims_are_accepted() {
        let now = Utc::now();
        let c = claims(now - Duration::minutes(1), now + Duration::minutes(10));
        assert_eq!(validate_claims(&c, now), Ok(()));
    }

    #[test]
    fn expired_claims_are_rejected() {
        let now = Utc::now();
        let c = claims(now - Duration::hours(2), now - Duration::hours(1));
        assert_eq!(validate_claims(&c, now), Err(TokenError::Expired));
    }

    #[test]
    fn future_claims_are_rejected_beyond_skew() {
        let now = Utc::now();
        let c = claims(now + Duration::minutes(5), now + Duration::minutes(30));
        assert_eq!(validate_claims(&c, now), Err(TokenError::NotYetValid));

        let within_skew = claims(now + Duration::seconds(30), now + Duration::minutes(30));
        assert_eq!(validate_claims(&within_skew, now), Ok(()));
    }

    #[test]
    fn inverted_window_and_empty_subject_are_rejected() {
        let now = Utc::now();
        let inverted = claims(now, now - Duration::seconds(1));
        assert_eq!(validate_claims(&inverted, now), Err(TokenError::InvalidTimeWindow));

        let mut anonymous = claims(now, now + Duration::minutes(1));
        anonymous.sub = " ".to_string();
        assert_eq!(validate_claims(&anonymous, now), Err(TokenError::MissingSubject));
    }
}
