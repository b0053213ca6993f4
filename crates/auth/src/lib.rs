//! `pawmart-auth` — bearer token verification.
//!
//! This crate is decoupled from HTTP routing and storage: it answers one
//! question, "is this token valid?", behind the [`TokenVerifier`] trait.

pub mod claims;
pub mod firebase;
pub mod hs256;
pub mod verifier;

pub use claims::{IdTokenClaims, validate_claims};
pub use firebase::FirebaseTokenVerifier;
pub use hs256::Hs256TokenVerifier;
pub use verifier::{TokenError, TokenVerifier};
