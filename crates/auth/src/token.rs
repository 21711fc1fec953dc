//! Bearer-token verification.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::claims::AuthClaims;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Verifies a raw bearer token into claims.
///
/// Trait object so the API middleware can take test doubles.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<AuthClaims, TokenError>;
}

/// HS256 (shared-secret) verifier.
pub struct Hs256TokenVerifier {
    decoding: DecodingKey,
    encoding: EncodingKey,
    validation: Validation,
}

impl Hs256TokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret),
            encoding: EncodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Mint a token for the given claims. Used by the dev identity provider
    /// and by tests; production deployments may verify tokens minted by an
    /// external issuer sharing the secret.
    pub fn mint(&self, claims: &AuthClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

impl TokenVerifier for Hs256TokenVerifier {
    fn verify(&self, token: &str) -> Result<AuthClaims, TokenError> {
        decode::<AuthClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn mint_then_verify_round_trips_claims() {
        let verifier = Hs256TokenVerifier::new(b"test-secret");
        let claims = AuthClaims::new("uid-1", Some("ana@x.com".into()), Duration::minutes(10));

        let token = verifier.mint(&claims).unwrap();
        let verified = verifier.verify(&token).unwrap();

        assert_eq!(verified.sub, "uid-1");
        assert_eq!(verified.email.as_deref(), Some("ana@x.com"));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issuer = Hs256TokenVerifier::new(b"secret-a");
        let verifier = Hs256TokenVerifier::new(b"secret-b");
        let claims = AuthClaims::new("uid-1", None, Duration::minutes(10));

        let token = issuer.mint(&claims).unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier = Hs256TokenVerifier::new(b"test-secret");
        let claims = AuthClaims::new("uid-1", None, Duration::minutes(-10));

        let token = verifier.mint(&claims).unwrap();
        assert_eq!(verifier.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn garbage_is_rejected() {
        let verifier = Hs256TokenVerifier::new(b"test-secret");
        assert!(matches!(
            verifier.verify("not.a.jwt"),
            Err(TokenError::Invalid(_))
        ));
    }
}
