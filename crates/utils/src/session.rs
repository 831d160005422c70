//! Signing and verification of session tokens issued by the identity provider.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session token is invalid: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("session secret is empty")]
    EmptySecret,
}

/// HS256 codec for session claims. Claim types must carry an `exp` field.
#[derive(Clone)]
pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionCodec {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, SessionError> {
        if secret.is_empty() {
            return Err(SessionError::EmptySecret);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    /// Expiry timestamp (seconds since epoch) for a token issued now.
    pub fn expiry_from_now(&self) -> i64 {
        (Utc::now() + self.ttl).timestamp()
    }

    pub fn sign<C: Serialize>(&self, claims: &C) -> Result<String, SessionError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    pub fn verify<C: DeserializeOwned>(&self, token: &str) -> Result<C, SessionError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<C>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Claims {
        sub: String,
        exp: i64,
    }

    #[test]
    fn signed_claims_verify_with_same_secret() {
        let codec = SessionCodec::new("secret", Duration::hours(1)).unwrap();
        let claims = Claims {
            sub: "user".to_string(),
            exp: codec.expiry_from_now(),
        };
        let token = codec.sign(&claims).unwrap();
        let decoded: Claims = codec.verify(&token).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let a = SessionCodec::new("secret-a", Duration::hours(1)).unwrap();
        let b = SessionCodec::new("secret-b", Duration::hours(1)).unwrap();
        let token = a
            .sign(&Claims {
                sub: "user".to_string(),
                exp: a.expiry_from_now(),
            })
            .unwrap();
        assert!(b.verify::<Claims>(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = SessionCodec::new("secret", Duration::hours(1)).unwrap();
        let token = codec
            .sign(&Claims {
                sub: "user".to_string(),
                exp: (Utc::now() - Duration::hours(2)).timestamp(),
            })
            .unwrap();
        assert!(codec.verify::<Claims>(&token).is_err());
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
    }
}
